//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod certificate;
pub mod certificate_pdf;
pub mod event;
pub mod jobs;
pub mod moderation;
pub mod registration;
pub mod report;
pub mod review;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{
    AccountService, AccountView, AuthSession, Claims, FileUpload, LoginInput, Profile,
    SignupInput, SignupRole, TokenIssuer, UpdateProfileInput, ensure_active,
};
pub use certificate::{CertificateFile, CertificateService, CertificateVerification};
pub use event::{
    CreateEventInput, EventDetail, EventQuery, EventService, EventVolunteer, ScheduleInput,
    UpdateEventInput,
};
pub use jobs::{EventSweeper, SweepReport, spawn_scheduler};
pub use moderation::{
    AdminEventDetail, AdminEventQuery, AdminService, CascadeSummary, CauseCount,
    CreateActionInput, DashboardStats, ModerationTarget, OrganiserVerificationInput,
    ReportDetail, ReportQuery, TargetResolver, UpdateEventStatusInput, UpdateReportInput,
    UpdateUserStatusInput, UserQuery, UserStatusChange, UserWithProfile, VerificationDecision,
};
pub use registration::{
    FeedbackInput, RegistrationDetail, RegistrationService, RegistrationWithEvent,
    UpdateRegistrationInput,
};
pub use report::{CreateReportInput, ReportService};
pub use review::{CreateReviewInput, ReviewService, ReviewSummary};
