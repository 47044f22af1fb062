//! Repositories.
//!
//! Each repository owns an `Arc<DatabaseConnection>`. Methods suffixed `_in`
//! take an explicit connection so services can run them inside a transaction.

pub mod admin;
pub mod certificate;
pub mod event;
pub mod moderation;
pub mod organiser;
pub mod registration;
pub mod review;
pub mod user;
pub mod volunteer;

pub use admin::AdminRepository;
pub use certificate::CertificateRepository;
pub use event::{EventFilter, EventRepository};
pub use moderation::{ModerationRepository, ReportFilter};
pub use organiser::OrganiserRepository;
pub use registration::RegistrationRepository;
pub use review::ReviewRepository;
pub use user::{UserFilter, UserRepository};
pub use volunteer::VolunteerRepository;

use volunteer_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert failure, turning unique violations into `Conflict`.
pub(crate) fn insert_error(err: DbErr, conflict_message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict_message.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}
