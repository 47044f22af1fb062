//! Admin moderation: user status, identity verification, reports and the
//! audit trail.
//!
//! Each decision runs in one transaction together with its side effects, its
//! `admin_action` audit row and the admin's `reports_handled` counter.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveEnum, ConnectionTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use volunteer_common::{AppError, AppResult, IdGenerator};
use volunteer_db::{
    entities::{
        admin,
        admin_action::{self, AdminActionType},
        event::{self, EventStatus},
        event_registration::RegistrationStatus,
        organiser::{self, VerificationStatus},
        report::{self, ReportStatus, ResolutionAction, TargetKind},
        string_list,
        user::{self, UserRole, UserStatus},
        volunteer,
    },
    repositories::{
        AdminRepository, EventFilter, EventRepository, ModerationRepository,
        OrganiserRepository, RegistrationRepository, ReportFilter, UserFilter, UserRepository,
        VolunteerRepository,
    },
};

use super::account::Profile;
use crate::{Page, PageRequest};

const DEFAULT_REJECTION_REASON: &str = "Document rejected by administrator";

/// A moderated entity, resolved from its `target_type`/`target_id` pair.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "entity", rename_all = "snake_case")]
pub enum ModerationTarget {
    User(user::Model),
    Volunteer(volunteer::Model),
    Organiser(organiser::Model),
    Event(event::Model),
}

impl ModerationTarget {
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::User(_) => TargetKind::User,
            Self::Volunteer(_) => TargetKind::Volunteer,
            Self::Organiser(_) => TargetKind::Organiser,
            Self::Event(_) => TargetKind::Event,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(m) => &m.id,
            Self::Volunteer(m) => &m.id,
            Self::Organiser(m) => &m.id,
            Self::Event(m) => &m.id,
        }
    }
}

/// Looks up moderation targets, one repository per variant.
#[derive(Clone)]
pub struct TargetResolver {
    user_repo: UserRepository,
    volunteer_repo: VolunteerRepository,
    organiser_repo: OrganiserRepository,
    event_repo: EventRepository,
}

impl TargetResolver {
    #[must_use]
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self {
            user_repo: UserRepository::new(Arc::clone(db)),
            volunteer_repo: VolunteerRepository::new(Arc::clone(db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(db)),
            event_repo: EventRepository::new(Arc::clone(db)),
        }
    }

    /// Load a target, 404 when it does not exist.
    pub async fn load(&self, kind: TargetKind, id: &str) -> AppResult<ModerationTarget> {
        Ok(match kind {
            TargetKind::User => ModerationTarget::User(self.user_repo.get_by_id(id).await?),
            TargetKind::Volunteer => {
                ModerationTarget::Volunteer(self.volunteer_repo.get_by_id(id).await?)
            }
            TargetKind::Organiser => {
                ModerationTarget::Organiser(self.organiser_repo.get_by_id(id).await?)
            }
            TargetKind::Event => ModerationTarget::Event(self.event_repo.get_by_id(id).await?),
        })
    }

    /// The account a suspension or ban lands on. Events answer for their
    /// organiser.
    pub async fn account_of(&self, target: &ModerationTarget) -> AppResult<user::Model> {
        let user_id = match target {
            ModerationTarget::User(user) => return Ok(user.clone()),
            ModerationTarget::Volunteer(v) => v.user_id.clone(),
            ModerationTarget::Organiser(o) => o.user_id.clone(),
            ModerationTarget::Event(e) => {
                self.organiser_repo
                    .get_by_id(&e.organiser_id)
                    .await?
                    .user_id
            }
        };
        self.user_repo.get_by_id(&user_id).await
    }
}

// ========== Inputs ==========

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminEventQuery {
    pub status: Option<EventStatus>,
    pub organiser_id: Option<String>,
    pub cause: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetKind>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserStatusInput {
    pub status: UserStatus,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerificationDecision {
    pub verified: bool,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReportInput {
    pub status: ReportStatus,
    #[validate(length(max = 5000))]
    pub admin_notes: Option<String>,
    pub resolution_action: Option<ResolutionAction>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActionInput {
    pub action_type: AdminActionType,
    pub target_type: TargetKind,
    #[validate(length(min = 1))]
    pub target_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
    pub related_report_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventStatusInput {
    pub status: EventStatus,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrganiserVerificationInput {
    pub status: VerificationStatus,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

// ========== Outputs ==========

#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: user::Model,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Side effects of a suspension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub registrations_cancelled: u64,
    pub events_cancelled: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatusChange {
    pub user: user::Model,
    pub action: admin_action::Model,
    #[serde(flatten)]
    pub cascade: CascadeSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: report::Model,
    pub target: Option<ModerationTarget>,
    pub actions: Vec<admin_action::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminEventDetail {
    #[serde(flatten)]
    pub event: event::Model,
    pub organiser: organiser::Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseCount {
    pub cause: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub events: EventStats,
    pub registrations: RegistrationStats,
    pub reports: ReportStats,
    pub pending_verifications: u64,
    pub top_causes: Vec<CauseCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub volunteers: u64,
    pub organisers: u64,
    pub admins: u64,
    pub new_last_30_days: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub draft: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStats {
    pub total: u64,
    pub attended: u64,
    pub no_show: u64,
    pub cancelled: u64,
    /// `attended / total * 100`, two decimals
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStats {
    pub pending: u64,
    pub under_review: u64,
    pub resolved: u64,
    pub dismissed: u64,
}

/// Audit row to append.
struct AuditEntry<'a> {
    action_type: AdminActionType,
    target_type: TargetKind,
    target_id: &'a str,
    reason: String,
    related_report_id: Option<&'a str>,
}

/// Percentage of attended registrations, rounded to two decimals.
#[must_use]
pub fn attendance_rate(attended: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = attended as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// The `n` most frequent causes across events. Ties break alphabetically.
#[must_use]
pub fn top_causes(cause_lists: &[serde_json::Value], n: usize) -> Vec<CauseCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for list in cause_lists {
        for cause in string_list(list) {
            *counts.entry(cause).or_default() += 1;
        }
    }

    let mut ranked: Vec<CauseCount> = counts
        .into_iter()
        .map(|(cause, count)| CauseCount { cause, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cause.cmp(&b.cause)));
    ranked.truncate(n);
    ranked
}

const fn resolution_to_action(action: ResolutionAction) -> Option<AdminActionType> {
    match action {
        ResolutionAction::None => None,
        ResolutionAction::Warning => Some(AdminActionType::Warning),
        ResolutionAction::Suspension => Some(AdminActionType::Suspension),
        ResolutionAction::Ban => Some(AdminActionType::Ban),
        ResolutionAction::EventRemoved => Some(AdminActionType::EventRemoved),
    }
}

const fn action_to_resolution(action: AdminActionType) -> ResolutionAction {
    match action {
        AdminActionType::Warning => ResolutionAction::Warning,
        AdminActionType::Suspension => ResolutionAction::Suspension,
        AdminActionType::Ban => ResolutionAction::Ban,
        AdminActionType::EventRemoved => ResolutionAction::EventRemoved,
        _ => ResolutionAction::None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Admin moderation service.
#[derive(Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
    admin_repo: AdminRepository,
    user_repo: UserRepository,
    volunteer_repo: VolunteerRepository,
    organiser_repo: OrganiserRepository,
    event_repo: EventRepository,
    registration_repo: RegistrationRepository,
    moderation_repo: ModerationRepository,
    targets: TargetResolver,
    id_gen: IdGenerator,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            admin_repo: AdminRepository::new(Arc::clone(&db)),
            user_repo: UserRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            event_repo: EventRepository::new(Arc::clone(&db)),
            registration_repo: RegistrationRepository::new(Arc::clone(&db)),
            moderation_repo: ModerationRepository::new(Arc::clone(&db)),
            targets: TargetResolver::new(&db),
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// The caller's admin profile, or 403.
    pub async fn resolve_admin(&self, user: &user::Model) -> AppResult<admin::Model> {
        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        self.admin_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Admin access required".to_string()))
    }

    async fn audit_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        admin: &admin::Model,
        entry: AuditEntry<'_>,
    ) -> AppResult<admin_action::Model> {
        let model = admin_action::ActiveModel {
            id: Set(self.id_gen.generate()),
            admin_id: Set(admin.id.clone()),
            action_type: Set(entry.action_type),
            target_type: Set(entry.target_type),
            target_id: Set(entry.target_id.to_string()),
            reason: Set(entry.reason),
            related_report_id: Set(entry.related_report_id.map(str::to_string)),
            created_at: Set(Utc::now().into()),
        };
        let action = ModerationRepository::create_action_in(conn, model).await?;

        info!(
            admin_id = %admin.id,
            action = %action.action_type.to_value(),
            target_type = %action.target_type.to_value(),
            target_id = %action.target_id,
            "Admin action recorded"
        );
        Ok(action)
    }

    /// Cancel what a suspended account leaves behind.
    async fn cascade_suspension_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: &user::Model,
    ) -> AppResult<CascadeSummary> {
        let mut summary = CascadeSummary::default();
        match user.role {
            UserRole::Volunteer => {
                let registrations = RegistrationRepository::find_by_volunteer_and_status_in(
                    conn,
                    &user.id,
                    RegistrationStatus::Registered,
                )
                .await?;

                let mut seats: BTreeMap<String, u64> = BTreeMap::new();
                for registration in &registrations {
                    *seats.entry(registration.event_id.clone()).or_default() += 1;
                }
                let ids: Vec<String> = registrations.into_iter().map(|r| r.id).collect();

                summary.registrations_cancelled =
                    RegistrationRepository::cancel_many_in(conn, &ids).await?;
                for (event_id, count) in seats {
                    EventRepository::release_seats_in(conn, &event_id, count).await?;
                }
            }
            UserRole::Organiser => {
                if let Some(organiser) = self.organiser_repo.find_by_user_id(&user.id).await? {
                    summary.events_cancelled =
                        EventRepository::cancel_active_by_organiser_in(conn, &organiser.id)
                            .await?;
                }
            }
            UserRole::Admin => {}
        }
        Ok(summary)
    }

    /// Apply a moderation action to its target.
    async fn execute_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        action: AdminActionType,
        target: &ModerationTarget,
    ) -> AppResult<CascadeSummary> {
        let status = match action {
            AdminActionType::Warning => return Ok(CascadeSummary::default()),
            AdminActionType::EventRemoved => {
                let ModerationTarget::Event(event) = target else {
                    return Err(AppError::BadRequest(
                        "event_removed only applies to events".to_string(),
                    ));
                };
                EventRepository::set_status_in(conn, &event.id, EventStatus::Cancelled).await?;
                return Ok(CascadeSummary::default());
            }
            AdminActionType::Suspension => UserStatus::Suspended,
            AdminActionType::Ban => UserStatus::Inactive,
            AdminActionType::Reactivation => UserStatus::Active,
            other => {
                return Err(AppError::BadRequest(format!(
                    "{} cannot be applied as a direct action",
                    other.to_value()
                )));
            }
        };

        let account = self.targets.account_of(target).await?;
        if account.role == UserRole::Admin {
            return Err(AppError::Forbidden(
                "Administrator accounts cannot be moderated".to_string(),
            ));
        }

        let user = UserRepository::set_status_in(conn, &account.id, status).await?;
        if status == UserStatus::Suspended {
            self.cascade_suspension_in(conn, &user).await
        } else {
            Ok(CascadeSummary::default())
        }
    }

    // ========== Dashboard ==========

    /// Platform-wide counters.
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let volunteers = self.user_repo.count_by_role(UserRole::Volunteer).await?;
        let organisers = self.user_repo.count_by_role(UserRole::Organiser).await?;
        let admins = self.user_repo.count_by_role(UserRole::Admin).await?;
        let new_last_30_days = self
            .user_repo
            .count_created_since(Utc::now() - Duration::days(30))
            .await?;

        let active = self.event_repo.count_by_status(EventStatus::Active).await?;
        let completed = self.event_repo.count_by_status(EventStatus::Completed).await?;
        let cancelled = self.event_repo.count_by_status(EventStatus::Cancelled).await?;
        let draft = self.event_repo.count_by_status(EventStatus::Draft).await?;

        let total_registrations = self.registration_repo.count_all().await?;
        let attended = self
            .registration_repo
            .count_by_status(RegistrationStatus::Attended)
            .await?;
        let no_show = self
            .registration_repo
            .count_by_status(RegistrationStatus::NoShow)
            .await?;
        let cancelled_registrations = self
            .registration_repo
            .count_by_status(RegistrationStatus::Cancelled)
            .await?;

        let mut report_counts = [0u64; 4];
        for (slot, status) in report_counts.iter_mut().zip([
            ReportStatus::Pending,
            ReportStatus::UnderReview,
            ReportStatus::Resolved,
            ReportStatus::Dismissed,
        ]) {
            *slot = self
                .moderation_repo
                .count_reports(&ReportFilter {
                    status: Some(status),
                    target_type: None,
                })
                .await?;
        }

        let pending_verifications = self.volunteer_repo.count_pending_verifications().await?;
        let causes = self.event_repo.all_causes().await?;

        Ok(DashboardStats {
            users: UserStats {
                total: volunteers + organisers + admins,
                volunteers,
                organisers,
                admins,
                new_last_30_days,
            },
            events: EventStats {
                total: active + completed + cancelled + draft,
                active,
                completed,
                cancelled,
                draft,
            },
            registrations: RegistrationStats {
                total: total_registrations,
                attended,
                no_show,
                cancelled: cancelled_registrations,
                attendance_rate: attendance_rate(attended, total_registrations),
            },
            reports: ReportStats {
                pending: report_counts[0],
                under_review: report_counts[1],
                resolved: report_counts[2],
                dismissed: report_counts[3],
            },
            pending_verifications,
            top_causes: top_causes(&causes, 5),
        })
    }

    // ========== Users ==========

    /// Users with their profiles. Profiles are fetched per role in one
    /// batch each.
    pub async fn list_users(
        &self,
        query: UserQuery,
        page: PageRequest,
    ) -> AppResult<Page<UserWithProfile>> {
        let filter = UserFilter {
            role: query.role,
            status: query.status,
            search: query.search,
        };
        let users = self
            .user_repo
            .list(&filter, page.limit(), page.offset())
            .await?;
        let total = self.user_repo.count(&filter).await?;

        let ids_for = |role: UserRole| -> Vec<String> {
            users
                .iter()
                .filter(|u| u.role == role)
                .map(|u| u.id.clone())
                .collect()
        };

        let mut profiles: HashMap<String, Profile> = HashMap::new();
        for v in self
            .volunteer_repo
            .find_by_user_ids(&ids_for(UserRole::Volunteer))
            .await?
        {
            profiles.insert(v.user_id.clone(), Profile::Volunteer(v));
        }
        for o in self
            .organiser_repo
            .find_by_user_ids(&ids_for(UserRole::Organiser))
            .await?
        {
            profiles.insert(o.user_id.clone(), Profile::Organiser(o));
        }
        for a in self
            .admin_repo
            .find_by_user_ids(&ids_for(UserRole::Admin))
            .await?
        {
            profiles.insert(a.user_id.clone(), Profile::Admin(a));
        }

        let items = users
            .into_iter()
            .map(|user| UserWithProfile {
                profile: profiles.remove(&user.id).unwrap_or(Profile::Missing),
                user,
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// One user with profile.
    pub async fn get_user(&self, id: &str) -> AppResult<UserWithProfile> {
        let user = self.user_repo.get_by_id(id).await?;
        let profile = match user.role {
            UserRole::Volunteer => self
                .volunteer_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Volunteer),
            UserRole::Organiser => self
                .organiser_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Organiser),
            UserRole::Admin => self
                .admin_repo
                .find_by_user_id(&user.id)
                .await?
                .map(Profile::Admin),
        };
        Ok(UserWithProfile {
            user,
            profile: profile.unwrap_or(Profile::Missing),
        })
    }

    /// Activate, deactivate or suspend an account.
    ///
    /// Suspending a volunteer cancels their `registered` registrations;
    /// suspending an organiser cancels their active events.
    pub async fn update_user_status(
        &self,
        admin: &admin::Model,
        user_id: &str,
        input: UpdateUserStatusInput,
    ) -> AppResult<UserStatusChange> {
        input.validate()?;

        if admin.user_id == user_id {
            return Err(AppError::BadRequest(
                "You cannot change your own status".to_string(),
            ));
        }
        let target = self.user_repo.get_by_id(user_id).await?;
        if target.role == UserRole::Admin {
            return Err(AppError::Forbidden(
                "Administrator accounts cannot be moderated".to_string(),
            ));
        }

        let action_type = match input.status {
            UserStatus::Active => AdminActionType::Reactivation,
            UserStatus::Inactive => AdminActionType::Ban,
            UserStatus::Suspended => AdminActionType::Suspension,
        };
        let reason = non_empty(input.reason).unwrap_or_else(|| {
            format!("Status changed to {} by administrator", input.status.to_value())
        });

        let txn = volunteer_db::begin(&self.db).await?;

        let user = UserRepository::set_status_in(&txn, user_id, input.status).await?;
        let cascade = if input.status == UserStatus::Suspended {
            self.cascade_suspension_in(&txn, &user).await?
        } else {
            CascadeSummary::default()
        };
        let action = self
            .audit_in(
                &txn,
                admin,
                AuditEntry {
                    action_type,
                    target_type: TargetKind::User,
                    target_id: user_id,
                    reason,
                    related_report_id: None,
                },
            )
            .await?;
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;

        volunteer_db::commit(txn).await?;

        info!(
            user_id = %user.id,
            status = %user.status.to_value(),
            registrations_cancelled = cascade.registrations_cancelled,
            events_cancelled = cascade.events_cancelled,
            "User status updated"
        );
        Ok(UserStatusChange {
            user,
            action,
            cascade,
        })
    }

    // ========== Verifications ==========

    /// Volunteers awaiting NRIC review, latest upload first.
    pub async fn pending_verifications(
        &self,
        page: PageRequest,
    ) -> AppResult<Page<volunteer::Model>> {
        let items = self
            .volunteer_repo
            .find_pending_verifications(page.limit(), page.offset())
            .await?;
        let total = self.volunteer_repo.count_pending_verifications().await?;
        Ok(Page::new(items, total, page))
    }

    /// Approve or reject a volunteer's NRIC.
    ///
    /// Rejection always leaves a reason and asks for a re-upload; approval
    /// clears both.
    pub async fn update_verification_status(
        &self,
        admin: &admin::Model,
        volunteer_id: &str,
        input: VerificationDecision,
    ) -> AppResult<volunteer::Model> {
        input.validate()?;

        let volunteer = self.volunteer_repo.get_by_id(volunteer_id).await?;
        if volunteer.nric_image.is_none() {
            return Err(AppError::BadRequest(
                "Volunteer has not uploaded an NRIC image".to_string(),
            ));
        }

        let (action_type, reason) = if input.verified {
            (
                AdminActionType::VerificationApproved,
                "NRIC verified".to_string(),
            )
        } else {
            (
                AdminActionType::VerificationRejected,
                non_empty(input.reason).unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
            )
        };

        let mut model: volunteer::ActiveModel = volunteer.into();
        model.nric_verified = Set(input.verified);
        model.nric_requires_reupload = Set(!input.verified);
        model.nric_rejection_reason = Set((!input.verified).then(|| reason.clone()));
        model.updated_at = Set(Some(Utc::now().into()));

        let txn = volunteer_db::begin(&self.db).await?;
        let updated = VolunteerRepository::update_in(&txn, model).await?;
        self.audit_in(
            &txn,
            admin,
            AuditEntry {
                action_type,
                target_type: TargetKind::Volunteer,
                target_id: volunteer_id,
                reason,
                related_report_id: None,
            },
        )
        .await?;
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;
        volunteer_db::commit(txn).await?;

        Ok(updated)
    }

    // ========== Reports ==========

    pub async fn list_reports(
        &self,
        query: ReportQuery,
        page: PageRequest,
    ) -> AppResult<Page<report::Model>> {
        let filter = ReportFilter {
            status: query.status,
            target_type: query.target_type,
        };
        let items = self
            .moderation_repo
            .list_reports(&filter, page.limit(), page.offset())
            .await?;
        let total = self.moderation_repo.count_reports(&filter).await?;
        Ok(Page::new(items, total, page))
    }

    /// A report with its target and the actions taken on it.
    ///
    /// The target is `None` when it has been deleted since.
    pub async fn get_report(&self, id: &str) -> AppResult<ReportDetail> {
        let report = self.moderation_repo.get_report(id).await?;
        let target = match self.targets.load(report.target_type, &report.target_id).await {
            Ok(target) => Some(target),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let actions = self.moderation_repo.find_actions_for_report(id).await?;
        Ok(ReportDetail {
            report,
            target,
            actions,
        })
    }

    /// Move a report along `pending -> under_review -> resolved | dismissed`.
    ///
    /// Resolving with an action executes it against the target and records a
    /// linked audit row.
    pub async fn update_report_status(
        &self,
        admin: &admin::Model,
        id: &str,
        input: UpdateReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;
        let report = self.moderation_repo.get_report(id).await?;

        if !report.status.can_transition_to(input.status) {
            return Err(AppError::BadRequest(format!(
                "Cannot change report status from {} to {}",
                report.status.to_value(),
                input.status.to_value()
            )));
        }

        let resolution = input.resolution_action.unwrap_or_default();
        let action = resolution_to_action(resolution);
        if action.is_some() && input.status != ReportStatus::Resolved {
            return Err(AppError::BadRequest(
                "A resolution action requires status resolved".to_string(),
            ));
        }
        let target = match action {
            Some(_) => Some(self.targets.load(report.target_type, &report.target_id).await?),
            None => None,
        };

        let notes = non_empty(input.admin_notes);
        let reason = notes
            .clone()
            .unwrap_or_else(|| format!("Report {}", input.status.to_value()));
        let report_id = report.id.clone();
        let target_type = report.target_type;
        let target_id = report.target_id.clone();
        let now = Utc::now();

        let mut model: report::ActiveModel = report.into();
        model.status = Set(input.status);
        if notes.is_some() {
            model.admin_notes = Set(notes);
        }
        if input.status.is_closed() {
            model.resolution_action = Set(Some(resolution));
            model.resolved_by = Set(Some(admin.id.clone()));
            model.resolution_date = Set(Some(now.into()));
        }
        model.updated_at = Set(Some(now.into()));

        let txn = volunteer_db::begin(&self.db).await?;

        if let (Some(action_type), Some(target)) = (action, &target) {
            self.execute_in(&txn, action_type, target).await?;
            self.audit_in(
                &txn,
                admin,
                AuditEntry {
                    action_type,
                    target_type,
                    target_id: &target_id,
                    reason,
                    related_report_id: Some(&report_id),
                },
            )
            .await?;
        } else if input.status == ReportStatus::Dismissed {
            self.audit_in(
                &txn,
                admin,
                AuditEntry {
                    action_type: AdminActionType::ReportDismissed,
                    target_type,
                    target_id: &target_id,
                    reason,
                    related_report_id: Some(&report_id),
                },
            )
            .await?;
        }

        let updated = ModerationRepository::update_report_in(&txn, model).await?;
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;

        volunteer_db::commit(txn).await?;

        info!(
            report_id = %updated.id,
            status = %updated.status.to_value(),
            resolution = %resolution.to_value(),
            "Report updated"
        );
        Ok(updated)
    }

    // ========== Actions ==========

    /// Take a direct action, optionally resolving the report behind it.
    pub async fn create_action(
        &self,
        admin: &admin::Model,
        input: CreateActionInput,
    ) -> AppResult<admin_action::Model> {
        input.validate()?;
        let target = self.targets.load(input.target_type, &input.target_id).await?;

        let txn = volunteer_db::begin(&self.db).await?;

        let report = match input.related_report_id.as_deref() {
            Some(report_id) => {
                let report = ModerationRepository::find_report_in(&txn, report_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
                if report.status.is_closed() {
                    return Err(AppError::BadRequest(
                        "Report is already closed".to_string(),
                    ));
                }
                if report.target_type != target.kind() || report.target_id != target.id() {
                    return Err(AppError::BadRequest(
                        "Report does not concern this target".to_string(),
                    ));
                }
                Some(report)
            }
            None => None,
        };

        self.execute_in(&txn, input.action_type, &target).await?;
        let action = self
            .audit_in(
                &txn,
                admin,
                AuditEntry {
                    action_type: input.action_type,
                    target_type: target.kind(),
                    target_id: target.id(),
                    reason: input.reason.trim().to_string(),
                    related_report_id: input.related_report_id.as_deref(),
                },
            )
            .await?;

        if let Some(report) = report {
            let now = Utc::now();
            let mut model: report::ActiveModel = report.into();
            model.status = Set(ReportStatus::Resolved);
            model.resolution_action = Set(Some(action_to_resolution(input.action_type)));
            model.resolved_by = Set(Some(admin.id.clone()));
            model.resolution_date = Set(Some(now.into()));
            model.updated_at = Set(Some(now.into()));
            ModerationRepository::update_report_in(&txn, model).await?;
        }
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;

        volunteer_db::commit(txn).await?;
        Ok(action)
    }

    /// Audit trail, newest first.
    pub async fn list_actions(
        &self,
        target_type: Option<TargetKind>,
        page: PageRequest,
    ) -> AppResult<Page<admin_action::Model>> {
        let items = self
            .moderation_repo
            .list_actions(target_type, page.limit(), page.offset())
            .await?;
        let total = self.moderation_repo.count_actions(target_type).await?;
        Ok(Page::new(items, total, page))
    }

    // ========== Events and organisers ==========

    /// Events in any status.
    pub async fn list_events(
        &self,
        query: AdminEventQuery,
        page: PageRequest,
    ) -> AppResult<Page<event::Model>> {
        let filter = EventFilter {
            status: query.status,
            organiser_id: query.organiser_id,
            cause: query.cause,
            search: query.search,
        };
        let items = self
            .event_repo
            .list(&filter, page.limit(), page.offset())
            .await?;
        let total = self.event_repo.count(&filter).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get_event(&self, id: &str) -> AppResult<AdminEventDetail> {
        let event = self.event_repo.get_by_id(id).await?;
        let organiser = self.organiser_repo.get_by_id(&event.organiser_id).await?;
        Ok(AdminEventDetail { event, organiser })
    }

    /// Set an event's status and record it.
    pub async fn update_event_status(
        &self,
        admin: &admin::Model,
        id: &str,
        input: UpdateEventStatusInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        let event = self.event_repo.get_by_id(id).await?;

        let reason = non_empty(input.reason).unwrap_or_else(|| {
            format!(
                "Event status changed from {} to {}",
                event.status.to_value(),
                input.status.to_value()
            )
        });

        let mut model: event::ActiveModel = event.into();
        model.status = Set(input.status);
        model.updated_at = Set(Some(Utc::now().into()));

        let txn = volunteer_db::begin(&self.db).await?;
        let updated = EventRepository::update_in(&txn, model).await?;
        self.audit_in(
            &txn,
            admin,
            AuditEntry {
                action_type: AdminActionType::EventStatusChange,
                target_type: TargetKind::Event,
                target_id: id,
                reason,
                related_report_id: None,
            },
        )
        .await?;
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;
        volunteer_db::commit(txn).await?;

        Ok(updated)
    }

    /// Verify or reject an organiser's registration document.
    pub async fn update_organiser_verification(
        &self,
        admin: &admin::Model,
        organiser_id: &str,
        input: OrganiserVerificationInput,
    ) -> AppResult<organiser::Model> {
        input.validate()?;

        let (action_type, reason) = match input.status {
            VerificationStatus::Verified => (
                AdminActionType::OrganiserVerified,
                non_empty(input.reason).unwrap_or_else(|| "Organiser verified".to_string()),
            ),
            VerificationStatus::Rejected => (
                AdminActionType::OrganiserRejected,
                non_empty(input.reason).unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
            ),
            VerificationStatus::Pending => {
                return Err(AppError::BadRequest(
                    "Verification status must be verified or rejected".to_string(),
                ));
            }
        };
        let verified = input.status == VerificationStatus::Verified;

        let organiser = self.organiser_repo.get_by_id(organiser_id).await?;
        let mut model: organiser::ActiveModel = organiser.into();
        model.verification_status = Set(input.status);
        model.certification_verified = Set(verified);
        model.verification_rejection_reason = Set((!verified).then(|| reason.clone()));
        model.updated_at = Set(Some(Utc::now().into()));

        let txn = volunteer_db::begin(&self.db).await?;
        let updated = OrganiserRepository::update_in(&txn, model).await?;
        self.audit_in(
            &txn,
            admin,
            AuditEntry {
                action_type,
                target_type: TargetKind::Organiser,
                target_id: organiser_id,
                reason,
                related_report_id: None,
            },
        )
        .await?;
        AdminRepository::increment_reports_handled_in(&txn, &admin.id).await?;
        volunteer_db::commit(txn).await?;

        Ok(updated)
    }
}
