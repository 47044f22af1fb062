//! Registration service.
//!
//! Owns the lifecycle of a volunteer's place at an event. Every write that
//! touches `event.registered_count` runs in one transaction with the
//! registration change.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveEnum, DatabaseConnection, Set};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use validator::Validate;
use volunteer_common::{AppError, AppResult, IdGenerator};
use volunteer_db::{
    entities::{
        event,
        event_registration::{self, AttendanceStatus, RegistrationStatus},
        user::{self, UserRole},
    },
    repositories::{EventRepository, OrganiserRepository, RegistrationRepository, VolunteerRepository},
};

/// Partial update of a registration.
///
/// For the timestamps, an omitted field is left alone while an explicit
/// `null` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRegistrationInput {
    #[serde(default, deserialize_with = "double_option")]
    pub check_in_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub check_out_time: Option<Option<DateTime<Utc>>>,
    pub status: Option<RegistrationStatus>,
    pub attendance_status: Option<AttendanceStatus>,
}

/// Feedback left by a volunteer or an organiser.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Registration with its event and organiser name.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: event_registration::Model,
    pub event: event::Model,
    pub organisation_name: String,
}

/// Registration with its event, for the volunteer's own listing.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: event_registration::Model,
    pub event: Option<event::Model>,
}

/// Deserialize a field where `null` and absent mean different things.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Registration service for business logic.
#[derive(Clone)]
pub struct RegistrationService {
    db: Arc<DatabaseConnection>,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    volunteer_repo: VolunteerRepository,
    organiser_repo: OrganiserRepository,
    id_gen: IdGenerator,
}

impl RegistrationService {
    /// Create a new registration service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            registration_repo: RegistrationRepository::new(Arc::clone(&db)),
            event_repo: EventRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register the caller for an event.
    ///
    /// A registration cancelled by a moderation cascade is reactivated; one
    /// removed by the organiser blocks the volunteer from this event.
    pub async fn create(
        &self,
        user: &user::Model,
        event_id: &str,
    ) -> AppResult<event_registration::Model> {
        if user.role != UserRole::Volunteer {
            return Err(AppError::Forbidden(
                "Only volunteers can register for events".to_string(),
            ));
        }
        if self.volunteer_repo.find_by_user_id(&user.id).await?.is_none() {
            return Err(AppError::Forbidden("Volunteer profile not found".to_string()));
        }

        let event = self.event_repo.get_by_id(event_id).await?;
        if event.status != event::EventStatus::Active {
            return Err(AppError::BadRequest(
                "Event is not open for registration".to_string(),
            ));
        }

        let existing = self.registration_repo.find_by_pair(&user.id, event_id).await?;
        match existing.as_ref().map(|r| r.status) {
            Some(RegistrationStatus::RemovedByOrganizer) => {
                return Err(AppError::Forbidden(
                    "You were removed from this event and cannot register again".to_string(),
                ));
            }
            Some(RegistrationStatus::Cancelled) | None => {}
            Some(_) => {
                return Err(AppError::Conflict(
                    "Already registered for this event".to_string(),
                ));
            }
        }
        if !event.has_capacity() {
            return Err(AppError::BadRequest("Event is full".to_string()));
        }

        let now = Utc::now();
        let txn = volunteer_db::begin(&self.db).await?;

        if !EventRepository::try_take_seat_in(&txn, event_id).await? {
            return Err(AppError::BadRequest("Event is full".to_string()));
        }

        let registration = if let Some(previous) = existing {
            let mut model: event_registration::ActiveModel = previous.into();
            model.status = Set(RegistrationStatus::Registered);
            model.attendance_status = Set(AttendanceStatus::Pending);
            model.signup_date = Set(now.into());
            model.check_in_time = Set(None);
            model.check_out_time = Set(None);
            model.removal_reason = Set(None);
            model.updated_at = Set(Some(now.into()));
            RegistrationRepository::update_in(&txn, model).await?
        } else {
            let model = event_registration::ActiveModel {
                id: Set(self.id_gen.generate()),
                volunteer_id: Set(user.id.clone()),
                event_id: Set(event_id.to_string()),
                status: Set(RegistrationStatus::Registered),
                attendance_status: Set(AttendanceStatus::Pending),
                signup_date: Set(now.into()),
                check_in_time: Set(None),
                check_out_time: Set(None),
                removal_reason: Set(None),
                volunteer_feedback_comment: Set(None),
                volunteer_feedback_rating: Set(None),
                volunteer_feedback_at: Set(None),
                organiser_feedback_comment: Set(None),
                organiser_feedback_rating: Set(None),
                organiser_feedback_at: Set(None),
                updated_at: Set(None),
            };
            RegistrationRepository::create_in(&txn, model).await?
        };

        volunteer_db::commit(txn).await?;

        info!(
            registration_id = %registration.id,
            event_id = %event_id,
            volunteer_id = %user.id,
            "Volunteer registered for event"
        );
        Ok(registration)
    }

    /// A registration with its event, for the volunteer, the owning
    /// organiser or an admin.
    pub async fn get(&self, user: &user::Model, id: &str) -> AppResult<RegistrationDetail> {
        let registration = self.registration_repo.get_by_id(id).await?;
        let event = self.event_repo.get_by_id(&registration.event_id).await?;
        let organiser = self.organiser_repo.get_by_id(&event.organiser_id).await?;

        let allowed = user.role == UserRole::Admin
            || user.id == registration.volunteer_id
            || user.id == organiser.user_id;
        if !allowed {
            return Err(AppError::Forbidden(
                "Not authorized to view this registration".to_string(),
            ));
        }

        Ok(RegistrationDetail {
            registration,
            event,
            organisation_name: organiser.organisation_name,
        })
    }

    /// The caller's registrations, newest first.
    pub async fn list_mine(&self, user: &user::Model) -> AppResult<Vec<RegistrationWithEvent>> {
        let registrations = self.registration_repo.find_by_volunteer(&user.id).await?;
        let event_ids: Vec<String> = registrations.iter().map(|r| r.event_id.clone()).collect();

        let events: HashMap<String, event::Model> = self
            .event_repo
            .find_by_ids(&event_ids)
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        Ok(registrations
            .into_iter()
            .map(|registration| RegistrationWithEvent {
                event: events.get(&registration.event_id).cloned(),
                registration,
            })
            .collect())
    }

    /// Load a registration the caller manages as the event's organiser.
    async fn managed(
        &self,
        user: &user::Model,
        id: &str,
        admin_allowed: bool,
    ) -> AppResult<event_registration::Model> {
        let registration = self.registration_repo.get_by_id(id).await?;
        self.ensure_manages(user, &registration, admin_allowed).await?;
        Ok(registration)
    }

    async fn ensure_manages(
        &self,
        user: &user::Model,
        registration: &event_registration::Model,
        admin_allowed: bool,
    ) -> AppResult<()> {
        if admin_allowed && user.role == UserRole::Admin {
            return Ok(());
        }

        let forbidden = || {
            AppError::Forbidden("Only the event organiser can manage this registration".to_string())
        };
        if user.role != UserRole::Organiser {
            return Err(forbidden());
        }
        let organiser = self
            .organiser_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(forbidden)?;
        let event = self.event_repo.get_by_id(&registration.event_id).await?;
        if event.organiser_id != organiser.id {
            return Err(forbidden());
        }
        Ok(())
    }

    /// Partial update by the owning organiser or an admin.
    pub async fn update(
        &self,
        user: &user::Model,
        id: &str,
        input: UpdateRegistrationInput,
    ) -> AppResult<event_registration::Model> {
        let registration = self.managed(user, id, true).await?;
        let previous = registration.status;

        if let Some(next) = input.status {
            if !previous.can_transition_to(next) {
                return Err(AppError::BadRequest(format!(
                    "Cannot change registration status from {} to {}",
                    previous.to_value(),
                    next.to_value()
                )));
            }
        }

        let check_in = input.check_in_time.unwrap_or(registration.check_in_time.map(Into::into));
        let check_out = input
            .check_out_time
            .unwrap_or(registration.check_out_time.map(Into::into));
        match (check_in, check_out) {
            (None, Some(_)) => {
                return Err(AppError::BadRequest(
                    "Cannot check out before checking in".to_string(),
                ));
            }
            (Some(start), Some(end)) if end < start => {
                return Err(AppError::BadRequest(
                    "check_out_time must not be before check_in_time".to_string(),
                ));
            }
            _ => {}
        }

        let event_id = registration.event_id.clone();
        let mut model: event_registration::ActiveModel = registration.into();
        if input.check_in_time.is_some() {
            model.check_in_time = Set(check_in.map(Into::into));
        }
        if input.check_out_time.is_some() {
            model.check_out_time = Set(check_out.map(Into::into));
        }
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(attendance) = input.attendance_status {
            model.attendance_status = Set(attendance);
        }
        model.updated_at = Set(Some(Utc::now().into()));

        let releases_seat = input
            .status
            .is_some_and(|next| previous.counts_toward_capacity() && !next.counts_toward_capacity());

        let txn = volunteer_db::begin(&self.db).await?;
        let updated = RegistrationRepository::update_in(&txn, model).await?;
        if releases_seat {
            EventRepository::release_seats_in(&txn, &event_id, 1).await?;
        }
        volunteer_db::commit(txn).await?;

        info!(
            registration_id = %updated.id,
            status = %updated.status.to_value(),
            updated_by = %user.id,
            "Registration updated"
        );
        Ok(updated)
    }

    /// Record the volunteer's arrival.
    pub async fn check_in(
        &self,
        user: &user::Model,
        id: &str,
    ) -> AppResult<event_registration::Model> {
        let registration = self.managed(user, id, false).await?;
        if registration.status == RegistrationStatus::Cancelled {
            return Err(AppError::BadRequest(
                "Cannot check in a cancelled registration".to_string(),
            ));
        }

        let removed = registration.status == RegistrationStatus::RemovedByOrganizer;
        let now = Utc::now();

        let mut model: event_registration::ActiveModel = registration.into();
        model.check_in_time = Set(Some(now.into()));
        model.attendance_status = Set(AttendanceStatus::Attended);
        if !removed {
            model.status = Set(RegistrationStatus::Confirmed);
        }
        model.updated_at = Set(Some(now.into()));

        let updated = self.registration_repo.update(model).await?;
        info!(registration_id = %updated.id, "Volunteer checked in");
        Ok(updated)
    }

    /// Record the volunteer's departure. Requires a prior check-in.
    pub async fn check_out(
        &self,
        user: &user::Model,
        id: &str,
    ) -> AppResult<event_registration::Model> {
        let registration = self.registration_repo.get_by_id(id).await?;
        if registration.check_in_time.is_none() {
            return Err(AppError::BadRequest(
                "Volunteer has not checked in".to_string(),
            ));
        }
        self.ensure_manages(user, &registration, false).await?;

        let now = Utc::now();
        let mut model: event_registration::ActiveModel = registration.into();
        model.check_out_time = Set(Some(now.into()));
        model.updated_at = Set(Some(now.into()));

        let updated = self.registration_repo.update(model).await?;
        info!(registration_id = %updated.id, "Volunteer checked out");
        Ok(updated)
    }

    /// Withdraw from an event. Deletes the row and frees the seat.
    pub async fn cancel(&self, user: &user::Model, id: &str) -> AppResult<()> {
        let registration = self.registration_repo.get_by_id(id).await?;
        if registration.volunteer_id != user.id {
            return Err(AppError::Forbidden(
                "You can only cancel your own registrations".to_string(),
            ));
        }
        if registration.status == RegistrationStatus::RemovedByOrganizer {
            return Err(AppError::BadRequest(
                "Registration was removed by the organiser".to_string(),
            ));
        }

        let seats = u64::from(registration.status.counts_toward_capacity());

        let txn = volunteer_db::begin(&self.db).await?;
        RegistrationRepository::delete_in(&txn, &registration.id).await?;
        EventRepository::release_seats_in(&txn, &registration.event_id, seats).await?;
        volunteer_db::commit(txn).await?;

        info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            "Registration cancelled by volunteer"
        );
        Ok(())
    }

    /// Remove a volunteer from an event. They cannot register for it again.
    pub async fn remove(
        &self,
        user: &user::Model,
        event_id: &str,
        id: &str,
        reason: Option<String>,
    ) -> AppResult<event_registration::Model> {
        let registration = self.managed(user, id, true).await?;
        if registration.event_id != event_id {
            return Err(AppError::NotFound("Registration not found".to_string()));
        }

        let previous = registration.status;
        if !previous.can_transition_to(RegistrationStatus::RemovedByOrganizer) {
            return Err(AppError::BadRequest(format!(
                "Registration is already {}",
                previous.to_value()
            )));
        }

        let now = Utc::now();
        let mut model: event_registration::ActiveModel = registration.into();
        model.status = Set(RegistrationStatus::RemovedByOrganizer);
        model.removal_reason = Set(reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()));
        model.updated_at = Set(Some(now.into()));

        let txn = volunteer_db::begin(&self.db).await?;
        let updated = RegistrationRepository::update_in(&txn, model).await?;
        EventRepository::release_seats_in(
            &txn,
            event_id,
            u64::from(previous.counts_toward_capacity()),
        )
        .await?;
        volunteer_db::commit(txn).await?;

        info!(
            registration_id = %updated.id,
            event_id = %event_id,
            removed_by = %user.id,
            "Volunteer removed from event"
        );
        Ok(updated)
    }

    /// Attach feedback. Volunteers write their own side, organisers theirs.
    pub async fn add_feedback(
        &self,
        user: &user::Model,
        id: &str,
        input: FeedbackInput,
    ) -> AppResult<event_registration::Model> {
        input.validate()?;
        let comment = input
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("Comment is required".to_string()))?;

        let registration = self.registration_repo.get_by_id(id).await?;
        if registration.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "Cannot leave feedback on a {} registration",
                registration.status.to_value()
            )));
        }

        let now = Utc::now();
        let role = user.role;
        match role {
            UserRole::Volunteer if registration.volunteer_id == user.id => {}
            UserRole::Organiser => self.ensure_manages(user, &registration, false).await?,
            _ => {
                return Err(AppError::Forbidden(
                    "Not authorized to leave feedback on this registration".to_string(),
                ));
            }
        }

        let mut model: event_registration::ActiveModel = registration.into();
        if role == UserRole::Volunteer {
            model.volunteer_feedback_comment = Set(Some(comment));
            model.volunteer_feedback_rating = Set(Some(input.rating));
            model.volunteer_feedback_at = Set(Some(now.into()));
        } else {
            model.organiser_feedback_comment = Set(Some(comment));
            model.organiser_feedback_rating = Set(Some(input.rating));
            model.organiser_feedback_at = Set(Some(now.into()));
        }
        model.updated_at = Set(Some(now.into()));

        self.registration_repo.update(model).await
    }
}
