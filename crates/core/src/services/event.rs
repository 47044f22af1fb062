//! Event service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use volunteer_common::{AppError, AppResult, Config, IdGenerator, StorageBackend, UploadKind};
use volunteer_db::{
    entities::{
        event::{self, EventStatus, RecurrencePattern},
        event_registration, json_list, organiser, string_list,
        user::{self, UserRole},
    },
    repositories::{
        EventFilter, EventRepository, OrganiserRepository, RegistrationRepository,
        UserRepository, VolunteerRepository,
    },
};

use super::account::{FileUpload, clean_list, store_upload};
use super::registration::double_option;
use crate::{Page, PageRequest};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[validate(length(min = 1, max = 512))]
    pub location: String,
    #[serde(default)]
    pub causes: Vec<String>,
    #[validate(range(min = 1))]
    pub max_volunteers: Option<i32>,
    /// `active` (default) or `draft`
    pub status: Option<EventStatus>,
    #[serde(flatten)]
    pub schedule: ScheduleInput,
}

/// Occurrence fields of an event. Single and recurring fields are exclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleInput {
    #[serde(default)]
    pub is_recurring: bool,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_days: Vec<String>,
    pub recurrence_start_date: Option<NaiveDate>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub recurrence_time_start: Option<NaiveTime>,
    pub recurrence_time_end: Option<NaiveTime>,
}

/// Input for editing an event. Omitted fields are unchanged; a schedule, when
/// given, replaces the old one. `max_volunteers: null` lifts the cap.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub location: Option<String>,
    pub causes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_volunteers: Option<Option<i32>>,
    pub status: Option<EventStatus>,
    pub schedule: Option<ScheduleInput>,
}

/// Query for the public event listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub cause: Option<String>,
    pub search: Option<String>,
}

/// Event with its organiser's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: event::Model,
    pub organisation_name: String,
    pub organiser_verified: bool,
}

/// Registration row as shown to the owning organiser.
#[derive(Debug, Clone, Serialize)]
pub struct EventVolunteer {
    #[serde(flatten)]
    pub registration: event_registration::Model,
    pub volunteer_name: Option<String>,
    pub volunteer_email: Option<String>,
    pub skills: Vec<String>,
}

impl ScheduleInput {
    /// Normalise the weekday list and check the schedule is coherent.
    pub fn validate_schedule(&mut self) -> AppResult<()> {
        let bad = |msg: &str| Err(AppError::Validation(msg.to_string()));

        if self.is_recurring {
            if self.start_datetime.is_some() || self.end_datetime.is_some() {
                return bad("Recurring events cannot have single start/end datetimes");
            }
            let Some(pattern) = self.recurrence_pattern else {
                return bad("recurrence_pattern is required for recurring events");
            };
            let (Some(start), Some(end)) = (self.recurrence_start_date, self.recurrence_end_date)
            else {
                return bad("recurrence_start_date and recurrence_end_date are required");
            };
            if end < start {
                return bad("recurrence_end_date must not be before recurrence_start_date");
            }
            if let (Some(from), Some(to)) = (self.recurrence_time_start, self.recurrence_time_end) {
                if to <= from {
                    return bad("recurrence_time_end must be after recurrence_time_start");
                }
            }

            let days: Vec<String> = self
                .recurrence_days
                .iter()
                .map(|d| d.trim().to_lowercase())
                .collect();
            if let Some(day) = days.iter().find(|d| !WEEKDAYS.contains(&d.as_str())) {
                return Err(AppError::Validation(format!("Unknown weekday: {day}")));
            }
            if pattern == RecurrencePattern::Weekly && days.is_empty() {
                return bad("Weekly events need at least one recurrence day");
            }
            self.recurrence_days = clean_list(days);
        } else {
            if self.recurrence_pattern.is_some()
                || !self.recurrence_days.is_empty()
                || self.recurrence_start_date.is_some()
                || self.recurrence_end_date.is_some()
                || self.recurrence_time_start.is_some()
                || self.recurrence_time_end.is_some()
            {
                return bad("Single-occurrence events cannot have recurrence fields");
            }
            let (Some(start), Some(end)) = (self.start_datetime, self.end_datetime) else {
                return bad("start_datetime and end_datetime are required");
            };
            if end <= start {
                return bad("end_datetime must be after start_datetime");
            }
        }
        Ok(())
    }

    fn apply(self, model: &mut event::ActiveModel) {
        model.is_recurring = Set(self.is_recurring);
        model.start_datetime = Set(self.start_datetime.map(Into::into));
        model.end_datetime = Set(self.end_datetime.map(Into::into));
        model.recurrence_pattern = Set(self.recurrence_pattern);
        model.recurrence_days = Set(json_list(self.recurrence_days));
        model.recurrence_start_date = Set(self.recurrence_start_date);
        model.recurrence_end_date = Set(self.recurrence_end_date);
        model.recurrence_time_start = Set(self.recurrence_time_start);
        model.recurrence_time_end = Set(self.recurrence_time_end);
    }
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    organiser_repo: OrganiserRepository,
    registration_repo: RegistrationRepository,
    volunteer_repo: VolunteerRepository,
    user_repo: UserRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_upload_bytes: usize,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        Self {
            event_repo: EventRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            registration_repo: RegistrationRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(Arc::clone(&db)),
            user_repo: UserRepository::new(db),
            storage,
            id_gen: IdGenerator::new(),
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }

    /// The caller's organiser profile.
    async fn organiser_for(&self, user: &user::Model) -> AppResult<organiser::Model> {
        organiser_profile(&self.organiser_repo, user).await
    }

    /// Load an event and check the caller owns it.
    async fn owned_event(&self, user: &user::Model, event_id: &str) -> AppResult<event::Model> {
        let organiser = self.organiser_for(user).await?;
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organiser_id != organiser.id {
            return Err(AppError::Forbidden(
                "You can only manage your own events".to_string(),
            ));
        }
        Ok(event)
    }

    /// Create an event owned by the caller.
    pub async fn create(
        &self,
        user: &user::Model,
        mut input: CreateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        input.schedule.validate_schedule()?;

        let status = input.status.unwrap_or_default();
        if !matches!(status, EventStatus::Active | EventStatus::Draft) {
            return Err(AppError::Validation(
                "New events must be active or draft".to_string(),
            ));
        }

        let organiser = self.organiser_for(user).await?;
        let now = Utc::now();

        let mut model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            organiser_id: Set(organiser.id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            location: Set(input.location.trim().to_string()),
            causes: Set(json_list(clean_list(input.causes))),
            max_volunteers: Set(input.max_volunteers),
            registered_count: Set(0),
            status: Set(status),
            image: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
            ..Default::default()
        };
        input.schedule.apply(&mut model);

        let event = self.event_repo.create(model).await?;
        info!(event_id = %event.id, organiser_id = %event.organiser_id, "Event created");
        Ok(event)
    }

    /// Edit an event owned by the caller.
    pub async fn update(
        &self,
        user: &user::Model,
        event_id: &str,
        input: UpdateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        let event = self.owned_event(user, event_id).await?;

        if matches!(event.status, EventStatus::Cancelled | EventStatus::Completed) {
            return Err(AppError::BadRequest(
                "Cancelled or completed events cannot be edited".to_string(),
            ));
        }
        if let Some(Some(max)) = input.max_volunteers {
            if max < 1 {
                return Err(AppError::Validation(
                    "max_volunteers must be at least 1".to_string(),
                ));
            }
            if max < event.registered_count {
                return Err(AppError::BadRequest(format!(
                    "max_volunteers cannot be below the {} volunteers already registered",
                    event.registered_count
                )));
            }
        }
        if let Some(status) = input.status {
            if !matches!(status, EventStatus::Active | EventStatus::Draft) {
                return Err(AppError::BadRequest(
                    "Use the cancel endpoint to cancel an event".to_string(),
                ));
            }
        }

        let mut model: event::ActiveModel = event.into();
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(location) = input.location {
            model.location = Set(location.trim().to_string());
        }
        if let Some(causes) = input.causes {
            model.causes = Set(json_list(clean_list(causes)));
        }
        if let Some(max) = input.max_volunteers {
            model.max_volunteers = Set(max);
        }
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(mut schedule) = input.schedule {
            schedule.validate_schedule()?;
            schedule.apply(&mut model);
        }
        model.updated_at = Set(Some(Utc::now().into()));

        self.event_repo.update(model).await
    }

    /// Cancel an event owned by the caller.
    pub async fn cancel(&self, user: &user::Model, event_id: &str) -> AppResult<event::Model> {
        let event = self.owned_event(user, event_id).await?;
        if !matches!(event.status, EventStatus::Active | EventStatus::Draft) {
            return Err(AppError::BadRequest(format!(
                "Event is already {}",
                status_label(event.status)
            )));
        }

        let mut model: event::ActiveModel = event.into();
        model.status = Set(EventStatus::Cancelled);
        model.updated_at = Set(Some(Utc::now().into()));
        let event = self.event_repo.update(model).await?;

        info!(event_id = %event.id, "Event cancelled by organiser");
        Ok(event)
    }

    /// Active events for the public listing.
    pub async fn list(
        &self,
        query: EventQuery,
        page: PageRequest,
    ) -> AppResult<Page<event::Model>> {
        let filter = EventFilter {
            status: Some(EventStatus::Active),
            organiser_id: None,
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

    /// Events of the caller, any status.
    pub async fn list_mine(
        &self,
        user: &user::Model,
        page: PageRequest,
    ) -> AppResult<Page<event::Model>> {
        let organiser = self.organiser_for(user).await?;
        let filter = EventFilter {
            organiser_id: Some(organiser.id),
            ..Default::default()
        };
        let items = self
            .event_repo
            .list(&filter, page.limit(), page.offset())
            .await?;
        let total = self.event_repo.count(&filter).await?;
        Ok(Page::new(items, total, page))
    }

    /// A single event with organiser details.
    ///
    /// Drafts are only visible to their owner.
    pub async fn get(&self, event_id: &str, viewer: Option<&user::Model>) -> AppResult<EventDetail> {
        let event = self.event_repo.get_by_id(event_id).await?;
        let organiser = self.organiser_repo.get_by_id(&event.organiser_id).await?;

        if event.status == EventStatus::Draft
            && viewer.is_none_or(|v| v.id != organiser.user_id && v.role != UserRole::Admin)
        {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        Ok(EventDetail {
            event,
            organisation_name: organiser.organisation_name,
            organiser_verified: organiser.verification_status
                == organiser::VerificationStatus::Verified,
        })
    }

    /// Registrations of an event, for its organiser or an admin.
    pub async fn list_registrations(
        &self,
        user: &user::Model,
        event_id: &str,
    ) -> AppResult<Vec<EventVolunteer>> {
        if user.role == UserRole::Admin {
            self.event_repo.get_by_id(event_id).await?;
        } else {
            self.owned_event(user, event_id).await?;
        }

        let registrations = self.registration_repo.find_by_event(event_id).await?;
        let user_ids: Vec<String> = registrations
            .iter()
            .map(|r| r.volunteer_id.clone())
            .collect();

        let profiles: HashMap<String, _> = self
            .volunteer_repo
            .find_by_user_ids(&user_ids)
            .await?
            .into_iter()
            .map(|v| (v.user_id.clone(), v))
            .collect();

        let mut out = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let profile = profiles.get(&registration.volunteer_id);
            let email = self
                .user_repo
                .find_by_id(&registration.volunteer_id)
                .await?
                .map(|u| u.email);
            out.push(EventVolunteer {
                volunteer_name: profile.map(|p| p.name.clone()),
                volunteer_email: email,
                skills: profile.map(|p| string_list(&p.skills)).unwrap_or_default(),
                registration,
            });
        }
        Ok(out)
    }

    /// Store a banner image for an event owned by the caller.
    pub async fn upload_image(
        &self,
        user: &user::Model,
        event_id: &str,
        file: FileUpload,
    ) -> AppResult<event::Model> {
        let event = self.owned_event(user, event_id).await?;
        let previous = event.image.clone();

        let stored = store_upload(
            self.storage.as_ref(),
            self.max_upload_bytes,
            UploadKind::EventImage,
            &event.id,
            &file,
        )
        .await?;

        let mut model: event::ActiveModel = event.into();
        model.image = Set(Some(stored.key));
        model.updated_at = Set(Some(Utc::now().into()));
        let event = self.event_repo.update(model).await?;

        if let Some(key) = previous {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete replaced event image");
            }
        }
        Ok(event)
    }
}

/// The organiser profile of a user, or 403.
pub(crate) async fn organiser_profile(
    repo: &OrganiserRepository,
    user: &user::Model,
) -> AppResult<organiser::Model> {
    if user.role != UserRole::Organiser {
        return Err(AppError::Forbidden(
            "Only organisers can manage events".to_string(),
        ));
    }
    repo.find_by_user_id(&user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Organiser profile not found".to_string()))
}

pub(crate) const fn status_label(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Active => "active",
        EventStatus::Cancelled => "cancelled",
        EventStatus::Completed => "completed",
        EventStatus::Draft => "draft",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        MemoryStorage, executed, is_update, test_config, test_event, test_organiser, test_user,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn single(start_offset_h: i64, end_offset_h: i64) -> ScheduleInput {
        let now = Utc::now();
        ScheduleInput {
            start_datetime: Some(now + chrono::Duration::hours(start_offset_h)),
            end_datetime: Some(now + chrono::Duration::hours(end_offset_h)),
            ..Default::default()
        }
    }

    fn weekly(days: &[&str]) -> ScheduleInput {
        ScheduleInput {
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern::Weekly),
            recurrence_days: days.iter().map(ToString::to_string).collect(),
            recurrence_start_date: NaiveDate::from_ymd_opt(2026, 1, 5),
            recurrence_end_date: NaiveDate::from_ymd_opt(2026, 3, 30),
            ..Default::default()
        }
    }

    fn service(db: DatabaseConnection) -> EventService {
        EventService::new(
            Arc::new(db),
            Arc::new(MemoryStorage::default()),
            &test_config(),
        )
    }

    #[test]
    fn test_single_schedule_requires_ordered_datetimes() {
        assert!(single(1, 3).validate_schedule().is_ok());
        assert!(single(3, 1).validate_schedule().is_err());
        assert!(ScheduleInput::default().validate_schedule().is_err());
    }

    #[test]
    fn test_schedule_modes_are_exclusive() {
        let mut mixed = weekly(&["monday"]);
        mixed.start_datetime = Some(Utc::now());
        assert!(mixed.validate_schedule().is_err());

        let mut mixed = single(1, 2);
        mixed.recurrence_pattern = Some(RecurrencePattern::Daily);
        assert!(mixed.validate_schedule().is_err());
    }

    #[test]
    fn test_weekly_schedule_days() {
        let mut schedule = weekly(&["Monday", " wednesday", "monday"]);
        schedule.validate_schedule().unwrap();
        assert_eq!(schedule.recurrence_days, vec!["monday", "wednesday"]);

        assert!(weekly(&[]).validate_schedule().is_err());
        assert!(weekly(&["funday"]).validate_schedule().is_err());
    }

    #[tokio::test]
    async fn test_create_requires_organiser() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let volunteer = test_user("u1", UserRole::Volunteer);

        let result = service
            .create(
                &volunteer,
                CreateEventInput {
                    name: "Food drive".to_string(),
                    description: "Sorting donations".to_string(),
                    location: "Community hall".to_string(),
                    causes: vec![],
                    max_volunteers: Some(5),
                    status: None,
                    schedule: single(24, 27),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_other_organisers_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_organiser("o2", "u2")]])
            .append_query_results([[test_event("e1", "o1")]])
            .into_connection();
        let service = service(db);

        let result = service
            .update(
                &test_user("u2", UserRole::Organiser),
                "e1",
                UpdateEventInput::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_cannot_shrink_below_registered() {
        let mut event = test_event("e1", "o1");
        event.registered_count = 4;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_organiser("o1", "u1")]])
            .append_query_results([[event]])
            .into_connection();
        let service = service(db);

        let result = service
            .update(
                &test_user("u1", UserRole::Organiser),
                "e1",
                UpdateEventInput {
                    max_volunteers: Some(Some(3)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_draft_hidden_from_public() {
        let mut event = test_event("e1", "o1");
        event.status = EventStatus::Draft;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[event]])
            .append_query_results([[test_organiser("o1", "u1")]])
            .into_connection();
        let service = service(db);

        assert!(matches!(
            service.get("e1", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_input_null_lifts_cap() {
        let lifted: UpdateEventInput =
            serde_json::from_str(r#"{"max_volunteers": null}"#).unwrap();
        assert_eq!(lifted.max_volunteers, Some(None));

        let untouched: UpdateEventInput = serde_json::from_str(r#"{"name": "Food drive"}"#).unwrap();
        assert_eq!(untouched.max_volunteers, None);
    }

    #[tokio::test]
    async fn test_update_clears_max_volunteers() {
        let mut uncapped = test_event("e1", "o1");
        uncapped.max_volunteers = None;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_organiser("o1", "u1")]])
                .append_query_results([[test_event("e1", "o1")]])
                .append_query_results([[uncapped]])
                .into_connection(),
        );
        let service = EventService::new(
            Arc::clone(&db),
            Arc::new(MemoryStorage::default()),
            &test_config(),
        );

        service
            .update(
                &test_user("u1", UserRole::Organiser),
                "e1",
                UpdateEventInput {
                    max_volunteers: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        drop(service);
        let log = executed(db);
        assert!(
            log.iter()
                .any(|s| is_update(s, "event") && s.contains("max_volunteers") && s.contains("Int(None)"))
        );
    }

    #[tokio::test]
    async fn test_update_rejects_zero_cap() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_organiser("o1", "u1")]])
            .append_query_results([[test_event("e1", "o1")]])
            .into_connection();
        let service = service(db);

        let result = service
            .update(
                &test_user("u1", UserRole::Organiser),
                "e1",
                UpdateEventInput {
                    max_volunteers: Some(Some(0)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
