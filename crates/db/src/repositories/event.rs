//! Event repository.

use std::sync::Arc;

use crate::entities::{
    Event,
    event::{self, EventStatus},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use volunteer_common::{AppError, AppResult};

/// Filters for event listings.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub organiser_id: Option<String>,
    /// Events whose causes contain this value
    pub cause: Option<String>,
    /// Case-insensitive match on name or location
    pub search: Option<String>,
}

impl EventFilter {
    fn apply(&self, mut query: Select<Event>) -> Select<Event> {
        if let Some(status) = self.status {
            query = query.filter(event::Column::Status.eq(status));
        }
        if let Some(organiser_id) = &self.organiser_id {
            query = query.filter(event::Column::OrganiserId.eq(organiser_id.as_str()));
        }
        if let Some(cause) = self.cause.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(Expr::cust_with_values(
                "causes @> $1::jsonb",
                [serde_json::json!([cause]).to_string()],
            ));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(Expr::col(event::Column::Name).ilike(pattern.clone()))
                    .add(Expr::col(event::Column::Location).ilike(pattern)),
            );
        }
        query
    }
}

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find an event by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    /// Events by ID.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<event::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Event::find()
            .filter(event::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        Self::update_in(self.db.as_ref(), model).await
    }

    /// Update an event on the given connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: event::ActiveModel,
    ) -> AppResult<event::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List events, soonest first.
    pub async fn list(
        &self,
        filter: &EventFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        filter
            .apply(Event::find())
            .order_by_asc(event::Column::StartDatetime)
            .order_by_desc(event::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count events matching a filter.
    pub async fn count(&self, filter: &EventFilter) -> AppResult<u64> {
        filter
            .apply(Event::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count events in a status.
    pub async fn count_by_status(&self, status: EventStatus) -> AppResult<u64> {
        Event::find()
            .filter(event::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Cause arrays of every event.
    pub async fn all_causes(&self) -> AppResult<Vec<serde_json::Value>> {
        Event::find()
            .select_only()
            .column(event::Column::Causes)
            .into_tuple::<serde_json::Value>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Take a seat if the event is active and not full.
    ///
    /// The capacity check and the increment are one statement, so concurrent
    /// registrations cannot push `registered_count` past `max_volunteers`.
    /// Returns `false` when no seat was taken.
    pub async fn try_take_seat_in<C: ConnectionTrait>(conn: &C, event_id: &str) -> AppResult<bool> {
        let result = Event::update_many()
            .col_expr(
                event::Column::RegisteredCount,
                Expr::col(event::Column::RegisteredCount).add(1),
            )
            .filter(event::Column::Id.eq(event_id))
            .filter(event::Column::Status.eq(EventStatus::Active))
            .filter(
                Condition::any()
                    .add(event::Column::MaxVolunteers.is_null())
                    .add(
                        Expr::col(event::Column::RegisteredCount)
                            .lt(Expr::col(event::Column::MaxVolunteers)),
                    ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Release `seats` seats, never going below zero.
    pub async fn release_seats_in<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
        seats: u64,
    ) -> AppResult<()> {
        if seats == 0 {
            return Ok(());
        }

        Event::update_many()
            .col_expr(
                event::Column::RegisteredCount,
                Expr::cust(format!("GREATEST(registered_count - {seats}, 0)")),
            )
            .filter(event::Column::Id.eq(event_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the status of a single event.
    pub async fn set_status_in<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
        status: EventStatus,
    ) -> AppResult<()> {
        let result = Event::update_many()
            .col_expr(event::Column::Status, Expr::value(status))
            .col_expr(event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(event::Column::Id.eq(event_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        Ok(())
    }

    /// Cancel every active event of an organiser. Returns the number cancelled.
    pub async fn cancel_active_by_organiser_in<C: ConnectionTrait>(
        conn: &C,
        organiser_id: &str,
    ) -> AppResult<u64> {
        let result = Event::update_many()
            .col_expr(event::Column::Status, Expr::value(EventStatus::Cancelled))
            .col_expr(event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(event::Column::OrganiserId.eq(organiser_id))
            .filter(event::Column::Status.eq(EventStatus::Active))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Active events whose last occurrence ended before `now`.
    pub async fn find_ended_active(&self, now: DateTime<Utc>) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::Status.eq(EventStatus::Active))
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(event::Column::IsRecurring.eq(false))
                            .add(event::Column::EndDatetime.lt(now)),
                    )
                    .add(
                        Condition::all()
                            .add(event::Column::IsRecurring.eq(true))
                            .add(event::Column::RecurrenceEndDate.lt(now.date_naive())),
                    ),
            )
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark events completed if they are still active.
    pub async fn complete_in<C: ConnectionTrait>(conn: &C, event_ids: &[String]) -> AppResult<u64> {
        if event_ids.is_empty() {
            return Ok(0);
        }

        let result = Event::update_many()
            .col_expr(event::Column::Status, Expr::value(EventStatus::Completed))
            .col_expr(event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(event::Column::Id.is_in(event_ids.iter().cloned()))
            .filter(event::Column::Status.eq(EventStatus::Active))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_event(id: &str, max: Option<i32>, registered: i32) -> event::Model {
        event::Model {
            id: id.to_string(),
            organiser_id: "o1".to_string(),
            name: "Beach cleanup".to_string(),
            description: "Bring gloves".to_string(),
            location: "East Coast Park".to_string(),
            causes: json!(["environment"]),
            max_volunteers: max,
            registered_count: registered,
            status: EventStatus::Active,
            is_recurring: false,
            start_datetime: Some(Utc::now().into()),
            end_datetime: Some(Utc::now().into()),
            recurrence_pattern: None,
            recurrence_days: json!([]),
            recurrence_start_date: None,
            recurrence_end_date: None,
            recurrence_time_start: None,
            recurrence_time_end: None,
            image: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_has_capacity() {
        assert!(create_test_event("e1", Some(2), 1).has_capacity());
        assert!(!create_test_event("e1", Some(1), 1).has_capacity());
        assert!(create_test_event("e1", None, 500).has_capacity());
    }

    #[tokio::test]
    async fn test_try_take_seat() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        assert!(EventRepository::try_take_seat_in(&db, "e1").await.unwrap());
        assert!(!EventRepository::try_take_seat_in(&db, "e1").await.unwrap());
    }

    #[tokio::test]
    async fn test_release_zero_seats_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        EventRepository::release_seats_in(&db, "e1", 0).await.unwrap();
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_missing_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = EventRepository::set_status_in(&db, "e404", EventStatus::Cancelled).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_event("e1", Some(10), 0)]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let filter = EventFilter {
            status: Some(EventStatus::Active),
            cause: Some("environment".to_string()),
            search: Some("beach".to_string()),
            ..Default::default()
        };
        let events = repo.list(&filter, 10, 0).await.unwrap();

        assert_eq!(events.len(), 1);
    }
}
