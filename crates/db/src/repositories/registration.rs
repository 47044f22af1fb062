//! Event registration repository.

use std::sync::Arc;

use crate::entities::{
    EventRegistration,
    event_registration::{self, AttendanceStatus, RegistrationStatus},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, sea_query::Expr,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Registration repository for database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl RegistrationRepository {
    /// Create a new registration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event_registration::Model>> {
        EventRegistration::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a registration by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event_registration::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))
    }

    /// Find the registration of a volunteer for an event.
    pub async fn find_by_pair(
        &self,
        volunteer_id: &str,
        event_id: &str,
    ) -> AppResult<Option<event_registration::Model>> {
        EventRegistration::find()
            .filter(event_registration::Column::VolunteerId.eq(volunteer_id))
            .filter(event_registration::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a registration on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: event_registration::ActiveModel,
    ) -> AppResult<event_registration::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| insert_error(e, "Already registered for this event"))
    }

    /// Update a registration on the given connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: event_registration::ActiveModel,
    ) -> AppResult<event_registration::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a registration.
    pub async fn update(
        &self,
        model: event_registration::ActiveModel,
    ) -> AppResult<event_registration::Model> {
        Self::update_in(self.db.as_ref(), model).await
    }

    /// Delete a registration on the given connection.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        EventRegistration::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Registrations for an event, in signup order.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<event_registration::Model>> {
        EventRegistration::find()
            .filter(event_registration::Column::EventId.eq(event_id))
            .order_by_asc(event_registration::Column::SignupDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Registrations of a volunteer, newest first.
    pub async fn find_by_volunteer(
        &self,
        volunteer_id: &str,
    ) -> AppResult<Vec<event_registration::Model>> {
        EventRegistration::find()
            .filter(event_registration::Column::VolunteerId.eq(volunteer_id))
            .order_by_desc(event_registration::Column::SignupDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Registrations of a volunteer in one status, on the given connection.
    pub async fn find_by_volunteer_and_status_in<C: ConnectionTrait>(
        conn: &C,
        volunteer_id: &str,
        status: RegistrationStatus,
    ) -> AppResult<Vec<event_registration::Model>> {
        EventRegistration::find()
            .filter(event_registration::Column::VolunteerId.eq(volunteer_id))
            .filter(event_registration::Column::Status.eq(status))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Cancel a set of registrations.
    pub async fn cancel_many_in<C: ConnectionTrait>(conn: &C, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = EventRegistration::update_many()
            .col_expr(
                event_registration::Column::Status,
                Expr::value(RegistrationStatus::Cancelled),
            )
            .col_expr(event_registration::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(event_registration::Column::Id.is_in(ids.iter().cloned()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Settle open registrations of completed events.
    ///
    /// Checked-in registrations become `attended`, the rest `no_show`.
    /// Returns `(attended, no_show)` row counts.
    pub async fn settle_for_events_in<C: ConnectionTrait>(
        conn: &C,
        event_ids: &[String],
    ) -> AppResult<(u64, u64)> {
        if event_ids.is_empty() {
            return Ok((0, 0));
        }

        let open = [RegistrationStatus::Registered, RegistrationStatus::Confirmed];
        let now = Utc::now();

        let attended = EventRegistration::update_many()
            .col_expr(
                event_registration::Column::Status,
                Expr::value(RegistrationStatus::Attended),
            )
            .col_expr(
                event_registration::Column::AttendanceStatus,
                Expr::value(AttendanceStatus::Attended),
            )
            .col_expr(event_registration::Column::UpdatedAt, Expr::value(now))
            .filter(event_registration::Column::EventId.is_in(event_ids.iter().cloned()))
            .filter(event_registration::Column::Status.is_in(open))
            .filter(event_registration::Column::CheckInTime.is_not_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let no_show = EventRegistration::update_many()
            .col_expr(
                event_registration::Column::Status,
                Expr::value(RegistrationStatus::NoShow),
            )
            .col_expr(
                event_registration::Column::AttendanceStatus,
                Expr::value(AttendanceStatus::Absent),
            )
            .col_expr(event_registration::Column::UpdatedAt, Expr::value(now))
            .filter(event_registration::Column::EventId.is_in(event_ids.iter().cloned()))
            .filter(event_registration::Column::Status.is_in(open))
            .filter(event_registration::Column::CheckInTime.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((attended.rows_affected, no_show.rows_affected))
    }

    /// Count registrations in a status.
    pub async fn count_by_status(&self, status: RegistrationStatus) -> AppResult<u64> {
        EventRegistration::find()
            .filter(event_registration::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all registrations.
    pub async fn count_all(&self) -> AppResult<u64> {
        EventRegistration::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_registration(id: &str) -> event_registration::Model {
        event_registration::Model {
            id: id.to_string(),
            volunteer_id: "u1".to_string(),
            event_id: "e1".to_string(),
            status: RegistrationStatus::Registered,
            attendance_status: AttendanceStatus::Pending,
            signup_date: Utc::now().into(),
            check_in_time: None,
            check_out_time: None,
            removal_reason: None,
            volunteer_feedback_comment: None,
            volunteer_feedback_rating: None,
            volunteer_feedback_at: None,
            organiser_feedback_comment: None,
            organiser_feedback_rating: None,
            organiser_feedback_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_registration("r1")]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let found = repo.find_by_pair("u1", "e1").await.unwrap().unwrap();

        assert_eq!(found.id, "r1");
    }

    #[tokio::test]
    async fn test_settle_for_events() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();

        let counts = RegistrationRepository::settle_for_events_in(&db, &["e1".to_string()])
            .await
            .unwrap();

        assert_eq!(counts, (3, 2));
    }

    #[tokio::test]
    async fn test_cancel_many_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert_eq!(RegistrationRepository::cancel_many_in(&db, &[]).await.unwrap(), 0);
    }

    #[test]
    fn test_hours_contributed() {
        let mut reg = create_test_registration("r1");
        assert!(reg.hours_contributed().abs() < f64::EPSILON);

        let start = Utc::now();
        reg.check_in_time = Some(start.into());
        reg.check_out_time = Some((start + chrono::Duration::minutes(150)).into());
        assert!((reg.hours_contributed() - 2.5).abs() < f64::EPSILON);
    }
}
