//! Volunteer profile repository.

use std::sync::Arc;

use crate::entities::{Volunteer, volunteer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Volunteer repository for database operations.
#[derive(Clone)]
pub struct VolunteerRepository {
    db: Arc<DatabaseConnection>,
}

impl VolunteerRepository {
    /// Create a new volunteer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a volunteer profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<volunteer::Model>> {
        Volunteer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a volunteer profile by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<volunteer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Volunteer not found".to_string()))
    }

    /// Find the profile belonging to a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<volunteer::Model>> {
        Volunteer::find()
            .filter(volunteer::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Profiles for a batch of users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<volunteer::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Volunteer::find()
            .filter(volunteer::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a profile on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: volunteer::ActiveModel,
    ) -> AppResult<volunteer::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| insert_error(e, "Volunteer profile already exists"))
    }

    /// Update a profile.
    pub async fn update(&self, model: volunteer::ActiveModel) -> AppResult<volunteer::Model> {
        Self::update_in(self.db.as_ref(), model).await
    }

    /// Update a profile on the given connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: volunteer::ActiveModel,
    ) -> AppResult<volunteer::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn pending_verifications() -> Select<Volunteer> {
        Volunteer::find()
            .filter(volunteer::Column::NricImage.is_not_null())
            .filter(volunteer::Column::NricVerified.eq(false))
            .filter(volunteer::Column::NricRequiresReupload.eq(false))
    }

    /// Volunteers with an uploaded NRIC awaiting review, latest upload first.
    pub async fn find_pending_verifications(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<volunteer::Model>> {
        Self::pending_verifications()
            .order_by_desc(volunteer::Column::NricUploadedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count volunteers awaiting NRIC review.
    pub async fn count_pending_verifications(&self) -> AppResult<u64> {
        Self::pending_verifications()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
