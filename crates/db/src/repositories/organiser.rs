//! Organiser profile repository.

use std::sync::Arc;

use crate::entities::{Organiser, organiser};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Organiser repository for database operations.
#[derive(Clone)]
pub struct OrganiserRepository {
    db: Arc<DatabaseConnection>,
}

impl OrganiserRepository {
    /// Create a new organiser repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an organiser profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<organiser::Model>> {
        Organiser::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an organiser profile by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<organiser::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organiser not found".to_string()))
    }

    /// Find the profile belonging to a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<organiser::Model>> {
        Organiser::find()
            .filter(organiser::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Profiles for a batch of users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<organiser::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Organiser::find()
            .filter(organiser::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a profile on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: organiser::ActiveModel,
    ) -> AppResult<organiser::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| insert_error(e, "Organiser profile already exists"))
    }

    /// Update a profile.
    pub async fn update(&self, model: organiser::ActiveModel) -> AppResult<organiser::Model> {
        Self::update_in(self.db.as_ref(), model).await
    }

    /// Update a profile on the given connection.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: organiser::ActiveModel,
    ) -> AppResult<organiser::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
