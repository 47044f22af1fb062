//! Review repository.

use std::sync::Arc;

use crate::entities::{
    Review,
    review::{self, ReviewEntityType},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the review a user wrote about an entity.
    pub async fn find_by_reviewer(
        &self,
        reviewer_id: &str,
        entity_type: ReviewEntityType,
        entity_id: &str,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::ReviewerId.eq(reviewer_id))
            .filter(review::Column::EntityType.eq(entity_type))
            .filter(review::Column::EntityId.eq(entity_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a review.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(e, "You have already reviewed this"))
    }

    /// Reviews of an entity, newest first.
    pub async fn find_by_entity(
        &self,
        entity_type: ReviewEntityType,
        entity_id: &str,
    ) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::EntityType.eq(entity_type))
            .filter(review::Column::EntityId.eq(entity_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
