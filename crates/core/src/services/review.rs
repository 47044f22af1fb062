//! Reviews of events, organisers and volunteers.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;
use volunteer_common::{AppError, AppResult, IdGenerator};
use volunteer_db::{
    entities::{
        review::{self, ReviewEntityType},
        user,
    },
    repositories::{EventRepository, OrganiserRepository, ReviewRepository, VolunteerRepository},
};

/// Input for writing a review.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewInput {
    pub entity_type: ReviewEntityType,
    #[validate(length(min = 1))]
    pub entity_id: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Reviews of one entity with their average.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub count: usize,
    /// `None` without reviews
    pub average_rating: Option<f64>,
    pub reviews: Vec<review::Model>,
}

impl ReviewSummary {
    #[must_use]
    pub fn new(reviews: Vec<review::Model>) -> Self {
        let average_rating = (!reviews.is_empty()).then(|| {
            let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
            (sum / reviews.len() as f64 * 100.0).round() / 100.0
        });
        Self {
            count: reviews.len(),
            average_rating,
            reviews,
        }
    }
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    event_repo: EventRepository,
    organiser_repo: OrganiserRepository,
    volunteer_repo: VolunteerRepository,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            review_repo: ReviewRepository::new(Arc::clone(&db)),
            event_repo: EventRepository::new(Arc::clone(&db)),
            organiser_repo: OrganiserRepository::new(Arc::clone(&db)),
            volunteer_repo: VolunteerRepository::new(db),
            id_gen: IdGenerator::new(),
        }
    }

    /// User id behind the reviewed entity.
    async fn owner_of(&self, entity_type: ReviewEntityType, entity_id: &str) -> AppResult<String> {
        Ok(match entity_type {
            ReviewEntityType::Event => {
                let event = self.event_repo.get_by_id(entity_id).await?;
                self.organiser_repo.get_by_id(&event.organiser_id).await?.user_id
            }
            ReviewEntityType::Organiser => self.organiser_repo.get_by_id(entity_id).await?.user_id,
            ReviewEntityType::Volunteer => self.volunteer_repo.get_by_id(entity_id).await?.user_id,
        })
    }

    /// Write a review. One per reviewer and entity.
    pub async fn create(
        &self,
        reviewer: &user::Model,
        input: CreateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        let owner = self.owner_of(input.entity_type, &input.entity_id).await?;
        if owner == reviewer.id {
            return Err(AppError::BadRequest("Cannot review yourself".to_string()));
        }

        if self
            .review_repo
            .find_by_reviewer(&reviewer.id, input.entity_type, &input.entity_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("You have already reviewed this".to_string()));
        }

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            reviewer_id: Set(reviewer.id.clone()),
            entity_type: Set(input.entity_type),
            entity_id: Set(input.entity_id),
            rating: Set(input.rating),
            comment: Set(input.comment.filter(|c| !c.trim().is_empty())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        self.review_repo.create(model).await
    }

    /// Reviews of an entity with their average rating.
    pub async fn list(
        &self,
        entity_type: ReviewEntityType,
        entity_id: &str,
    ) -> AppResult<ReviewSummary> {
        let reviews = self
            .review_repo
            .find_by_entity(entity_type, entity_id)
            .await?;
        Ok(ReviewSummary::new(reviews))
    }
}
