//! Review endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use volunteer_common::{AppResult, ensure_valid_id};
use volunteer_core::{CreateReviewInput, ReviewSummary};
use volunteer_db::entities::review::{self, ReviewEntityType};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<ApiResponse<review::Model>> {
    ensure_valid_id(&input.entity_id, "entity")?;
    let review = state.review_service.create(&user, input).await?;
    Ok(ApiResponse::created(review))
}

/// Reviews of an event, organiser or volunteer, with the average rating.
async fn list(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(ReviewEntityType, String)>,
) -> AppResult<ApiResponse<ReviewSummary>> {
    ensure_valid_id(&entity_id, "entity")?;
    let summary = state.review_service.list(entity_type, &entity_id).await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{entity_type}/{entity_id}", get(list))
}
