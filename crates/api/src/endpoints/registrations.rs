//! Registration endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;
use volunteer_common::{AppResult, ensure_valid_id};
use volunteer_core::{
    FeedbackInput, RegistrationDetail, RegistrationWithEvent, UpdateRegistrationInput,
};
use volunteer_db::entities::event_registration;

use crate::{
    extractors::{AuthUser, IdPath},
    middleware::AppState,
    response::{ApiResponse, Message},
};

/// Register request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub event_id: String,
}

/// Register the calling volunteer for an event.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    req.validate()?;
    ensure_valid_id(&req.event_id, "event")?;

    let registration = state
        .registration_service
        .create(&user, &req.event_id)
        .await?;
    Ok(ApiResponse::created(registration))
}

async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RegistrationWithEvent>>> {
    let registrations = state.registration_service.list_mine(&user).await?;
    Ok(ApiResponse::ok(registrations))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<RegistrationDetail>> {
    let detail = state.registration_service.get(&user, &id).await?;
    Ok(ApiResponse::ok(detail))
}

/// Organiser or admin patch of timestamps and statuses.
///
/// `null` clears a timestamp; an omitted field is left alone.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<UpdateRegistrationInput>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    let registration = state.registration_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(registration))
}

/// Volunteer withdraws; the row is deleted.
async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<Message>> {
    state.registration_service.cancel(&user, &id).await?;
    Ok(ApiResponse::ok(Message {
        message: "Registration cancelled",
    }))
}

async fn check_in(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    let registration = state.registration_service.check_in(&user, &id).await?;
    Ok(ApiResponse::ok(registration))
}

async fn check_out(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    let registration = state.registration_service.check_out(&user, &id).await?;
    Ok(ApiResponse::ok(registration))
}

async fn feedback(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<FeedbackInput>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    let registration = state
        .registration_service
        .add_feedback(&user, &id, input)
        .await?;
    Ok(ApiResponse::ok(registration))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(list_mine))
        .route("/{id}", get(show).put(update).delete(cancel))
        .route("/{id}/check-in", post(check_in))
        .route("/{id}/check-out", post(check_out))
        .route("/{id}/feedback", post(feedback))
}
