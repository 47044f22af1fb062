//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    routing::{delete, get, post},
};
use serde::Deserialize;
use validator::Validate;
use volunteer_common::{AppResult, UploadKind};
use volunteer_core::{
    CreateEventInput, EventDetail, EventQuery, EventVolunteer, Page, PageRequest,
    UpdateEventInput,
};
use volunteer_db::entities::{event, event_registration};

use crate::{
    extractors::{AuthUser, IdPath, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
    upload::read_upload,
};

/// Remove registration request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RemoveRegistrationRequest {
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

/// Public listing of active events.
async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(query): Query<EventQuery>,
) -> AppResult<ApiResponse<Page<event::Model>>> {
    let events = state.event_service.list(query, page).await?;
    Ok(ApiResponse::ok(events))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state.event_service.create(&user, input).await?;
    Ok(ApiResponse::created(event))
}

/// Events owned by the calling organiser, drafts included.
async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<event::Model>>> {
    let events = state.event_service.list_mine(&user, page).await?;
    Ok(ApiResponse::ok(events))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<EventDetail>> {
    let detail = state.event_service.get(&id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(detail))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<UpdateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state.event_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(event))
}

async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state.event_service.cancel(&user, &id).await?;
    Ok(ApiResponse::ok(event))
}

async fn list_registrations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<Vec<EventVolunteer>>> {
    let volunteers = state.event_service.list_registrations(&user, &id).await?;
    Ok(ApiResponse::ok(volunteers))
}

/// Remove a volunteer from the event. They cannot register again.
async fn remove_registration(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath((event_id, id)): IdPath<(String, String)>,
    body: Option<Json<RemoveRegistrationRequest>>,
) -> AppResult<ApiResponse<event_registration::Model>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let registration = state
        .registration_service
        .remove(&user, &event_id, &id, req.reason)
        .await?;
    Ok(ApiResponse::ok(registration))
}

async fn upload_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<event::Model>> {
    let (_, file) = read_upload(&mut multipart, &[UploadKind::EventImage]).await?;
    let event = state.event_service.upload_image(&user, &id, file).await?;
    Ok(ApiResponse::ok(event))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/mine", get(list_mine))
        .route("/{id}", get(show).put(update))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/image", post(upload_image))
        .route("/{id}/registrations", get(list_registrations))
        .route(
            "/{id}/registrations/{registration_id}",
            delete(remove_registration),
        )
}
