//! Account endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post, put},
};
use serde::Serialize;
use volunteer_common::{AppResult, UploadKind};
use volunteer_core::{AccountView, AuthSession, LoginInput, Profile, SignupInput, UpdateProfileInput};

use crate::{
    extractors::AuthUser, middleware::AppState, response::ApiResponse, upload::read_upload,
};

/// Stored upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub field: &'static str,
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// Create a volunteer or organiser account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.account_service.signup(input).await?;
    Ok(ApiResponse::created(session))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.account_service.login(input).await?;
    Ok(ApiResponse::ok(session))
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AccountView>> {
    let view = state.account_service.me(&user).await?;
    Ok(ApiResponse::ok(view))
}

async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<Profile>> {
    let profile = state.account_service.update_profile(&user, input).await?;
    Ok(ApiResponse::ok(profile))
}

/// Upload an identity document or profile picture.
///
/// The multipart field name picks the slot: `nric_image`,
/// `certification_document` or `profile_picture`.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let (kind, file) = read_upload(
        &mut multipart,
        &[
            UploadKind::NricImage,
            UploadKind::CertificationDocument,
            UploadKind::ProfilePicture,
        ],
    )
    .await?;

    let stored = state.account_service.upload(&user, kind, file).await?;

    Ok(ApiResponse::created(UploadResponse {
        field: kind.field_name(),
        key: stored.key,
        url: stored.url,
        size: stored.size,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/uploads", post(upload))
}
