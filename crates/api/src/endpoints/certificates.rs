//! Certificate endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use volunteer_common::{AppError, AppResult, ensure_valid_uuid};
use volunteer_core::CertificateVerification;
use volunteer_db::entities::certificate;

use crate::{
    extractors::{AuthUser, IdPath},
    middleware::AppState,
    response::ApiResponse,
};

/// Issue (or return the existing) certificate for an event the caller
/// volunteered at.
async fn generate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    IdPath(event_id): IdPath<String>,
) -> AppResult<ApiResponse<certificate::Model>> {
    let certificate = state.certificate_service.generate(&user, &event_id).await?;
    Ok(ApiResponse::ok(certificate))
}

async fn download(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    ensure_valid_uuid(&certificate_id)?;
    let file = state.certificate_service.download(&certificate_id).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((headers, file.bytes))
}

/// Public lookup used by the QR code link.
async fn verify(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> AppResult<ApiResponse<CertificateVerification>> {
    ensure_valid_uuid(&certificate_id)?;
    let certificate = state
        .certificate_service
        .verify(&certificate_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))?;
    Ok(ApiResponse::ok(certificate))
}

async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<certificate::Model>>> {
    let certificates = state.certificate_service.list_for_user(&user).await?;
    Ok(ApiResponse::ok(certificates))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate/{event_id}", post(generate))
        .route("/download/{certificate_id}", get(download))
        .route("/verify/{certificate_id}", get(verify))
        .route("/volunteer", get(list_mine))
}
