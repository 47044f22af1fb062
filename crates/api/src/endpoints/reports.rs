//! User report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use volunteer_common::{AppResult, ensure_valid_id};
use volunteer_core::CreateReportInput;
use volunteer_db::entities::report;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// File a report against a volunteer, organiser or event.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    ensure_valid_id(&input.target_id, "target")?;
    let report = state.report_service.create(&user, input).await?;
    Ok(ApiResponse::created(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}
