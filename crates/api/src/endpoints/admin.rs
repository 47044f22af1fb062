//! Admin/Moderation endpoints.
//!
//! Every route requires an admin profile behind the bearer token.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use volunteer_common::AppResult;
use volunteer_core::{
    AdminEventDetail, AdminEventQuery, CreateActionInput, DashboardStats,
    OrganiserVerificationInput, Page, PageRequest, ReportDetail, ReportQuery,
    UpdateEventStatusInput, UpdateReportInput, UpdateUserStatusInput, UserQuery,
    UserStatusChange, UserWithProfile, VerificationDecision,
};
use volunteer_db::entities::{admin_action, event, organiser, report, report::TargetKind, volunteer};

use crate::{
    extractors::{AdminUser, IdPath},
    middleware::AppState,
    response::ApiResponse,
};

/// Audit trail filter.
#[derive(Debug, Default, Deserialize)]
pub struct ActionsQuery {
    pub target_type: Option<TargetKind>,
}

async fn dashboard(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = state.admin_service.dashboard_stats().await?;
    Ok(ApiResponse::ok(stats))
}

// ========== Users ==========

async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(query): Query<UserQuery>,
) -> AppResult<ApiResponse<Page<UserWithProfile>>> {
    let users = state.admin_service.list_users(query, page).await?;
    Ok(ApiResponse::ok(users))
}

async fn get_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<UserWithProfile>> {
    let user = state.admin_service.get_user(&id).await?;
    Ok(ApiResponse::ok(user))
}

async fn update_user_status(
    admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<UpdateUserStatusInput>,
) -> AppResult<ApiResponse<UserStatusChange>> {
    let change = state
        .admin_service
        .update_user_status(&admin.admin, &id, input)
        .await?;
    Ok(ApiResponse::ok(change))
}

// ========== Verifications ==========

async fn pending_verifications(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<volunteer::Model>>> {
    let pending = state.admin_service.pending_verifications(page).await?;
    Ok(ApiResponse::ok(pending))
}

async fn update_verification(
    admin: AdminUser,
    State(state): State<AppState>,
    IdPath(volunteer_id): IdPath<String>,
    Json(input): Json<VerificationDecision>,
) -> AppResult<ApiResponse<volunteer::Model>> {
    let volunteer = state
        .admin_service
        .update_verification_status(&admin.admin, &volunteer_id, input)
        .await?;
    Ok(ApiResponse::ok(volunteer))
}

async fn update_organiser_verification(
    admin: AdminUser,
    State(state): State<AppState>,
    IdPath(organiser_id): IdPath<String>,
    Json(input): Json<OrganiserVerificationInput>,
) -> AppResult<ApiResponse<organiser::Model>> {
    let organiser = state
        .admin_service
        .update_organiser_verification(&admin.admin, &organiser_id, input)
        .await?;
    Ok(ApiResponse::ok(organiser))
}

// ========== Reports ==========

async fn list_reports(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<Page<report::Model>>> {
    let reports = state.admin_service.list_reports(query, page).await?;
    Ok(ApiResponse::ok(reports))
}

async fn get_report(
    _admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<ReportDetail>> {
    let detail = state.admin_service.get_report(&id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn update_report(
    admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<UpdateReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .admin_service
        .update_report_status(&admin.admin, &id, input)
        .await?;
    Ok(ApiResponse::ok(report))
}

// ========== Events ==========

async fn list_events(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(query): Query<AdminEventQuery>,
) -> AppResult<ApiResponse<Page<event::Model>>> {
    let events = state.admin_service.list_events(query, page).await?;
    Ok(ApiResponse::ok(events))
}

async fn get_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> AppResult<ApiResponse<AdminEventDetail>> {
    let detail = state.admin_service.get_event(&id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn update_event_status(
    admin: AdminUser,
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
    Json(input): Json<UpdateEventStatusInput>,
) -> AppResult<ApiResponse<event::Model>> {
    let event = state
        .admin_service
        .update_event_status(&admin.admin, &id, input)
        .await?;
    Ok(ApiResponse::ok(event))
}

// ========== Audit trail ==========

async fn list_actions(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(query): Query<ActionsQuery>,
) -> AppResult<ApiResponse<Page<admin_action::Model>>> {
    let actions = state
        .admin_service
        .list_actions(query.target_type, page)
        .await?;
    Ok(ApiResponse::ok(actions))
}

/// Take a moderation action directly, optionally closing a report.
async fn create_action(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateActionInput>,
) -> AppResult<ApiResponse<admin_action::Model>> {
    let action = state.admin_service.create_action(&admin.admin, input).await?;
    Ok(ApiResponse::created(action))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/status", put(update_user_status))
        .route("/verifications", get(pending_verifications))
        .route("/verifications/{id}", put(update_verification))
        .route("/organisers/{id}/verification", put(update_organiser_verification))
        .route("/reports", get(list_reports))
        .route("/reports/{id}", get(get_report).put(update_report))
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/status", put(update_event_status))
        .route("/actions", get(list_actions).post(create_action))
}
