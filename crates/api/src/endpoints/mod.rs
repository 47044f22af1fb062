//! API endpoints.

mod admin;
mod auth;
mod certificates;
mod events;
mod registrations;
mod reports;
mod reviews;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/registrations", registrations::router())
        .nest("/admin", admin::router())
        .nest("/certificates", certificates::router())
        .nest("/reports", reports::router())
        .nest("/reviews", reviews::router())
}
