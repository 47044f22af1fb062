//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use volunteer_core::{
    AccountService, AdminService, CertificateService, EventService, RegistrationService,
    ReportService, ReviewService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub admin_service: AdminService,
    pub report_service: ReportService,
    pub review_service: ReviewService,
    pub certificate_service: CertificateService,
}

/// Authentication middleware.
///
/// A missing or invalid token leaves the request anonymous; routes that need a
/// user reject it in the extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.account_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
