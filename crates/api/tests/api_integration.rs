//! API integration tests.
//!
//! These drive the full router, auth middleware included, over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, Value};
use serde_json::json;
use tower::ServiceExt;
use volunteer_api::{AppState, auth_middleware, router as api_router};
use volunteer_common::{
    Config, LocalStorage, StorageBackend,
    config::{
        AuthConfig, CertificateConfig, DatabaseConfig, SchedulerSettings, ServerConfig,
        StorageSettings,
    },
};
use volunteer_core::{
    AccountService, AdminService, CertificateService, EventService, RegistrationService,
    ReportService, ReviewService, TokenIssuer,
};
use volunteer_db::entities::{
    certificate,
    event::{self, EventStatus},
    user::{self, UserRole, UserStatus},
};

const SECRET: &str = "integration-secret";
const USER_ID: &str = "01hzy0000000000000000000aa";

fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            url: "https://volunteer.example.org".to_string(),
            allowed_origins: vec![],
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
            token_ttl_hours: 1,
        },
        storage: StorageSettings {
            upload_dir: std::env::temp_dir().join("vhub-api-uploads"),
            ..StorageSettings::default()
        },
        certificates: CertificateConfig {
            output_dir: std::env::temp_dir().join("vhub-api-certificates"),
            verify_base_url: None,
            ..CertificateConfig::default()
        },
        scheduler: SchedulerSettings::default(),
    }
}

/// Build the router the way the server does, over the given mock.
fn create_test_router(mock: MockDatabase) -> Router {
    let config = create_test_config();
    let db = Arc::new(mock.into_connection());
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.upload_dir.clone(),
        config.storage.base_url.clone(),
    ));

    let state = AppState {
        account_service: AccountService::new(Arc::clone(&db), Arc::clone(&storage), &config),
        event_service: EventService::new(Arc::clone(&db), Arc::clone(&storage), &config),
        registration_service: RegistrationService::new(Arc::clone(&db)),
        admin_service: AdminService::new(Arc::clone(&db)),
        report_service: ReportService::new(Arc::clone(&db)),
        review_service: ReviewService::new(Arc::clone(&db)),
        certificate_service: CertificateService::new(Arc::clone(&db), &config),
    };

    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn test_user(role: UserRole, status: UserStatus) -> user::Model {
    user::Model {
        id: USER_ID.to_string(),
        email: "someone@example.org".to_string(),
        password_hash: "hash".to_string(),
        role,
        status,
        profile_picture: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_event() -> event::Model {
    let start = Utc::now();
    event::Model {
        id: "01hzy0000000000000000000ev".to_string(),
        organiser_id: "01hzy0000000000000000000gg".to_string(),
        name: "Beach cleanup".to_string(),
        description: "Bring gloves".to_string(),
        location: "East Coast Park".to_string(),
        causes: json!(["environment"]),
        max_volunteers: Some(10),
        registered_count: 2,
        status: EventStatus::Active,
        is_recurring: false,
        start_datetime: Some(start.into()),
        end_datetime: Some((start + chrono::Duration::hours(3)).into()),
        recurrence_pattern: None,
        recurrence_days: json!([]),
        recurrence_start_date: None,
        recurrence_end_date: None,
        recurrence_time_start: None,
        recurrence_time_end: None,
        image: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Mock whose first query answers the bearer-token user lookup.
fn db_with_caller(user: &user::Model) -> MockDatabase {
    empty_db().append_query_results([vec![user.clone()]])
}

fn bearer(user: &user::Model) -> String {
    let token = TokenIssuer::new(SECRET, 1).issue(user).unwrap();
    format!("Bearer {token}")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/registrations/mine")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_suspended_account_is_forbidden() {
    let user = test_user(UserRole::Volunteer, UserStatus::Suspended);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account is suspended");
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let user = test_user(UserRole::Volunteer, UserStatus::Active);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/dashboard")
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Admin access required");
}

#[tokio::test]
async fn test_malformed_registration_id_is_rejected() {
    let user = test_user(UserRole::Volunteer, UserStatus::Active);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/registrations/12345")
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_uppercase_registration_id_is_rejected() {
    let user = test_user(UserRole::Volunteer, UserStatus::Active);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/registrations/01HZY0000000000000000000AA")
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid resource ID");
}

#[tokio::test]
async fn test_organiser_cannot_register_for_event() {
    let user = test_user(UserRole::Organiser, UserStatus::Active);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/registrations")
                .header(header::AUTHORIZATION, bearer(&user))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "event_id": "01hzy0000000000000000000ev" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_with_malformed_event_id() {
    let user = test_user(UserRole::Volunteer, UserStatus::Active);
    let app = create_test_router(db_with_caller(&user));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/registrations")
                .header(header::AUTHORIZATION, bearer(&user))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"event_id":"abc"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid event ID");
}

#[tokio::test]
async fn test_public_event_listing() {
    let db = empty_db()
        .append_query_results([vec![test_event()]])
        .append_query_results([vec![maplit::btreemap! {
            "num_items" => Into::<Value>::into(1i64),
        }]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/events?page=1&limit=10&cause=environment")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Beach cleanup");
}

#[tokio::test]
async fn test_verify_unknown_certificate_returns_404() {
    let db = empty_db().append_query_results([Vec::<certificate::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/certificates/verify/6f1c1f8e-3f4b-4c39-9a63-0e8f1f0b7c11")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_malformed_certificate_id_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/certificates/verify/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_with_invalid_json_returns_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
