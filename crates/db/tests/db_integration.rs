//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p volunteer-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `vhub_test`)
//!   `TEST_DB_PASSWORD` (default: `vhub_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use volunteer_common::{AppError, IdGenerator};
use volunteer_db::{
    entities::{
        admin,
        admin_action::{self, AdminActionType},
        event::{self, EventStatus},
        event_registration::{self, AttendanceStatus, RegistrationStatus},
        organiser::{self, VerificationStatus},
        report::{self, ReportStatus, TargetKind},
        user::{self, UserRole, UserStatus},
    },
    repositories::{
        EventRepository, ModerationRepository, OrganiserRepository, RegistrationRepository,
        UserRepository,
    },
    test_utils::{TestDatabase, TestDbConfig},
};

async fn seed_user(db: &TestDatabase, role: UserRole) -> user::Model {
    let id = IdGenerator::new().generate();
    UserRepository::create_in(
        db.connection(),
        user::ActiveModel {
            id: Set(id.clone()),
            email: Set(format!("{id}@example.org")),
            password_hash: Set("x".to_string()),
            role: Set(role),
            status: Set(UserStatus::Active),
            profile_picture: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await
    .unwrap()
}

async fn seed_event(db: &TestDatabase, max_volunteers: Option<i32>) -> event::Model {
    let owner = seed_user(db, UserRole::Organiser).await;
    let org = OrganiserRepository::create_in(
        db.connection(),
        organiser::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            user_id: Set(owner.id),
            organisation_name: Set("Harbour Cleanup Crew".to_string()),
            phone: Set(None),
            description: Set(None),
            verification_status: Set(VerificationStatus::Verified),
            verification_rejection_reason: Set(None),
            certification_document: Set(None),
            certification_verified: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await
    .unwrap();

    let repo = EventRepository::new(Arc::new(db.connection().clone()));
    repo.create(event::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        organiser_id: Set(org.id),
        name: Set("Harbour cleanup".to_string()),
        description: Set("Litter picking along the harbour".to_string()),
        location: Set("Pier 4".to_string()),
        causes: Set(json!(["environment"])),
        max_volunteers: Set(max_volunteers),
        registered_count: Set(0),
        status: Set(EventStatus::Active),
        is_recurring: Set(false),
        start_datetime: Set(Some(Utc::now().into())),
        end_datetime: Set(Some((Utc::now() + chrono::Duration::hours(3)).into())),
        recurrence_pattern: Set(None),
        recurrence_days: Set(json!([])),
        recurrence_start_date: Set(None),
        recurrence_end_date: Set(None),
        recurrence_time_start: Set(None),
        recurrence_time_end: Set(None),
        image: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    })
    .await
    .unwrap()
}

fn registration(volunteer_id: &str, event_id: &str) -> event_registration::ActiveModel {
    event_registration::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        volunteer_id: Set(volunteer_id.to_string()),
        event_id: Set(event_id.to_string()),
        status: Set(RegistrationStatus::Registered),
        attendance_status: Set(AttendanceStatus::Pending),
        signup_date: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_email_is_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let first = seed_user(&db, UserRole::Volunteer).await;

    let result = UserRepository::create_in(
        db.connection(),
        user::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            email: Set(first.email.clone()),
            password_hash: Set("x".to_string()),
            role: Set(UserRole::Volunteer),
            status: Set(UserStatus::Active),
            profile_picture: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_seat_taking_respects_capacity() {
    let db = TestDatabase::create_unique().await.unwrap();
    let event = seed_event(&db, Some(1)).await;

    assert!(EventRepository::try_take_seat_in(db.connection(), &event.id).await.unwrap());
    assert!(!EventRepository::try_take_seat_in(db.connection(), &event.id).await.unwrap());

    EventRepository::release_seats_in(db.connection(), &event.id, 5)
        .await
        .unwrap();
    let reloaded = EventRepository::find_by_id_in(db.connection(), &event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.registered_count, 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_registration_is_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let event = seed_event(&db, None).await;
    let volunteer = seed_user(&db, UserRole::Volunteer).await;

    RegistrationRepository::create_in(db.connection(), registration(&volunteer.id, &event.id))
        .await
        .unwrap();
    let second =
        RegistrationRepository::create_in(db.connection(), registration(&volunteer.id, &event.id))
            .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_audit_trail_blocks_deletes() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    let event = seed_event(&db, None).await;
    let reporter = seed_user(&db, UserRole::Volunteer).await;
    let admin_user = seed_user(&db, UserRole::Admin).await;

    let admin = admin::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        user_id: Set(admin_user.id),
        name: Set("Moderator".to_string()),
        permissions: Set(json!([])),
        reports_handled: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .unwrap();

    let report = ModerationRepository::new(Arc::new(conn.clone()))
        .create_report(report::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            reporter_id: Set(reporter.id),
            target_type: Set(TargetKind::Event),
            target_id: Set(event.id.clone()),
            reason: Set("Misleading description".to_string()),
            status: Set(ReportStatus::Pending),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();

    ModerationRepository::create_action_in(
        conn,
        admin_action::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            admin_id: Set(admin.id.clone()),
            action_type: Set(AdminActionType::ReportDismissed),
            target_type: Set(TargetKind::Event),
            target_id: Set(event.id),
            reason: Set("Not a violation".to_string()),
            related_report_id: Set(Some(report.id.clone())),
            created_at: Set(Utc::now().into()),
        },
    )
    .await
    .unwrap();

    assert!(admin::Entity::delete_by_id(admin.id).exec(conn).await.is_err());
    assert!(report::Entity::delete_by_id(report.id.clone()).exec(conn).await.is_err());

    let actions = admin_action::Entity::find().all(conn).await.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].related_report_id.as_deref(), Some(report.id.as_str()));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}
