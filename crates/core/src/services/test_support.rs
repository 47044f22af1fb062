//! Fixtures shared by service tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;
use volunteer_common::{
    AppResult, Config, StorageBackend, UploadedFile,
    config::{
        AuthConfig, CertificateConfig, DatabaseConfig, SchedulerSettings, ServerConfig,
        StorageSettings,
    },
};
use volunteer_db::entities::{
    admin, event,
    event::EventStatus,
    event_registration::{self, AttendanceStatus, RegistrationStatus},
    organiser::{self, VerificationStatus},
    user::{self, UserRole, UserStatus},
    volunteer,
};

pub fn test_config() -> Config {
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
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
        },
        storage: StorageSettings::default(),
        certificates: CertificateConfig {
            output_dir: std::env::temp_dir().join("vhub-test-certificates"),
            verify_base_url: None,
            ..CertificateConfig::default()
        },
        scheduler: SchedulerSettings::default(),
    }
}

pub fn test_user(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.org"),
        password_hash: "hash".to_string(),
        role,
        status: UserStatus::Active,
        profile_picture: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn test_volunteer(id: &str, user_id: &str) -> volunteer::Model {
    volunteer::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: "Ada Tan".to_string(),
        phone: None,
        dob: None,
        skills: json!(["first aid", "logistics", "cooking", "driving"]),
        preferred_causes: json!(["environment"]),
        nric_image: Some(format!("nric/{user_id}.png")),
        nric_verified: false,
        nric_rejection_reason: None,
        nric_requires_reupload: false,
        nric_uploaded_at: Some(Utc::now().into()),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn test_organiser(id: &str, user_id: &str) -> organiser::Model {
    organiser::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        organisation_name: "Green Shores".to_string(),
        phone: None,
        description: None,
        verification_status: VerificationStatus::Verified,
        verification_rejection_reason: None,
        certification_document: None,
        certification_verified: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn test_admin(id: &str, user_id: &str) -> admin::Model {
    admin::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: "Moderator".to_string(),
        permissions: json!(["all"]),
        reports_handled: 0,
        created_at: Utc::now().into(),
    }
}

pub fn test_event(id: &str, organiser_id: &str) -> event::Model {
    let start = Utc::now();
    event::Model {
        id: id.to_string(),
        organiser_id: organiser_id.to_string(),
        name: "Beach cleanup".to_string(),
        description: "Bring gloves".to_string(),
        location: "East Coast Park".to_string(),
        causes: json!(["environment"]),
        max_volunteers: Some(10),
        registered_count: 0,
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

pub fn test_registration(id: &str, volunteer_id: &str, event_id: &str) -> event_registration::Model {
    event_registration::Model {
        id: id.to_string(),
        volunteer_id: volunteer_id.to_string(),
        event_id: event_id.to_string(),
        status: RegistrationStatus::Registered,
        attendance_status: AttendanceStatus::Pending,
        signup_date: Utc::now().into(),
        check_in_time: None,
        check_out_time: None,
        removal_reason: None,
        volunteer_feedback_comment: None,
        volunteer_feedback_rating: None,
        volunteer_feedback_at: None,
        organiser_feedback_comment: None,
        organiser_feedback_rating: None,
        organiser_feedback_at: None,
        updated_at: None,
    }
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/uploads/{key}")
    }
}

/// Statements the mock connection received, in execution order, each
/// rendered with its bound values.
///
/// Services holding clones of the connection must be dropped first.
pub fn executed(db: Arc<DatabaseConnection>) -> Vec<String> {
    let db = Arc::try_unwrap(db).ok().unwrap();
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| {
            format!("{txn:?}")
                .split("Statement { sql: ")
                .skip(1)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn is_update(stmt: &str, table: &str) -> bool {
    stmt.starts_with(&format!("\"UPDATE \\\"{table}\\\""))
}

pub fn is_insert(stmt: &str, table: &str) -> bool {
    stmt.starts_with(&format!("\"INSERT INTO \\\"{table}\\\""))
}

pub fn is_delete(stmt: &str, table: &str) -> bool {
    stmt.starts_with(&format!("\"DELETE FROM \\\"{table}\\\""))
}

/// Whether a string parameter equal to `value` is bound to `stmt`.
pub fn binds(stmt: &str, value: &str) -> bool {
    stmt.contains(&format!("String(Some({value:?}))"))
}
