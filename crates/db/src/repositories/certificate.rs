//! Certificate repository.

use std::sync::Arc;

use crate::entities::{Certificate, certificate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the certificate issued to a user for an event.
    pub async fn find_by_user_and_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .filter(certificate::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a certificate by its public UUID.
    pub async fn find_by_certificate_id(
        &self,
        certificate_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::CertificateId.eq(certificate_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Certificates of a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .order_by_desc(certificate::Column::IssuedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a certificate.
    pub async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(e, "Certificate already issued for this event"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_by_certificate_id() {
        let cert = certificate::Model {
            id: "c1".to_string(),
            certificate_id: "6f1c2f8e-8f8e-4a59-9d6b-5f1b2d1c0a11".to_string(),
            user_id: "u1".to_string(),
            event_id: "e1".to_string(),
            volunteer_name: "Ada".to_string(),
            event_name: "Beach cleanup".to_string(),
            organiser_name: "Green Org".to_string(),
            event_date: None,
            hours_contributed: 3.0,
            skills_demonstrated: json!(["first aid"]),
            pdf_path: "6f1c2f8e-8f8e-4a59-9d6b-5f1b2d1c0a11.pdf".to_string(),
            issued_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[cert]])
                .append_query_results([Vec::<certificate::Model>::new()])
                .into_connection(),
        );

        let repo = CertificateRepository::new(db);
        let found = repo
            .find_by_certificate_id("6f1c2f8e-8f8e-4a59-9d6b-5f1b2d1c0a11")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.skill_list(), vec!["first aid"]);

        assert!(repo.find_by_certificate_id("other").await.unwrap().is_none());
    }
}
