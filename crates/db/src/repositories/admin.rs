//! Admin profile repository.

use std::sync::Arc;

use crate::entities::{Admin, admin};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};
use volunteer_common::{AppError, AppResult};

/// Admin repository for database operations.
#[derive(Clone)]
pub struct AdminRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminRepository {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the admin profile belonging to a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Profiles for a batch of users.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<admin::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Admin::find()
            .filter(admin::Column::UserId.is_in(user_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment `reports_handled` atomically.
    pub async fn increment_reports_handled_in<C: ConnectionTrait>(
        conn: &C,
        admin_id: &str,
    ) -> AppResult<()> {
        Admin::update_many()
            .col_expr(
                admin::Column::ReportsHandled,
                Expr::col(admin::Column::ReportsHandled).add(1),
            )
            .filter(admin::Column::Id.eq(admin_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_by_user_id() {
        let admin = admin::Model {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            name: "Root".to_string(),
            permissions: json!(["manage_users"]),
            reports_handled: 3,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );

        let repo = AdminRepository::new(db);
        let found = repo.find_by_user_id("u1").await.unwrap().unwrap();
        assert_eq!(found.reports_handled, 3);
    }

    #[tokio::test]
    async fn test_increment_reports_handled() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        AdminRepository::increment_reports_handled_in(&db, "a1")
            .await
            .unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }
}
