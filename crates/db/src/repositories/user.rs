//! User repository.

use std::sync::Arc;

use crate::entities::{
    User,
    user::{self, UserRole, UserStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use volunteer_common::{AppError, AppResult};

use super::insert_error;

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Case-insensitive email substring
    pub search: Option<String>,
}

impl UserFilter {
    fn apply(&self, mut query: Select<User>) -> Select<User> {
        if let Some(role) = self.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(status) = self.status {
            query = query.filter(user::Column::Status.eq(status));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            query = query.filter(user::Column::Email.like(pattern));
        }
        query
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Find a user by login email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user on the given connection.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: user::ActiveModel,
    ) -> AppResult<user::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| insert_error(e, "Email is already registered"))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set account status on the given connection.
    pub async fn set_status_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        status: UserStatus,
    ) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            status: Set(status),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        model
            .update(conn)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => AppError::NotFound("User not found".to_string()),
                e => AppError::Database(e.to_string()),
            })
    }

    /// List users, newest first.
    pub async fn list(
        &self,
        filter: &UserFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        filter
            .apply(User::find())
            .order_by_desc(user::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users matching a filter.
    pub async fn count(&self, filter: &UserFilter) -> AppResult<u64> {
        filter
            .apply(User::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users with a role.
    pub async fn count_by_role(&self, role: UserRole) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Role.eq(role))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users created after `since`.
    pub async fn count_created_since(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<u64> {
        User::find()
            .filter(user::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, email: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Volunteer,
            status: UserStatus::Active,
            profile_picture: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let user = create_test_user("u1", "alice@example.org");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_email("Alice@Example.org ").await.unwrap();

        assert_eq!(found.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_status() {
        let mut user = create_test_user("u1", "bob@example.org");
        user.status = UserStatus::Suspended;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let updated = UserRepository::set_status_in(&db, "u1", UserStatus::Suspended)
            .await
            .unwrap();

        assert_eq!(updated.status, UserStatus::Suspended);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_user("u1", "a@example.org"),
                    create_test_user("u2", "b@example.org"),
                ]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let filter = UserFilter {
            role: Some(UserRole::Volunteer),
            ..Default::default()
        };
        let users = repo.list(&filter, 20, 0).await.unwrap();

        assert_eq!(users.len(), 2);
    }
}
