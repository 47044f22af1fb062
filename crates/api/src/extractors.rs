//! Request extractors.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use volunteer_common::{AppError, ensure_valid_id};
use volunteer_core::ensure_active;
use volunteer_db::entities::{admin, user};

use crate::middleware::AppState;

/// Authenticated, active user.
///
/// Suspended and inactive accounts get 403 even with a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        let user = parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;
        ensure_active(&user)?;
        Ok(Self(user))
    }
}

/// Optional authenticated user extractor.
///
/// Only active accounts count as signed in.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<user::Model>()
                .filter(|user| ensure_active(user).is_ok())
                .cloned(),
        ))
    }
}

/// Authenticated user with an admin profile.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: user::Model,
    pub admin: admin::Model,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        let admin = state.admin_service.resolve_admin(&user).await?;
        Ok(Self { user, admin })
    }
}

/// Path parameters that are row identifiers.
///
/// Every value must be a ULID; anything else is a 400 before the database is
/// touched.
#[derive(Debug, Clone)]
pub struct IdPath<T>(pub T);

/// Path parameter types accepted by [`IdPath`].
pub trait PathIds {
    /// Identifier values to check.
    fn ids(&self) -> Vec<&str>;
}

impl PathIds for String {
    fn ids(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl PathIds for (String, String) {
    fn ids(&self) -> Vec<&str> {
        vec![self.0.as_str(), self.1.as_str()]
    }
}

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + PathIds + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        for id in value.ids() {
            ensure_valid_id(id, "resource")?;
        }
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use volunteer_db::entities::user::{UserRole, UserStatus};

    fn user(status: UserStatus) -> user::Model {
        user::Model {
            id: "01hzy0000000000000000000aa".to_string(),
            email: "v@example.org".to_string(),
            password_hash: String::new(),
            role: UserRole::Volunteer,
            status,
            profile_picture: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn parts_with(user: Option<user::Model>) -> Parts {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }
        req.into_parts().0
    }

    #[tokio::test]
    async fn test_auth_user_requires_token() {
        let mut parts = parts_with(None);
        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_suspended_user_is_forbidden() {
        let mut parts = parts_with(Some(user(UserStatus::Suspended)));
        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let MaybeAuthUser(maybe) = MaybeAuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(maybe.is_none());
    }

    #[tokio::test]
    async fn test_active_user_passes() {
        let mut parts = parts_with(Some(user(UserStatus::Active)));
        let AuthUser(found) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.email, "v@example.org");
    }
}
