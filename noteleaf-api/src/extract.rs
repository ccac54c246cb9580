/// Request extractors for the authenticated user
///
/// The authentication gate in `app` validates the bearer token, loads the
/// account, and stores it in request extensions. Handlers then take
/// [`CurrentUser`] or [`AdminUser`] as an argument instead of touching
/// headers themselves.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use noteleaf_shared::models::user::User;

/// The authenticated account behind the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// The authenticated account, additionally required to be an admin
///
/// A non-admin account behind a valid token gets 403, not 401; the
/// credential is fine, the privilege is missing.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(ApiError::Forbidden(
                "Administrator privileges required".to_string(),
            ));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            full_name: None,
            is_active: true,
            is_admin,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn parts_with_user(user: Option<User>) -> Parts {
        let mut request = Request::builder().body(()).unwrap();
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_current_user_present() {
        let mut parts = parts_with_user(Some(test_user(false)));
        let extracted = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert_eq!(extracted.unwrap().0.username, "ada");
    }

    #[tokio::test]
    async fn test_current_user_missing_is_unauthorized() {
        let mut parts = parts_with_user(None);
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_admin_user_requires_admin_flag() {
        let mut parts = parts_with_user(Some(test_user(false)));
        let result = AdminUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        let mut parts = parts_with_user(Some(test_user(true)));
        assert!(AdminUser::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
