//! Authenticated caller extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::user::UserRole;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::{authenticate, AuthRejection};

/// The caller behind a verified access token.
///
/// `require_auth` places this in request extensions; role gates refresh
/// `role` from the users table before handlers run.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub jti: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owner-or-admin rule for IoT resources.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    /// `Forbidden` unless the caller owns the resource or is an admin.
    pub fn ensure_access(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.can_access(owner_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Access denied".to_string()))
        }
    }

    /// Owner filter for listings: `None` lets admins see everything.
    pub fn owner_filter(&self) -> Option<Uuid> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<AuthUser>() {
            return Ok(auth.clone());
        }

        authenticate(&state.jwt, &parts.headers).map_err(AuthRejection::into_api_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_owner_can_access() {
        let auth = user(UserRole::Farmer);
        assert!(auth.can_access(auth.user_id));
        assert!(!auth.can_access(Uuid::new_v4()));
        assert!(auth.ensure_access(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let auth = user(UserRole::Admin);
        assert!(auth.can_access(Uuid::new_v4()));
        assert!(auth.owner_filter().is_none());
    }

    #[test]
    fn test_owner_filter_for_non_admin() {
        let auth = user(UserRole::Agronomist);
        assert_eq!(auth.owner_filter(), Some(auth.user_id));
    }
}
