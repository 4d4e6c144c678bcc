//! Token authentication and role gates.
//!
//! Tokens are accepted from the `x-auth-token` header or, failing that, an
//! `Authorization: Bearer` header. Role gates run after `require_auth` and
//! re-read the caller's row so a changed role takes effect immediately.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::user::UserRole;
use persistence::repositories::UserRepository;
use shared::jwt::JwtConfig;
use std::str::FromStr;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Why a request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
}

impl AuthRejection {
    pub fn into_api_error(self) -> ApiError {
        match self {
            AuthRejection::MissingToken => {
                ApiError::Unauthorized("No token, authorization denied".to_string())
            }
            AuthRejection::InvalidToken => ApiError::Unauthorized("Token is not valid".to_string()),
        }
    }
}

/// Pulls the raw token out of the request headers.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token);
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies the request's token and returns the caller it names.
pub fn authenticate(jwt: &JwtConfig, headers: &HeaderMap) -> Result<AuthUser, AuthRejection> {
    let token = extract_token(headers).ok_or(AuthRejection::MissingToken)?;

    let claims = jwt.validate_token(token).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        AuthRejection::InvalidToken
    })?;

    let user_id = claims.user_id().map_err(|_| AuthRejection::InvalidToken)?;
    let role = UserRole::from_str(&claims.role).map_err(|_| AuthRejection::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        role,
        jti: claims.jti,
    })
}

/// Middleware that rejects requests without a valid token and stores the
/// caller in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state.jwt, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(rejection) => rejection.into_api_error().into_response(),
    }
}

/// Role-based access gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    Admin,
    /// Buyers, and admins acting on their behalf.
    Buyer,
}

impl RoleGate {
    pub fn permits(&self, role: UserRole) -> bool {
        match self {
            RoleGate::Admin => role == UserRole::Admin,
            RoleGate::Buyer => matches!(role, UserRole::Buyer | UserRole::Admin),
        }
    }

    fn denial(&self) -> &'static str {
        match self {
            RoleGate::Admin => "Access denied. Admin role required.",
            RoleGate::Buyer => "Access denied. Buyer role required.",
        }
    }
}

async fn enforce_role(state: &AppState, mut req: Request<Body>, next: Next, gate: RoleGate) -> Response {
    let Some(auth) = req.extensions().get::<AuthUser>().cloned() else {
        return AuthRejection::MissingToken.into_api_error().into_response();
    };

    let user = match UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return ApiError::NotFound("User not found".to_string()).into_response(),
        Err(e) => return ApiError::from(e).into_response(),
    };

    let role = user.role();
    if !gate.permits(role) {
        tracing::warn!(user_id = %auth.user_id, role = %role, gate = ?gate, "Role gate denied request");
        return ApiError::Forbidden(gate.denial().to_string()).into_response();
    }

    req.extensions_mut().insert(AuthUser { role, ..auth });
    next.run(req).await
}

/// Admin-only gate. Must run after [`require_auth`].
pub async fn require_admin(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    enforce_role(&state, req, next, RoleGate::Admin).await
}

/// Buyer (or admin) gate. Must run after [`require_auth`].
pub async fn require_buyer(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    enforce_role(&state, req, next, RoleGate::Buyer).await
}
