//! Registration, login and profile handlers.

use axum::{extract::State, http::StatusCode};
use domain::models::user::{AuthResponse, LoginRequest, RegisterRequest, User};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AuthUser, Json};
use crate::middleware::metrics::record_user_registered;
use crate::services::AuthService;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let response = service.register(&request).await?;

    record_user_registered(response.user.role.as_str());
    info!(user_id = %response.user.id, role = %response.user.role, "User registered");

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let response = service.login(&request).await?;

    info!(user_id = %response.user.id, "User logged in");
    Ok(Json(response))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, ApiError> {
    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    Ok(Json(service.current_user(auth.user_id).await?))
}
