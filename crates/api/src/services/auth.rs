//! Account registration and login.

use domain::models::user::{normalize_email, AuthResponse, LoginRequest, RegisterRequest, User, UserRole};
use persistence::repositories::{NewUser, UserRepository};
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists")]
    EmailAlreadyExists,

    #[error("Admin accounts cannot be self-registered")]
    AdminRegistrationForbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::AdminRegistrationForbidden => ApiError::Validation(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::DatabaseError(e) => ApiError::from(e),
            AuthError::TokenError(_) | AuthError::PasswordError(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

pub struct AuthService {
    users: UserRepository,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Creates an account and returns a token for it. The admin role is only
    /// reachable through bootstrap or an existing admin.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        let role = req.role.unwrap_or_default();
        if role == UserRole::Admin {
            return Err(AuthError::AdminRegistrationForbidden);
        }

        let email = normalize_email(&req.email);
        let password_hash = hash_password(&req.password)?;

        let entity = self
            .users
            .create(NewUser {
                name: req.name.trim(),
                email: &email,
                password_hash: &password_hash,
                role: role.as_str(),
                phone: req.phone.as_deref(),
            })
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::DatabaseError(e),
            })?;

        let user: User = entity.into();
        let (token, _) = self.jwt.generate_token(user.id, user.role.as_str())?;

        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&req.email);

        let entity = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&req.password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let user: User = entity.into();
        let (token, _) = self.jwt.generate_token(user.id, user.role.as_str())?;

        Ok(AuthResponse { token, user })
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or(AuthError::UserNotFound)
    }
}
