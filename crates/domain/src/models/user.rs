//! User account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

string_enum! {
    /// Platform role. Admins bypass ownership checks.
    #[derive(Default)]
    pub enum UserRole: "role" {
        #[default]
        Farmer => "farmer",
        Agronomist => "agronomist",
        Admin => "admin",
        Investor => "investor",
        Buyer => "buyer",
        Logistics => "logistics",
    }
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for self-registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Please include a valid email"))]
    pub email: String,

    #[validate(custom(function = "shared::password::validate_password"))]
    pub password: String,

    #[serde(default)]
    pub role: Option<UserRole>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,
}

/// Request payload for login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus the profile it was issued for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Lowercases and trims an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
