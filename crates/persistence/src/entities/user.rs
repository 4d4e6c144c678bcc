//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::user::UserRole;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or_default()
    }
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        let role = entity.role();
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            role,
            phone: entity.phone,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
