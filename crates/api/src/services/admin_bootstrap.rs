//! Creates the first admin account at startup.

use domain::models::user::{normalize_email, UserRole};
use persistence::repositories::{NewUser, UserRepository};
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Creates an admin from `admin.bootstrap_*` unless that email is already
/// registered. Safe to run on every boot.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<(), BootstrapError> {
    if config.bootstrap_email.is_empty() {
        return Ok(());
    }

    if config.bootstrap_password.is_empty() {
        warn!("AGRI__ADMIN__BOOTSTRAP_EMAIL is set but the password is empty - skipping bootstrap");
        return Ok(());
    }

    let email = normalize_email(&config.bootstrap_email);
    let users = UserRepository::new(pool.clone());

    if users.find_by_email(&email).await?.is_some() {
        info!(email = %email, "Bootstrap admin already exists - skipping");
        return Ok(());
    }

    let password_hash = hash_password(&config.bootstrap_password)?;

    let created = users
        .create_if_absent(NewUser {
            name: "Administrator",
            email: &email,
            password_hash: &password_hash,
            role: UserRole::Admin.as_str(),
            phone: None,
        })
        .await?;

    match created {
        Some(user) => {
            info!(email = %email, user_id = %user.id, "Bootstrap admin created");
            warn!("Remove AGRI__ADMIN__BOOTSTRAP_PASSWORD from configuration after initial setup");
        }
        // Another instance raced us to it.
        None => info!(email = %email, "Bootstrap admin already exists - skipping"),
    }

    Ok(())
}
