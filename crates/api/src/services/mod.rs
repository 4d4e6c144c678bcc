//! Application services.

pub mod admin_bootstrap;
pub mod auth;

pub use admin_bootstrap::bootstrap_admin;
pub use auth::{AuthError, AuthService};
