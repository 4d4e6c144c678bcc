//! Custom Axum extractors.

pub mod auth_user;
pub mod request;

pub use auth_user::AuthUser;
pub use request::{Json, Path, Query};
