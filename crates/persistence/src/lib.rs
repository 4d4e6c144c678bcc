//! Persistence layer for the Agrimaan backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - SQL migrations (`src/migrations`, applied with `sqlx::migrate!`)

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
