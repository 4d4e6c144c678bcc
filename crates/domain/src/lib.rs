//! Domain layer for the Agrimaan backend.
//!
//! This crate contains:
//! - Domain models (users, fields, IoT devices, readings, alerts,
//!   maintenance history, edge gateways, weather)
//! - Request/response payloads with their validation rules
//! - Workflow rules such as the alert status transitions

#[macro_use]
mod macros;

pub mod models;
