//! HTTP route handlers.

pub mod alerts;
pub mod auth;
pub mod devices;
pub mod edge_devices;
pub mod fields;
pub mod health;
pub mod maintenance;
pub mod readings;
pub mod weather;
