//! Shared utilities and common types for the Agrimaan backend.
//!
//! This crate provides common functionality used across all other crates:
//! - HS256 token signing and verification
//! - Password hashing with Argon2id
//! - Common validation logic (coordinates, percentages, angles)
//! - Keyset cursor encoding

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
