//! Keyset cursors and page arithmetic.
//!
//! Time-series listings (readings) page with an opaque `(timestamp, id)`
//! cursor so equal timestamps never skip or repeat rows. Smaller
//! collections use classic page/limit with a total count.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Error type for cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Encodes a cursor as base64(RFC3339_timestamp|uuid).
pub fn encode_cursor(timestamp: DateTime<Utc>, id: Uuid) -> String {
    let raw = format!(
        "{}|{}",
        timestamp.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        id
    );
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor into `(timestamp, id)`.
pub fn decode_cursor(cursor: &str) -> Result<(DateTime<Utc>, Uuid), CursorError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    let (timestamp_str, id_str) = s.split_once('|').ok_or(CursorError::InvalidFormat)?;

    let id = Uuid::parse_str(id_str).map_err(|_| CursorError::InvalidId)?;

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .map_err(|_| CursorError::InvalidTimestamp)?
        .with_timezone(&Utc);

    Ok((timestamp, id))
}

/// Page metadata returned with offset-paged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total,
            page,
            limit,
            pages,
        }
    }
}

/// Clamps a requested page/limit pair and returns `(page, limit, offset)`.
///
/// Pages are 1-based; a missing or zero limit falls back to `default_limit`.
pub fn normalize_page(
    page: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = match limit {
        Some(l) if l > 0 => l.min(max_limit),
        _ => default_limit.min(max_limit),
    };
    (page, limit, (page - 1) * limit)
}
