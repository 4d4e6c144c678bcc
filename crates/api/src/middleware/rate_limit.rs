//! Per-client request rate limiting.
//!
//! Authenticated callers are keyed by user id; anonymous ones by client IP,
//! taken from `x-forwarded-for` when a proxy sets it.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use serde_json::json;
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::extractors::AuthUser;
use crate::middleware::metrics::record_rate_limited;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientKey {
    User(Uuid),
    Ip(IpAddr),
    Unknown,
}

impl ClientKey {
    pub fn from_request(req: &Request<Body>) -> Self {
        if let Some(auth) = req.extensions().get::<AuthUser>() {
            return ClientKey::User(auth.user_id);
        }

        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ClientKey::Ip(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| ClientKey::Ip(addr.ip()))
            .unwrap_or(ClientKey::Unknown)
    }
}

pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<ClientKey>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            rate_limit_per_minute: per_minute.get(),
        }
    }

    /// `Err` carries the retry-after delay in whole seconds, at least 1.
    pub fn check(&self, key: &ClientKey) -> Result<(), u64> {
        self.limiter.check_key(key).map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    pub fn limit(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Drops state for clients whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(limiter) = state.rate_limiter.as_ref() {
        let key = ClientKey::from_request(&req);
        if let Err(retry_after) = limiter.check(&key) {
            tracing::warn!(client = ?key, retry_after, "Rate limit exceeded");
            record_rate_limited();
            return rate_limited_response(limiter.limit(), retry_after);
        }
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
