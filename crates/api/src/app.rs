use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    alerts, auth, devices, edge_devices, fields, health, maintenance, readings, weather,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: JwtConfig,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtConfig::new(
            &config.jwt.secret,
            config.jwt.token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        // 0 disables rate limiting
        let rate_limiter = (config.security.rate_limit_per_minute > 0).then(|| {
            Arc::new(RateLimiterState::new(config.security.rate_limit_per_minute))
        });

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt,
            rate_limiter,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    Ok(build_router(AppState::new(config, pool)?))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Layer order: the last route_layer added runs first, so auth runs
    // before rate limiting and the limiter can key on the user.
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/fields", post(fields::create_field).get(fields::list_fields))
        .route(
            "/api/fields/:id",
            get(fields::get_field).delete(fields::delete_field),
        )
        .route(
            "/api/iot/devices",
            post(devices::create_device).get(devices::list_devices),
        )
        .route("/api/iot/devices/near", get(devices::list_nearby_devices))
        .route(
            "/api/iot/devices/:id",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route("/api/iot/devices/:id/status", put(devices::update_device_status))
        .route(
            "/api/iot/devices/:id/maintenance",
            post(maintenance::create_maintenance_log).get(maintenance::list_maintenance_logs),
        )
        .route(
            "/api/iot/readings",
            post(readings::create_reading).get(readings::list_readings),
        )
        .route("/api/iot/readings/batch", post(readings::create_readings_batch))
        .route(
            "/api/iot/alerts",
            post(alerts::create_alert).get(alerts::list_alerts),
        )
        .route("/api/iot/alerts/:id", axum::routing::delete(alerts::delete_alert))
        .route("/api/iot/alerts/:id/acknowledge", put(alerts::acknowledge_alert))
        .route("/api/iot/alerts/:id/resolve", put(alerts::resolve_alert))
        .route("/api/iot/alerts/:id/false-alarm", put(alerts::mark_false_alarm))
        .route(
            "/api/iot/edge-devices",
            post(edge_devices::create_edge_device).get(edge_devices::list_edge_devices),
        )
        .route(
            "/api/iot/edge-devices/:id",
            get(edge_devices::get_edge_device)
                .put(edge_devices::update_edge_device)
                .delete(edge_devices::delete_edge_device),
        )
        .route(
            "/api/iot/edge-devices/:id/devices",
            put(edge_devices::set_connected_devices),
        )
        .route(
            "/api/weather/field/:field_id/current",
            get(weather::get_field_current_weather),
        )
        .route(
            "/api/weather/field/:field_id/history",
            get(weather::get_field_weather_history),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Weather writes. Merged with the public reads below; axum combines the
    // method routers registered for the same path.
    let admin_routes = Router::new()
        .route("/api/weather/current", post(weather::create_current_weather))
        .route("/api/weather/forecast", post(weather::create_forecast))
        .route("/api/weather/forecast/bulk", post(weather::bulk_create_forecast))
        .route("/api/weather/alerts", post(weather::create_weather_alert))
        .route(
            "/api/weather/alerts/:id",
            put(weather::update_weather_alert).delete(weather::delete_weather_alert),
        )
        .route("/api/weather/historical", post(weather::create_historical_weather))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/weather/current", get(weather::get_current_weather))
        .route("/api/weather/forecast", get(weather::get_forecast))
        .route("/api/weather/alerts", get(weather::get_weather_alerts))
        .route("/api/weather/historical", get(weather::get_historical_weather))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Probes and scrapes are never rate limited.
    let health_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
