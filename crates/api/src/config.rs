use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

use shared::jwt::MIN_SECRET_LEN;

/// Process configuration. Built once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per client; 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound for reading batches and bulk forecast inserts.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    #[serde(default = "default_max_forecast_days")]
    pub max_forecast_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// Shared HS256 signing secret, at least 32 bytes.
    pub secret: String,

    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: i64,

    /// Clock skew tolerance when checking expiry.
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

/// First admin account, created at startup when both values are set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub bootstrap_email: String,

    #[serde(default)]
    pub bootstrap_password: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_max_batch_size() -> usize {
    500
}
fn default_page_size() -> i64 {
    20
}
fn default_max_page_size() -> i64 {
    100
}
fn default_max_forecast_days() -> i64 {
    30
}
fn default_token_expiry() -> i64 {
    86_400 // 24 hours
}
fn default_jwt_leeway() -> u64 {
    30
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml
    /// 2. config/local.toml (optional, not in git)
    /// 3. Environment variables with the AGRI__ prefix, e.g. `AGRI__JWT__SECRET`
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("AGRI")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a config from embedded defaults plus overrides, without files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 5000
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 120

            [limits]
            max_batch_size = 500
            default_page_size = 20
            max_page_size = 100
            max_forecast_days = 30

            [jwt]
            secret = "an-hs256-test-secret-of-at-least-32-bytes"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "AGRI__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.jwt.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::InvalidValue(format!(
                "AGRI__JWT__SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.jwt.token_expiry_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "jwt.token_expiry_secs must be positive".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        let limits = &self.limits;
        if limits.max_batch_size == 0
            || limits.default_page_size <= 0
            || limits.max_page_size <= 0
            || limits.max_forecast_days <= 0
        {
            return Err(ConfigValidationError::InvalidValue(
                "limits must all be greater than zero".to_string(),
            ));
        }

        if limits.default_page_size > limits.max_page_size {
            return Err(ConfigValidationError::InvalidValue(
                "default_page_size cannot exceed max_page_size".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
