/*
 * Responsibility
 * - Shared platform settings read from the environment (JWT secret, token TTL,
 *   header / cookie names, transport guards)
 * - Validation happens here so misconfiguration fails at startup, never per request
 */
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;

/// Minimum HMAC secret length accepted by the token codec.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest token lifetime accepted from configuration (one year).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 366 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct PlatformConfig {
    pub app_env: AppEnv,

    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
    // Accepted clock skew between issuer and verifier. 0 = strict `now < exp`.
    pub token_leeway_seconds: u64,

    pub correlation_header: HeaderName,
    pub auth_cookie_name: String,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub user_directory_path: Option<PathBuf>,
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("PlatformConfig")
            .field("app_env", &self.app_env)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("correlation_header", &self.correlation_header)
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("user_directory_path", &self.user_directory_path)
            .finish()
    }
}

impl PlatformConfig {
    /// Defaults for everything except the secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            app_env: AppEnv::Development,
            jwt_secret: jwt_secret.into(),
            token_ttl_seconds: 86_400, // 24 h
            token_leeway_seconds: 0,
            correlation_header: HeaderName::from_static("x-correlation-id"),
            auth_cookie_name: "token".to_string(),
            request_timeout: Duration::from_secs(30),
            request_body_limit_bytes: 1024 * 1024,
            user_directory_path: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the process environment in production,
    /// a map in tests).
    pub fn from_source<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let mut config = Self::with_secret(jwt_secret);
        config.app_env = AppEnv::parse(get("APP_ENV").as_deref());

        config.token_ttl_seconds = parse_or(&get, "TOKEN_TTL_SECONDS", config.token_ttl_seconds)?;
        if config.token_ttl_seconds == 0 || config.token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::Invalid("TOKEN_TTL_SECONDS"));
        }
        config.token_leeway_seconds =
            parse_or(&get, "TOKEN_LEEWAY_SECONDS", config.token_leeway_seconds)?;

        if let Some(raw) = get("CORRELATION_ID_HEADER") {
            config.correlation_header = HeaderName::from_str(raw.trim())
                .map_err(|_| ConfigError::Invalid("CORRELATION_ID_HEADER"))?;
        }

        if let Some(raw) = get("AUTH_COOKIE_NAME") {
            let name = raw.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("AUTH_COOKIE_NAME"));
            }
            config.auth_cookie_name = name.to_string();
        }

        let timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECONDS", 30u64)?;
        config.request_timeout = Duration::from_secs(timeout_secs);
        config.request_body_limit_bytes = parse_or(
            &get,
            "REQUEST_BODY_LIMIT_BYTES",
            config.request_body_limit_bytes,
        )?;

        config.user_directory_path = get("USER_DIRECTORY_PATH").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
