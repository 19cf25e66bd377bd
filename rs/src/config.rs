use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use platform::{ConfigError, PlatformConfig};
use url::Url;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub platform: PlatformConfig,
    pub user_directory_path: PathBuf,

    // Downstream auth service (GET /api/v1/me)
    pub auth_service_url: Url,
    pub downstream_timeout: Duration,

    // Generated correlation ids look like `<prefix>-<uuid>`
    pub correlation_id_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let platform = PlatformConfig::from_env()?;

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let user_directory_path = platform
            .user_directory_path
            .clone()
            .ok_or(ConfigError::Missing("USER_DIRECTORY_PATH"))?;

        let auth_service_url = std::env::var("AUTH_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:4000/".to_string());
        let auth_service_url =
            Url::parse(&auth_service_url).map_err(|_| ConfigError::Invalid("AUTH_SERVICE_URL"))?;

        let downstream_timeout_seconds: u64 = match std::env::var("DOWNSTREAM_TIMEOUT_SECONDS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("DOWNSTREAM_TIMEOUT_SECONDS"))?,
            Err(_) => 5,
        };

        let correlation_id_prefix =
            std::env::var("CORRELATION_ID_PREFIX").unwrap_or_else(|_| "rs".to_string());

        Ok(Config {
            addr,
            platform,
            user_directory_path,
            auth_service_url,
            downstream_timeout: Duration::from_secs(downstream_timeout_seconds),
            correlation_id_prefix,
        })
    }
}
