use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use platform::{ConfigError, PlatformConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub platform: PlatformConfig,
    // JSON array of user records (see InMemoryUserDirectory::from_json)
    pub user_directory_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // PlatformConfig::from_env loads .env as well
        let platform = PlatformConfig::from_env()?;

        let port: u16 = match std::env::var("AUTH_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("AUTH_PORT"))?,
            Err(_) => 4000,
        };
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("AUTH_PORT"))?;

        let user_directory_path = platform
            .user_directory_path
            .clone()
            .ok_or(ConfigError::Missing("USER_DIRECTORY_PATH"))?;

        Ok(Config {
            addr,
            platform,
            user_directory_path,
        })
    }
}
