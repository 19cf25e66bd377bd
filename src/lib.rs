//! Stateless authentication and request-tracing middleware shared by the
//! workspace's HTTP services.
//!
//! A service builds one [`Platform`] at startup (overriding whichever
//! capabilities it needs), registers its routes, then calls
//! [`middleware::apply`] to install the correlation, authentication and
//! policy stages in a fixed order.

pub mod clock;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod platform;
pub mod services;
pub mod telemetry;

pub use config::{AppEnv, ConfigError, PlatformConfig};
pub use error::{AppError, Rejection};
pub use platform::{Platform, PlatformBuilder, PlatformError};
