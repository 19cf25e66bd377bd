/*
 * Responsibility
 * - 共有 capability (token codec / authenticator / correlation id source /
 *   password verifier / security policy) をまとめた Platform
 * - PlatformBuilder: override があればそれを、なければ default を使う
 * - Clone 前提 (中身は Arc)。middleware の State としてそのまま渡せる
 */
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::PlatformConfig;
use crate::middleware::correlation::{CorrelationIdSource, UuidCorrelationIdSource};
use crate::middleware::policy::SecurityPolicy;
use crate::services::auth::token::KeyError;
use crate::services::auth::{
    Argon2PasswordVerifier, Authenticator, HmacTokenCodec, LoginService, PasswordVerifier,
    TokenAuthenticator, TokenCodec, UserLookup,
};
use crate::services::downstream::{DownstreamError, ServiceClient};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("invalid signing key: {0}")]
    Key(#[from] KeyError),
}

#[derive(Clone)]
pub struct Platform {
    config: Arc<PlatformConfig>,
    token_codec: Arc<dyn TokenCodec>,
    authenticator: Arc<dyn Authenticator>,
    correlation_ids: Arc<dyn CorrelationIdSource>,
    security_policy: Arc<SecurityPolicy>,
    login: LoginService,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("config", &self.config)
            .field("security_policy", &self.security_policy)
            .finish_non_exhaustive()
    }
}

impl Platform {
    pub fn builder(config: PlatformConfig, users: Arc<dyn UserLookup>) -> PlatformBuilder {
        PlatformBuilder::new(config, users)
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn correlation_header(&self) -> &HeaderName {
        &self.config.correlation_header
    }

    pub fn auth_cookie_name(&self) -> &str {
        &self.config.auth_cookie_name
    }

    pub fn token_codec(&self) -> &dyn TokenCodec {
        self.token_codec.as_ref()
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn correlation_ids(&self) -> &dyn CorrelationIdSource {
        self.correlation_ids.as_ref()
    }

    pub fn security_policy(&self) -> &SecurityPolicy {
        &self.security_policy
    }

    pub fn login_service(&self) -> &LoginService {
        &self.login
    }

    /// Outbound client that speaks the platform's correlation header.
    pub fn service_client(
        &self,
        base_url: &str,
        timeout: Duration,
    ) -> Result<ServiceClient, DownstreamError> {
        ServiceClient::new(base_url, self.config.correlation_header.clone(), timeout)
    }
}

/// Collects overrides; anything not overridden falls back to the default.
pub struct PlatformBuilder {
    config: PlatformConfig,
    users: Arc<dyn UserLookup>,
    clock: Option<Arc<dyn Clock>>,
    token_codec: Option<Arc<dyn TokenCodec>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    correlation_ids: Option<Arc<dyn CorrelationIdSource>>,
    password_verifier: Option<Arc<dyn PasswordVerifier>>,
    security_policy: Option<SecurityPolicy>,
}

impl PlatformBuilder {
    pub fn new(config: PlatformConfig, users: Arc<dyn UserLookup>) -> Self {
        Self {
            config,
            users,
            clock: None,
            token_codec: None,
            authenticator: None,
            correlation_ids: None,
            password_verifier: None,
            security_policy: None,
        }
    }

    /// Clock for the default token codec. Ignored when the codec is overridden.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn token_codec(mut self, codec: Arc<dyn TokenCodec>) -> Self {
        self.token_codec = Some(codec);
        self
    }

    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    #[must_use]
    pub fn correlation_ids(mut self, source: Arc<dyn CorrelationIdSource>) -> Self {
        self.correlation_ids = Some(source);
        self
    }

    #[must_use]
    pub fn password_verifier(mut self, verifier: Arc<dyn PasswordVerifier>) -> Self {
        self.password_verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.security_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<Platform, PlatformError> {
        let token_codec: Arc<dyn TokenCodec> = match self.token_codec {
            Some(codec) => {
                chosen("token_codec", Source::Override);
                codec
            }
            None => {
                chosen("token_codec", Source::Default);
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                Arc::new(
                    HmacTokenCodec::new(
                        self.config.jwt_secret.as_bytes(),
                        self.config.token_leeway_seconds,
                    )?
                    .with_clock(clock),
                )
            }
        };

        // default authenticator は解決済みの codec を使う
        let authenticator: Arc<dyn Authenticator> = match self.authenticator {
            Some(a) => {
                chosen("authenticator", Source::Override);
                a
            }
            None => {
                chosen("authenticator", Source::Default);
                Arc::new(TokenAuthenticator::new(
                    token_codec.clone(),
                    self.users.clone(),
                ))
            }
        };

        let correlation_ids: Arc<dyn CorrelationIdSource> = match self.correlation_ids {
            Some(s) => {
                chosen("correlation_ids", Source::Override);
                s
            }
            None => {
                chosen("correlation_ids", Source::Default);
                Arc::new(UuidCorrelationIdSource)
            }
        };

        let password_verifier: Arc<dyn PasswordVerifier> = match self.password_verifier {
            Some(v) => {
                chosen("password_verifier", Source::Override);
                v
            }
            None => {
                chosen("password_verifier", Source::Default);
                Arc::new(Argon2PasswordVerifier)
            }
        };

        let security_policy = match self.security_policy {
            Some(p) => {
                chosen("security_policy", Source::Override);
                p
            }
            None => {
                chosen("security_policy", Source::Default);
                SecurityPolicy::default()
            }
        };

        let login = LoginService::new(
            self.users,
            password_verifier,
            token_codec.clone(),
            self.config.token_ttl_seconds,
        );

        Ok(Platform {
            config: Arc::new(self.config),
            token_codec,
            authenticator,
            correlation_ids,
            security_policy: Arc::new(security_policy),
            login,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Default,
    Override,
}

fn chosen(capability: &'static str, source: Source) {
    info!(capability, source = ?source, "platform capability resolved");
}
