use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::services::auth::identity::{LookupError, UserLookup};
use crate::services::auth::password::PasswordVerifier;
use crate::services::auth::token::{ExtraClaims, IssueError, TokenCodec};

/// Login outcomes. Unlike per-request validation, these are surfaced to the
/// caller distinctly.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("user not found")]
    UserNotFound,
    #[error("user account is disabled")]
    UserDisabled,
    #[error("invalid username or password")]
    CredentialsInvalid,
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct LoginService {
    users: Arc<dyn UserLookup>,
    passwords: Arc<dyn PasswordVerifier>,
    codec: Arc<dyn TokenCodec>,
    ttl_seconds: u64,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl LoginService {
    pub fn new(
        users: Arc<dyn UserLookup>,
        passwords: Arc<dyn PasswordVerifier>,
        codec: Arc<dyn TokenCodec>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            users,
            passwords,
            codec,
            ttl_seconds,
        }
    }

    /// Check credentials and issue a token for the user.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, LoginError> {
        debug!(username = %username, "login attempt");

        let Some(record) = self.users.lookup_user(username).await? else {
            info!(username = %username, "login failed: unknown user");
            return Err(LoginError::UserNotFound);
        };

        if !record.enabled {
            info!(username = %username, "login failed: account disabled");
            return Err(LoginError::UserDisabled);
        }

        if !self
            .passwords
            .verify_password(password, &record.password_hash)
        {
            warn!(username = %username, "login failed: bad credentials");
            return Err(LoginError::CredentialsInvalid);
        }

        let ttl = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let access_token = self
            .codec
            .issue(&record.username, ExtraClaims::new(), ttl)?;

        info!(username = %username, "user logged in");

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::identity::InMemoryUserDirectory;
    use crate::services::auth::token::HmacTokenCodec;

    /// Plain-text "hashes" keep these tests independent of Argon2 cost.
    struct PlainVerifier;

    impl PasswordVerifier for PlainVerifier {
        fn verify_password(&self, plain: &str, hash: &str) -> bool {
            plain == hash
        }
    }

    fn service() -> (LoginService, Arc<HmacTokenCodec>) {
        let users = InMemoryUserDirectory::from_json(
            r#"[
                {"username": "alice", "password_hash": "s3cret"},
                {"username": "bob", "password_hash": "pw", "enabled": false}
            ]"#,
        )
        .unwrap();
        let codec = Arc::new(HmacTokenCodec::new(b"login-service-test-secret-0123456789", 0).unwrap());
        let service = LoginService::new(Arc::new(users), Arc::new(PlainVerifier), codec.clone(), 600);
        (service, codec)
    }

    #[tokio::test]
    async fn correct_credentials_issue_a_verifiable_token() {
        let (service, codec) = service();
        let issued = service.login("alice", "s3cret").await.unwrap();

        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 600);
        assert_eq!(codec.verify(&issued.access_token).unwrap().subject, "alice");
    }

    #[tokio::test]
    async fn failures_are_distinguished() {
        let (service, _) = service();

        assert!(matches!(
            service.login("alice", "nope").await,
            Err(LoginError::CredentialsInvalid)
        ));
        assert!(matches!(
            service.login("mallory", "s3cret").await,
            Err(LoginError::UserNotFound)
        ));
        assert!(matches!(
            service.login("bob", "pw").await,
            Err(LoginError::UserDisabled)
        ));
    }
}
