//! Token → identity resolution used by the authentication stage.

use std::sync::Arc;

use async_trait::async_trait;

use crate::services::auth::identity::{LookupError, ResolvedIdentity, UserLookup};
use crate::services::auth::token::{TokenCodec, TokenError};

/// Why a presented token did not produce an identity.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthFailure {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("token subject does not resolve to a user")]
    UserNotFound,
    #[error("user account is disabled")]
    UserDisabled,
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// The authenticator itself failed unexpectedly (e.g. panicked).
    #[error("internal error while authenticating")]
    Internal,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<ResolvedIdentity, AuthFailure>;
}

/// Default authenticator: verify the token, then re-resolve the subject.
#[derive(Clone)]
pub struct TokenAuthenticator {
    codec: Arc<dyn TokenCodec>,
    users: Arc<dyn UserLookup>,
}

impl TokenAuthenticator {
    pub fn new(codec: Arc<dyn TokenCodec>, users: Arc<dyn UserLookup>) -> Self {
        Self { codec, users }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<ResolvedIdentity, AuthFailure> {
        let verified = self.codec.verify(token)?;

        let record = self
            .users
            .lookup_user(&verified.subject)
            .await?
            .ok_or(AuthFailure::UserNotFound)?;

        if !record.enabled {
            return Err(AuthFailure::UserDisabled);
        }

        Ok(record.identity())
    }
}
