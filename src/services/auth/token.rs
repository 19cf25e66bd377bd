//! Identity token codec (compact JWS, HS512).
//!
//! Verification distinguishes three failures so callers can react differently:
//! - `Malformed`: the header/claims segments cannot be parsed
//! - `SignatureInvalid`: structure is fine but the MAC (or algorithm) does not match
//! - `Expired`: signature is good but `now >= exp + leeway`
//!
//! Expiry is checked here (not by `jsonwebtoken`) so the clock is injectable.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::{Clock, SystemClock};
use crate::config::MIN_SECRET_BYTES;

/// Extra (non-registered) claims carried by a token.
pub type ExtraClaims = Map<String, Value>;

const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("token ttl must be at least one second")]
    NonPositiveTtl,
    #[error("token expiry is outside the representable time range")]
    TtlOutOfRange,
    #[error("token subject must not be empty")]
    EmptySubject,
    #[error("claim '{0}' is reserved")]
    ReservedClaim(String),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signing secret must be at least {min} bytes (got {actual})")]
    TooShort { min: usize, actual: usize },
}

/// Claims of a token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub claims: ExtraClaims,
}

/// Issue / verify identity tokens.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, subject: &str, extra: ExtraClaims, ttl: Duration)
    -> Result<String, IssueError>;

    fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    extra: ExtraClaims,
}

/// HMAC-SHA-512 codec keyed by the service-wide secret.
#[derive(Clone)]
pub struct HmacTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for HmacTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("HmacTokenCodec")
            .field("algorithm", &Algorithm::HS512)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl HmacTokenCodec {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Result<Self, KeyError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(KeyError::TooShort {
                min: MIN_SECRET_BYTES,
                actual: secret.len(),
            });
        }

        // Signature only; registered claims are checked in `verify`.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl TokenCodec for HmacTokenCodec {
    fn issue(
        &self,
        subject: &str,
        extra: ExtraClaims,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        if ttl.num_seconds() <= 0 {
            return Err(IssueError::NonPositiveTtl);
        }
        if subject.trim().is_empty() {
            return Err(IssueError::EmptySubject);
        }
        if let Some(name) = extra.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
            return Err(IssueError::ReservedClaim(name.clone()));
        }

        let iat = self.clock.now().timestamp();
        // verify() must be able to read `exp` back
        let exp = iat
            .checked_add(ttl.num_seconds())
            .filter(|exp| DateTime::from_timestamp(*exp, 0).is_some())
            .ok_or(IssueError::TtlOutOfRange)?;

        let claims = WireClaims {
            sub: subject.to_string(),
            iat,
            exp,
            extra,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(IssueError::Signing)
    }

    fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let claims = parse_unverified(token)?;

        jsonwebtoken::decode::<Value>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            },
        )?;

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        let now = self.clock.now().timestamp();
        if now >= claims.exp.saturating_add(self.leeway_seconds) {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            issued_at,
            expires_at,
            claims: claims.extra,
        })
    }
}

/// Structural checks on header + claims, before any signature work.
/// Anything that fails here is `Malformed`; the signature segment is left to
/// the verifier so that a corrupted signature always reads as `SignatureInvalid`.
fn parse_unverified(token: &str) -> Result<WireClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, claims, _signature] = segments.as_slice() else {
        return Err(TokenError::Malformed);
    };
    if header.is_empty() || claims.is_empty() {
        return Err(TokenError::Malformed);
    }

    jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;

    let raw = URL_SAFE_NO_PAD
        .decode(claims)
        .map_err(|_| TokenError::Malformed)?;
    let claims: WireClaims = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    if claims.sub.trim().is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(claims)
}
