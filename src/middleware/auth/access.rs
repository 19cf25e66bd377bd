//! access token 検証 → ResolvedIdentity を extensions に入れる
//!
//! This stage is advisory: it never rejects. It records an [`AuthOutcome`] for
//! the policy stage and, on success, the [`ResolvedIdentity`] for handlers.
//!
//! Token sources, in order:
//! - `Authorization: Bearer <token>`
//! - the configured cookie (default `token`)

use std::panic::AssertUnwindSafe;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::platform::Platform;
use crate::services::auth::{AuthFailure, ResolvedIdentity, TokenError};

/// What the authentication stage concluded for this request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// No credentials were presented.
    Anonymous,
    Authenticated(ResolvedIdentity),
    /// Credentials were presented but did not produce an identity.
    Rejected(AuthFailure),
}

impl AuthOutcome {
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            AuthOutcome::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Pull the candidate token: bearer header first, cookie second.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn authentication_middleware(
    State(platform): State<Platform>,
    mut req: Request,
    next: Next,
) -> Response {
    let outcome = match extract_token(req.headers(), platform.auth_cookie_name()) {
        None => AuthOutcome::Anonymous,
        Some(token) => {
            // A panicking lookup must not take the request (or a public route) down.
            let attempt = AssertUnwindSafe(platform.authenticator().authenticate(&token))
                .catch_unwind()
                .await
                .unwrap_or(Err(AuthFailure::Internal));

            match attempt {
                Ok(identity) => {
                    debug!(username = %identity.username, "request authenticated");
                    AuthOutcome::Authenticated(identity)
                }
                Err(failure) => {
                    log_failure(&failure);
                    AuthOutcome::Rejected(failure)
                }
            }
        }
    };

    // middleware → extractor への受け渡し
    if let Some(identity) = outcome.identity() {
        req.extensions_mut().insert(identity.clone());
    }
    req.extensions_mut().insert(outcome);

    next.run(req).await
}

fn log_failure(failure: &AuthFailure) {
    match failure {
        AuthFailure::Token(TokenError::Malformed) => {
            warn!("malformed access token");
        }
        AuthFailure::Token(TokenError::SignatureInvalid) => {
            warn!(suspected_tampering = true, "access token signature invalid");
        }
        AuthFailure::Token(TokenError::Expired) => {
            debug!("access token expired");
        }
        AuthFailure::UserNotFound | AuthFailure::UserDisabled => {
            info!(reason = %failure, "token subject is not an active user");
        }
        AuthFailure::Lookup(err) => {
            error!(error = %err, "user lookup failed during authentication");
        }
        AuthFailure::Internal => {
            error!("authenticator panicked; request continues unauthenticated");
        }
    }
}
