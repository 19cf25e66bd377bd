//! Path-based access policy (third stage).
//!
//! The table is consulted top to bottom; the first matching pattern decides.
//! Unmatched paths get the default requirement (Authenticated).
//!
//! Pattern syntax (segment-wise):
//! - `/auth/login`   literal
//! - `/users/*/info` `*` matches exactly one segment
//! - `/auth/**`      trailing `**` matches zero or more segments

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::{AppError, Rejection};
use crate::middleware::auth::access::AuthOutcome;
use crate::platform::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    open_ended: bool,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let mut parts: Vec<&str> = split(pattern).collect();
        let open_ended = parts.last() == Some(&"**");
        if open_ended {
            parts.pop();
        }

        let segments = parts
            .into_iter()
            .map(|p| match p {
                "*" => Segment::Any,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();

        Self {
            segments,
            open_ended,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        if parts.contains(&"..") {
            return false;
        }

        let len_ok = if self.open_ended {
            parts.len() >= self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };

        len_ok
            && self.segments.iter().zip(&parts).all(|(seg, part)| match seg {
                Segment::Any => true,
                Segment::Literal(lit) => lit == part,
            })
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    rules: Vec<(PathPattern, Requirement)>,
    default: Requirement,
}

impl Default for SecurityPolicy {
    /// Everything authenticated except `/health`.
    fn default() -> Self {
        Self::builder().public("/health").build()
    }
}

impl SecurityPolicy {
    pub fn builder() -> SecurityPolicyBuilder {
        SecurityPolicyBuilder::default()
    }

    pub fn requirement_for(&self, path: &str) -> Requirement {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, requirement)| *requirement)
            .unwrap_or(self.default)
    }

    /// Decide whether a request may reach its handler.
    pub fn decide(&self, path: &str, outcome: Option<&AuthOutcome>) -> Result<(), Rejection> {
        match self.requirement_for(path) {
            Requirement::Public => Ok(()),
            Requirement::Authenticated => match outcome {
                Some(AuthOutcome::Authenticated(_)) => Ok(()),
                Some(AuthOutcome::Rejected(_)) => Err(Rejection::InvalidCredentials),
                Some(AuthOutcome::Anonymous) | None => Err(Rejection::MissingCredentials),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct SecurityPolicyBuilder {
    rules: Vec<(PathPattern, Requirement)>,
}

impl SecurityPolicyBuilder {
    #[must_use]
    pub fn public(mut self, pattern: &str) -> Self {
        self.rules
            .push((PathPattern::parse(pattern), Requirement::Public));
        self
    }

    #[must_use]
    pub fn authenticated(mut self, pattern: &str) -> Self {
        self.rules
            .push((PathPattern::parse(pattern), Requirement::Authenticated));
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityPolicy {
        SecurityPolicy {
            rules: self.rules,
            default: Requirement::Authenticated,
        }
    }
}

pub async fn policy_middleware(
    State(platform): State<Platform>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if let Err(rejection) = platform
        .security_policy()
        .decide(path, req.extensions().get::<AuthOutcome>())
    {
        match rejection {
            Rejection::MissingCredentials => debug!(path = %path, "rejected: no credentials"),
            Rejection::InvalidCredentials => {
                warn!(path = %path, "rejected: invalid or expired credentials")
            }
        }
        return Err(AppError::Unauthenticated(rejection));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::services::auth::{AuthFailure, ResolvedIdentity, TokenError};

    fn policy() -> SecurityPolicy {
        SecurityPolicy::builder()
            .public("/health")
            .public("/auth/**")
            .authenticated("/docs/private/**")
            .public("/docs/*")
            .public("/docs/**")
            .build()
    }

    #[test]
    fn literal_patterns_match_exactly() {
        let p = PathPattern::parse("/auth/login");
        assert!(p.matches("/auth/login"));
        assert!(p.matches("/auth/login/"));
        assert!(!p.matches("/auth/login/extra"));
        assert!(!p.matches("/auth"));
    }

    #[test]
    fn wildcards_match_by_segment() {
        let one = PathPattern::parse("/users/*/info");
        assert!(one.matches("/users/42/info"));
        assert!(!one.matches("/users/info"));
        assert!(!one.matches("/users/1/2/info"));

        let rest = PathPattern::parse("/auth/**");
        assert!(rest.matches("/auth"));
        assert!(rest.matches("/auth/login"));
        assert!(rest.matches("/auth/a/b/c"));
        assert!(!rest.matches("/authx"));
    }

    #[test]
    fn dot_dot_segments_never_match() {
        assert!(!PathPattern::parse("/auth/**").matches("/auth/../api/v1/me"));
        assert_eq!(
            policy().requirement_for("/auth/../api/v1/me"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn first_matching_rule_wins_and_default_is_authenticated() {
        let p = policy();
        assert_eq!(p.requirement_for("/health"), Requirement::Public);
        assert_eq!(p.requirement_for("/docs/private/x"), Requirement::Authenticated);
        assert_eq!(p.requirement_for("/docs/public"), Requirement::Public);
        assert_eq!(p.requirement_for("/api/v1/me"), Requirement::Authenticated);
        assert_eq!(p.requirement_for("/"), Requirement::Authenticated);
    }

    #[test]
    fn decide_distinguishes_missing_from_invalid_credentials() {
        let p = policy();
        let alice = AuthOutcome::Authenticated(ResolvedIdentity {
            username: "alice".into(),
            roles: BTreeSet::new(),
            enabled: true,
        });
        let expired = AuthOutcome::Rejected(AuthFailure::Token(TokenError::Expired));

        assert_eq!(p.decide("/health", None), Ok(()));
        assert_eq!(p.decide("/health", Some(&expired)), Ok(()));
        assert_eq!(p.decide("/api/v1/me", Some(&alice)), Ok(()));
        assert_eq!(
            p.decide("/api/v1/me", None),
            Err(Rejection::MissingCredentials)
        );
        assert_eq!(
            p.decide("/api/v1/me", Some(&AuthOutcome::Anonymous)),
            Err(Rejection::MissingCredentials)
        );
        assert_eq!(
            p.decide("/api/v1/me", Some(&expired)),
            Err(Rejection::InvalidCredentials)
        );
    }

    #[test]
    fn default_policy_only_exposes_health() {
        let p = SecurityPolicy::default();
        assert_eq!(p.requirement_for("/health"), Requirement::Public);
        assert_eq!(p.requirement_for("/auth/login"), Requirement::Authenticated);
    }
}
