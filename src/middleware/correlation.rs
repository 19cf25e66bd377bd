//! Correlation-id stage (always the outermost per-request stage).
//!
//! - Reuse the inbound `X-Correlation-Id` when it is usable, otherwise generate one
//! - Put it in the request extensions and on the request span, so handlers and
//!   every log line inside the request can see it without it being passed around
//! - Echo it on the response
//!
//! Nothing is stored outside the request: extensions and span are dropped with
//! the request future, whether it completes, errors or is aborted.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::platform::Platform;

/// Longest inbound id we accept; longer values are replaced.
pub const MAX_CORRELATION_ID_LEN: usize = 128;

/// Trace identifier for one inbound request (and the calls it triggers).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Accepts visible ASCII only, up to [`MAX_CORRELATION_ID_LEN`] chars, after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_CORRELATION_ID_LEN
            || !trimmed.bytes().all(|b| b.is_ascii_graphic())
        {
            return None;
        }
        Some(Self(Arc::from(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_header_value(&self) -> HeaderValue {
        // parse() / sources only admit visible ASCII
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates ids for requests that arrive without one.
pub trait CorrelationIdSource: Send + Sync {
    fn generate(&self) -> CorrelationId;
}

/// Random UUIDv4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCorrelationIdSource;

impl CorrelationIdSource for UuidCorrelationIdSource {
    fn generate(&self) -> CorrelationId {
        CorrelationId(Arc::from(Uuid::new_v4().to_string()))
    }
}

/// Effective id for a request: the inbound header if usable, else a fresh one.
pub fn resolve(
    headers: &HeaderMap,
    header: &HeaderName,
    source: &dyn CorrelationIdSource,
) -> CorrelationId {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .and_then(CorrelationId::parse)
        .unwrap_or_else(|| source.generate())
}

pub async fn correlation_middleware(
    State(platform): State<Platform>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = platform.correlation_header().clone();
    let id = resolve(req.headers(), &header, platform.correlation_ids());
    let value = id.to_header_value();

    // Downstream stages see the effective id both ways.
    req.headers_mut().insert(header.clone(), value.clone());
    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut res = next.run(req).instrument(span).await;
    res.headers_mut().insert(header, value);
    res
}
