//! Outbound HTTP client for service-to-service calls.
//!
//! Every request built here carries the caller's correlation id (when there is
//! one) so the downstream service logs under the same id. Requests made outside
//! an inbound request (background jobs) pass `None` and get no header.

use std::time::Duration;

use reqwest::header::HeaderName;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::middleware::correlation::CorrelationId;

#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    #[error("invalid downstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("downstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("downstream responded with {0}")]
    Status(StatusCode),
}

#[derive(Clone, Debug)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: Url,
    correlation_header: HeaderName,
}

impl ServiceClient {
    pub fn new(
        base_url: &str,
        correlation_header: HeaderName,
        timeout: Duration,
    ) -> Result<Self, DownstreamError> {
        let mut base_url = Url::parse(base_url)?;
        // `join` replaces the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            correlation_header,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a request to `path` with the correlation header attached.
    ///
    /// `path` is always relative to the base URL, leading '/' or not:
    /// base `http://gw/auth/` + `/api/v1/me` is `http://gw/auth/api/v1/me`.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        correlation: Option<&CorrelationId>,
    ) -> Result<RequestBuilder, DownstreamError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        debug!(
            method = %method,
            url = %url,
            correlation_id = correlation.map(CorrelationId::as_str),
            "outbound request"
        );

        let builder = self.http.request(method, url);
        Ok(propagate(builder, &self.correlation_header, correlation))
    }

    pub fn get(
        &self,
        path: &str,
        correlation: Option<&CorrelationId>,
    ) -> Result<RequestBuilder, DownstreamError> {
        self.request(Method::GET, path, correlation)
    }
}

/// Attach the correlation header to an outbound request, if there is an id.
pub fn propagate(
    builder: RequestBuilder,
    header: &HeaderName,
    correlation: Option<&CorrelationId>,
) -> RequestBuilder {
    match correlation {
        Some(id) => builder.header(header.clone(), id.to_header_value()),
        None => builder,
    }
}

/// Send and decode a JSON body; non-2xx statuses become `DownstreamError::Status`.
pub async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, DownstreamError> {
    let res = builder.send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(DownstreamError::Status(status));
    }
    Ok(res.json::<T>().await?)
}
