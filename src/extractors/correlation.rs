use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::middleware::correlation::CorrelationId;

/// Correlation id of the current request. Empty only when the correlation
/// stage is not installed.
#[derive(Debug, Clone)]
pub struct CurrentCorrelationId(pub Option<CorrelationId>);

impl CurrentCorrelationId {
    pub fn id(&self) -> Option<&CorrelationId> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentCorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentCorrelationId(
            parts.extensions.get::<CorrelationId>().cloned(),
        ))
    }
}
