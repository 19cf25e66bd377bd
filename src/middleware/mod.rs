/*
 * Responsibility
 * - middleware の公開インターフェース
 * - apply(): 全サービス共通の stage 順をここで固定する
 *
 *   correlation → error mapping → timeout → body limit → access log
 *     → authentication → policy → handler
 */
use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::platform::Platform;

pub mod auth;
pub mod correlation;
pub mod policy;

/// Wrap every route of `router` with the platform stages.
///
/// Apply this after all routes are registered; routes added later are not covered.
pub fn apply<S>(router: Router<S>, platform: &Platform) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let config = platform.config();

    let layers = ServiceBuilder::new()
        // Outermost: every response (timeouts and 401s included) carries the id,
        // and every log line below runs inside the request span.
        .layer(from_fn_with_state(
            platform.clone(),
            correlation::correlation_middleware,
        ))
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(DefaultBodyLimit::max(config.request_body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(
            platform.clone(),
            auth::authentication_middleware,
        ))
        .layer(from_fn_with_state(platform.clone(), policy::policy_middleware));

    router.layer(layers)
}
