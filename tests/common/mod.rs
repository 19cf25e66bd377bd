#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    body::Body,
    http::{Request, Response},
    routing::get,
};
use http_body_util::BodyExt;
use platform::extractors::{AuthenticatedUser, CurrentCorrelationId, CurrentIdentity};
use platform::middleware::{self, policy::SecurityPolicy};
use platform::services::auth::{InMemoryUserDirectory, UserLookup, UserRecord};
use platform::{Platform, PlatformBuilder, PlatformConfig};
use serde_json::{Value, json};

pub const SECRET: &str = "test-secret-test-secret-test-secret-0123";

pub fn user(name: &str, enabled: bool) -> UserRecord {
    UserRecord {
        username: name.to_string(),
        password_hash: "unused".to_string(),
        roles: BTreeSet::from(["ROLE_USER".to_string()]),
        enabled,
    }
}

pub fn users() -> Arc<dyn UserLookup> {
    Arc::new(
        InMemoryUserDirectory::new([
            user("alice", true),
            user("bob", true),
            user("mallory", false),
        ])
        .expect("fixture users are unique"),
    )
}

pub fn policy() -> SecurityPolicy {
    SecurityPolicy::builder()
        .public("/health")
        .public("/public/**")
        .build()
}

pub fn builder() -> PlatformBuilder {
    Platform::builder(PlatformConfig::with_secret(SECRET), users()).security_policy(policy())
}

/// Identity + correlation id as a handler sees them.
async fn observe(identity: Option<String>, correlation: Option<String>) -> Json<Value> {
    // Give other in-flight requests a chance to run on the same worker.
    tokio::task::yield_now().await;
    Json(json!({ "username": identity, "correlation_id": correlation }))
}

pub fn app(platform: &Platform) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/public/echo",
            get(
                |CurrentIdentity(identity): CurrentIdentity,
                 CurrentCorrelationId(id): CurrentCorrelationId| async move {
                    observe(
                        identity.map(|i| i.username),
                        id.map(|i| i.to_string()),
                    )
                    .await
                },
            ),
        )
        .route(
            "/api/v1/me",
            get(
                |AuthenticatedUser(user): AuthenticatedUser,
                 CurrentCorrelationId(id): CurrentCorrelationId| async move {
                    observe(Some(user.username), id.map(|i| i.to_string())).await
                },
            ),
        )
        .route(
            "/api/v1/slow",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                "too late"
            }),
        );

    middleware::apply(router, platform)
}

pub fn request(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub fn empty(builder: axum::http::request::Builder) -> Result<Request<Body>> {
    Ok(builder.body(Body::empty())?)
}

pub async fn body_json(res: Response<Body>) -> Result<Value> {
    let bytes = res.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn header<'a>(res: &'a Response<Body>, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}
