/*
 * Responsibility
 * - Config読み込み → Platform 生成 (correlation id source を上書き) → Router 組み立て
 * - 共通 middleware の適用
 * - axum::serve() で起動
 */
use std::sync::Arc;

use axum::{Router, routing::get};
use platform::middleware::{self, policy::SecurityPolicy};
use platform::services::auth::{InMemoryUserDirectory, UserLookup};
use platform::{Platform, PlatformConfig, PlatformError, telemetry};

use crate::api;
use crate::config::Config;
use crate::services::correlation::PrefixedCorrelationIdSource;
use crate::state::AppState;

pub async fn run() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.platform.app_env.is_production();
    telemetry::init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting resource-server in {:?} mode on {}",
        config.platform.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let users = InMemoryUserDirectory::from_file(&config.user_directory_path)?;
    tracing::info!(users = users.len(), "user directory loaded");

    let platform = build_platform(
        config.platform.clone(),
        Arc::new(users),
        &config.correlation_id_prefix,
    )?;
    let auth_client =
        platform.service_client(config.auth_service_url.as_str(), config.downstream_timeout)?;
    tracing::info!(auth_service = %auth_client.base_url(), "downstream client ready");

    Ok(AppState::new(platform, auth_client))
}

fn build_platform(
    config: PlatformConfig,
    users: Arc<dyn UserLookup>,
    correlation_id_prefix: &str,
) -> Result<Platform, PlatformError> {
    Platform::builder(config, users)
        .correlation_ids(Arc::new(PrefixedCorrelationIdSource::new(
            correlation_id_prefix,
        )))
        .security_policy(SecurityPolicy::builder().public("/health").build())
        .build()
}

fn build_router(state: AppState) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let platform = state.platform.clone();
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::apply(router, &platform)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{HeaderMap, Request, Response, StatusCode, header};
    use axum::{Json, extract::State as AxumState};
    use chrono::Duration as TokenTtl;
    use http_body_util::BodyExt;
    use platform::services::auth::{ExtraClaims, UserRecord};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "resource-server-test-secret-0123456789ab";

    /// What the stub auth service saw: (authorization, correlation id).
    type Seen = Arc<Mutex<Vec<(Option<String>, Option<String>)>>>;

    async fn stub_me(AxumState(seen): AxumState<Seen>, headers: HeaderMap) -> Json<Value> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        seen.lock()
            .unwrap()
            .push((get("authorization"), get("x-correlation-id")));
        Json(json!({ "username": "alice", "roles": ["ROLE_USER"] }))
    }

    async fn spawn_auth_stub(seen: Seen) -> String {
        let stub = Router::new()
            .route("/api/v1/me", get(stub_me))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, stub).await });
        format!("http://{addr}/")
    }

    async fn app(seen: Seen) -> (Router, String) {
        let users = InMemoryUserDirectory::new([UserRecord {
            username: "alice".to_string(),
            password_hash: "unused".to_string(),
            roles: BTreeSet::from(["ROLE_USER".to_string()]),
            enabled: true,
        }])
        .unwrap();
        let platform =
            build_platform(PlatformConfig::with_secret(SECRET), Arc::new(users), "rs").unwrap();
        let token = platform
            .token_codec()
            .issue("alice", ExtraClaims::new(), TokenTtl::minutes(5))
            .unwrap();

        let base = spawn_auth_stub(seen).await;
        let client = platform
            .service_client(&base, Duration::from_secs(5))
            .unwrap();

        (build_router(AppState::new(platform, client)), token)
    }

    async fn json_body(res: Response<Body>) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn profile_forwards_token_and_correlation_id() {
        let seen: Seen = Arc::default();
        let (app, token) = app(seen.clone()).await;

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header("x-correlation-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["correlation_id"], "abc-123");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Some(format!("Bearer {token}")));
        assert_eq!(seen[0].1.as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn generated_ids_use_the_service_prefix() {
        let seen: Seen = Arc::default();
        let (app, token) = app(seen.clone()).await;

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .header(header::COOKIE, format!("token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let echoed = res
            .headers()
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(echoed.starts_with("rs-"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1.as_deref(), Some(echoed.as_str()));
    }

    #[tokio::test]
    async fn whoami_is_local_and_protected() {
        let seen: Seen = Arc::default();
        let (app, token) = app(seen.clone()).await;

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["roles"], json!(["ROLE_USER"]));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_auth_service_is_a_bad_gateway() {
        let users = InMemoryUserDirectory::new([UserRecord {
            username: "alice".to_string(),
            password_hash: "unused".to_string(),
            roles: BTreeSet::new(),
            enabled: true,
        }])
        .unwrap();
        let platform =
            build_platform(PlatformConfig::with_secret(SECRET), Arc::new(users), "rs").unwrap();
        let token = platform
            .token_codec()
            .issue("alice", ExtraClaims::new(), TokenTtl::minutes(5))
            .unwrap();
        // Port 9 (discard) on localhost: nothing listens there in CI
        let client = platform
            .service_client("http://127.0.0.1:9/", Duration::from_secs(1))
            .unwrap();
        let app = build_router(AppState::new(platform, client));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
