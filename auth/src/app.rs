/*
 * Responsibility
 * - Config読み込み → Platform 生成 → Router 組み立て
 * - 共通 middleware (correlation / auth / policy) の適用
 * - axum::serve() で起動
 */
use std::sync::Arc;

use axum::{Router, routing::get};
use platform::middleware::{self, policy::SecurityPolicy};
use platform::services::auth::{InMemoryUserDirectory, UserLookup};
use platform::{Platform, telemetry};

use crate::api;
use crate::config::Config;
use crate::state::AppState;

pub async fn run() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.platform.app_env.is_production();
    telemetry::init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting auth in {:?} mode on {}",
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
    tracing::info!(
        users = users.len(),
        path = %config.user_directory_path.display(),
        "user directory loaded"
    );

    let platform = build_platform(config.platform.clone(), Arc::new(users))?;
    Ok(AppState::new(platform, config.platform.app_env.is_production()))
}

fn build_platform(
    config: platform::PlatformConfig,
    users: Arc<dyn UserLookup>,
) -> Result<Platform, platform::PlatformError> {
    Platform::builder(config, users)
        .security_policy(security_policy())
        .build()
}

fn security_policy() -> SecurityPolicy {
    SecurityPolicy::builder()
        .public("/health")
        .public("/auth/login")
        .build()
}

fn build_router(state: AppState) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let platform = state.platform.clone();
    let router = Router::new()
        .route("/health", get(health))
        .nest("/auth", api::v1::login_routes())
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::apply(router, &platform)
}
