/*
 * Responsibility
 * - tracing subscriber 初期化 (RUST_LOG / EnvFilter + fmt)
 * - panic を tracing 経由で出す hook
 */
use std::{panic, process};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, first thing in `main`.
///
/// RUST_LOG=info,platform=debug,tower_http=debug cargo run -p auth
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Route panics through tracing. In development abort right away so they get noticed;
/// otherwise fall back to the default hook and keep serving.
pub fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // The request span (and its correlation_id) is still current here.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}
