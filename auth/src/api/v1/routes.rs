use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{login::login, me::me};
use crate::state::AppState;

/// Mounted under `/auth` (public)
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Mounted under `/api/v1` (authenticated)
pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
