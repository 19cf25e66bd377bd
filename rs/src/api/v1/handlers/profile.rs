use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use platform::extractors::{AuthenticatedUser, CurrentCorrelationId};
use platform::middleware::auth::extract_token;
use platform::services::downstream::send_json;
use platform::{AppError, Rejection};

use crate::api::v1::dto::profile::{AuthMe, ProfileResponse};
use crate::state::AppState;

/// Ask the auth service about the caller, forwarding their token and this
/// request's correlation id.
pub async fn profile(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    CurrentCorrelationId(correlation): CurrentCorrelationId,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, AppError> {
    let token = extract_token(&headers, state.platform.auth_cookie_name())
        .ok_or(AppError::Unauthenticated(Rejection::MissingCredentials))?;

    let request = state
        .auth_client
        .get("/api/v1/me", correlation.as_ref())?
        .bearer_auth(token);
    let me: AuthMe = send_json(request).await?;

    if me.username != identity.username {
        tracing::warn!(
            local = %identity.username,
            upstream = %me.username,
            "auth service resolved a different user"
        );
        return Err(AppError::Upstream);
    }

    Ok(Json(ProfileResponse {
        username: me.username,
        roles: me.roles,
        correlation_id: correlation.map(|id| id.to_string()),
    }))
}
