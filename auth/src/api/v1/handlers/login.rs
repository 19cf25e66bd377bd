use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use platform::AppError;

use crate::api::v1::dto::{login_request::LoginRequest, token_response::TokenResponse};
use crate::state::AppState;

/// Check credentials and hand out a token, both in the body and as an
/// HttpOnly cookie for browser clients.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidRequest(
            "username and password are required".to_string(),
        ));
    }

    let issued = state
        .platform
        .login_service()
        .login(username, &req.password)
        .await?;

    let cookie = Cookie::build((
        state.platform.auth_cookie_name().to_string(),
        issued.access_token.clone(),
    ))
    .http_only(true)
    .secure(state.secure_cookies)
    .same_site(SameSite::Lax)
    .path("/")
    .build();

    Ok((
        jar.add(cookie),
        Json(TokenResponse {
            access_token: issued.access_token,
            token_type: issued.token_type.to_string(),
            expires_in: issued.expires_in,
        }),
    ))
}
