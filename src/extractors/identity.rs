use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{AppError, Rejection};
use crate::services::auth::ResolvedIdentity;

/// Identity of the caller, if the authentication stage resolved one.
/// Use on public routes that behave differently for signed-in users.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<ResolvedIdentity>);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(
            parts.extensions.get::<ResolvedIdentity>().cloned(),
        ))
    }
}

/// Handler で認証済み identity を受け取るための extractor
/// policy stage を通っていれば必ず存在する。見つからない場合は 401
/// (route が public 指定されている / middleware 未設定)
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub ResolvedIdentity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedIdentity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthenticated(Rejection::MissingCredentials))
    }
}
