/*
 * Responsibility
 * - Platform-wide AppError shared by every service
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - Login / downstream errors are converted here so handlers stay thin
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::LoginError;
use crate::services::downstream::DownstreamError;

/// Why the policy stage refused a request. Both render the same response;
/// the split exists for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingCredentials,
    InvalidCredentials,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized")]
    Unauthenticated(Rejection),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("user not found")]
    UserNotFound,

    #[error("upstream service error")]
    Upstream,

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AppError::Upstream => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };

        let body = ErrorResponseBody {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        let mut res = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::UserNotFound => AppError::UserNotFound,
            LoginError::CredentialsInvalid => AppError::InvalidCredentials,
            LoginError::UserDisabled => AppError::Forbidden,
            LoginError::Lookup(err) => {
                tracing::error!(error = %err, "user lookup failed during login");
                AppError::Internal
            }
            LoginError::Issue(err) => {
                tracing::error!(error = %err, "failed to issue token");
                AppError::Internal
            }
        }
    }
}

impl From<DownstreamError> for AppError {
    fn from(e: DownstreamError) -> Self {
        tracing::warn!(error = %e, "downstream call failed");
        match e {
            DownstreamError::InvalidUrl(_) => AppError::Internal,
            _ => AppError::Upstream,
        }
    }
}
