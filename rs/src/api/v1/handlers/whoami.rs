use axum::Json;
use platform::extractors::{AuthenticatedUser, CurrentCorrelationId};

use crate::api::v1::dto::whoami::WhoAmIResponse;

pub async fn whoami(
    AuthenticatedUser(identity): AuthenticatedUser,
    CurrentCorrelationId(correlation): CurrentCorrelationId,
) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        username: identity.username,
        roles: identity.roles.into_iter().collect(),
        correlation_id: correlation.map(|id| id.to_string()),
    })
}
