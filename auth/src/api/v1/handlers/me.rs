use axum::Json;
use platform::extractors::AuthenticatedUser;

use crate::api::v1::dto::me_response::MeResponse;

pub async fn me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        username: identity.username,
        roles: identity.roles.into_iter().collect(),
    })
}
