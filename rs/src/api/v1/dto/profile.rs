/*
 * Responsibility
 * - auth サービスの `/api/v1/me` 応答 (受信側)
 * - 自サービスの `/api/v1/profile` 応答
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AuthMe {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    /// Roles as the auth service reports them
    pub roles: Vec<String>,
    pub correlation_id: Option<String>,
}
