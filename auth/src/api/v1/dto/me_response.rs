use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub roles: Vec<String>,
}
