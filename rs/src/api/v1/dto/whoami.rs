use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub correlation_id: Option<String>,
}
