/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (Platform / ServiceClient とも中身は Arc)
 */
use platform::Platform;
use platform::services::downstream::ServiceClient;

#[derive(Clone, Debug)]
pub struct AppState {
    pub platform: Platform,
    pub auth_client: ServiceClient,
}

impl AppState {
    pub fn new(platform: Platform, auth_client: ServiceClient) -> Self {
        Self {
            platform,
            auth_client,
        }
    }
}
