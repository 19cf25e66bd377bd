use platform::Platform;

#[derive(Clone, Debug)]
pub struct AppState {
    pub platform: Platform,
    // Secure 属性付きで cookie を返すか (production のみ)
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(platform: Platform, secure_cookies: bool) -> Self {
        Self {
            platform,
            secure_cookies,
        }
    }
}
