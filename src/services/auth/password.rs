//! Password verification capability (default: Argon2 PHC strings).

use argon2::{Argon2, PasswordHash, PasswordVerifier as _};
use tracing::warn;

pub trait PasswordVerifier: Send + Sync {
    /// `true` only when `plain` matches `hash`. Unparseable hashes never match.
    fn verify_password(&self, plain: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordVerifier;

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify_password(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}
