pub mod authenticator;
pub mod identity;
pub mod login;
pub mod password;
pub mod token;

pub use authenticator::{AuthFailure, Authenticator, TokenAuthenticator};
pub use identity::{InMemoryUserDirectory, LookupError, ResolvedIdentity, UserLookup, UserRecord};
pub use login::{IssuedToken, LoginError, LoginService};
pub use password::{Argon2PasswordVerifier, PasswordVerifier};
pub use token::{ExtraClaims, HmacTokenCodec, TokenCodec, TokenError, VerifiedToken};
