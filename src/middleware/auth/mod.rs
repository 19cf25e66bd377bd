pub mod access;

pub use access::{AuthOutcome, authentication_middleware, extract_token};
