pub mod profile;
pub mod whoami;
