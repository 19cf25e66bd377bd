pub mod dto;
pub mod handlers;
mod routes;

pub use routes::{login_routes, routes};
