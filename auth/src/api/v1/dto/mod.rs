pub mod login_request;
pub mod me_response;
pub mod token_response;
