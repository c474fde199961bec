mod api_error;
mod signaling_service;

pub use api_error::*;
pub use signaling_service::*;
