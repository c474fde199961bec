mod engine_config;
mod manager_config;
mod server_config;

pub use engine_config::*;
pub use manager_config::*;
pub use server_config::*;
