mod candidate_store;
mod connection_registry;

pub use candidate_store::*;
pub use connection_registry::*;
