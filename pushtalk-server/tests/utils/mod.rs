
pub use mock_engine::*;
pub use signal_helpers::*;
pub use test_client::*;
