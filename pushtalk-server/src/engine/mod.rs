mod session;
mod session_event;
mod webrtc_engine;

pub use session::*;
pub use session_event::*;
pub use webrtc_engine::*;
