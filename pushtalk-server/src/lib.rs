pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod registry;
pub mod relay;
pub mod signaling;

pub use config::*;
pub use engine::*;
pub use error::{RelayError, Result};
pub use gate::*;
pub use lifecycle::*;
pub use registry::*;
pub use relay::*;
pub use signaling::*;

pub use pushtalk_core::{
    AudioPacket, ConnectionId, ControlMessage, ControlParseError, IceCandidate, IceServerConfig,
    OutboundMessage, SdpKind, SessionDescription,
};
