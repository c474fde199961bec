mod audio;
mod connection;
mod control;
mod signaling;

pub use audio::AudioPacket;
pub use connection::ConnectionId;
pub use control::{ControlMessage, ControlParseError, OutboundMessage};
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
