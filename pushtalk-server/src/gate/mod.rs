mod speaker_gate;
mod speaker_state;

pub use speaker_gate::*;
pub use speaker_state::*;
