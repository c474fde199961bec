mod audio_relay;
mod fairness_scheduler;
mod relay_policy;

pub use audio_relay::*;
pub use fairness_scheduler::*;
pub use relay_policy::*;
