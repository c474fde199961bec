mod test_failed_destination;
mod test_removed_connection_is_not_relayed;
mod test_rotating_mute;
mod test_speaker_gate_relay;
