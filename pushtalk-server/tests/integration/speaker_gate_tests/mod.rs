mod test_concurrent_speak_requests;
mod test_speaker_disconnect_releases_floor;
