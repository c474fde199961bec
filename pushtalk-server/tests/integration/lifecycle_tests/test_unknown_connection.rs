use pushtalk_core::{ConnectionId, IceCandidate, SessionDescription};
use pushtalk_server::{RelayError, RelayMode};

use crate::integration::{create_test_manager, init_tracing};

#[tokio::test]
async fn test_unknown_connection_is_not_found() {
    init_tracing();

    let (manager, _engine) = create_test_manager(RelayMode::SpeakerGate);
    let unknown = ConnectionId::new();

    let err = manager
        .set_remote_description(&unknown, SessionDescription::answer("v=0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::NotFound(id) if id == unknown));

    let err = manager
        .add_ice_candidate(&unknown, IceCandidate::new("candidate:1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::NotFound(_)));

    let err = manager.get_ice_candidates(&unknown).unwrap_err();
    assert!(matches!(err, RelayError::NotFound(_)));

    let err = manager.close(&unknown).await.unwrap_err();
    assert!(matches!(err, RelayError::NotFound(_)));
}
