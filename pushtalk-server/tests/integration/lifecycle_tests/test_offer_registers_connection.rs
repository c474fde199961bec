use pushtalk_core::{IceCandidate, SdpKind};
use pushtalk_server::{RelayMode, SignalingState};

use crate::integration::{create_test_manager, init_tracing};
use crate::utils::MOCK_OFFER_SDP;

#[tokio::test]
async fn test_offer_registers_connection() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);

    let (offer, id) = manager.create_offer().await.expect("create_offer failed");

    assert_eq!(offer.kind, SdpKind::Offer);
    assert_eq!(offer.sdp, MOCK_OFFER_SDP);
    assert!(manager.contains(&id));
    assert_eq!(manager.connection_ids(), vec![id.clone()]);
    assert_eq!(manager.signaling_state(&id), Some(SignalingState::HaveLocalOffer));

    // gathering already finished inside create_offer
    let candidates = manager.get_ice_candidates(&id).expect("candidates not ready");
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].candidate.contains("typ host"));

    // a second offer gets a fresh identifier
    let (_, other) = manager.create_offer().await.expect("create_offer failed");
    assert_ne!(id, other);
    assert_eq!(engine.opened(), 2);

    manager
        .add_ice_candidate(&id, IceCandidate::new("candidate:2 1 udp 1 10.0.0.2 4000 typ host"))
        .await
        .expect("add_ice_candidate failed");
    assert_eq!(engine.session(&id).remote_candidates().len(), 1);
}
