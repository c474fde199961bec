use pushtalk_core::IceCandidate;
use pushtalk_server::{ConnectionManager, GatheringState, ManagerConfig, RelayError, SessionEvent};
use std::sync::Arc;

use crate::integration::{init_tracing, wait_until};
use crate::utils::MockEngine;

#[tokio::test]
async fn test_candidates_not_ready_until_gathering_completes() {
    init_tracing();

    let engine = MockEngine::with_manual_gathering();
    let config = ManagerConfig {
        await_gathering: false,
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::new(Arc::new(engine.clone()), config);

    let (_, id) = manager.create_offer().await.expect("create_offer failed");
    let session = engine.session(&id);

    assert!(matches!(
        manager.get_ice_candidates(&id),
        Err(RelayError::NotReady(_))
    ));

    let first = IceCandidate::new("candidate:1 1 udp 2130706431 10.0.0.1 5001 typ host");
    let second = IceCandidate::new("candidate:2 1 udp 1694498815 203.0.113.7 5002 typ srflx");
    session
        .emit(SessionEvent::GatheringStateChanged(GatheringState::Gathering))
        .await;
    session.emit(SessionEvent::CandidateDiscovered(first.clone())).await;
    session.emit(SessionEvent::CandidateDiscovered(second.clone())).await;

    // still gathering
    assert!(wait_until(2000, || manager.candidates().get(&id).map(|c| c.len()) == Some(2)).await);
    assert!(matches!(
        manager.get_ice_candidates(&id),
        Err(RelayError::NotReady(_))
    ));

    session
        .emit(SessionEvent::GatheringStateChanged(GatheringState::Complete))
        .await;
    assert!(wait_until(2000, || manager.get_ice_candidates(&id).is_ok()).await);

    // discovery order is kept and reads are repeatable
    assert_eq!(manager.get_ice_candidates(&id).unwrap(), vec![first.clone(), second.clone()]);
    assert_eq!(manager.get_ice_candidates(&id).unwrap(), vec![first, second]);
}
