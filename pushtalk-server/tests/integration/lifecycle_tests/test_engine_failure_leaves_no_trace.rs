use pushtalk_server::{RelayError, RelayMode};

use crate::integration::{create_test_manager, init_tracing};

#[tokio::test]
async fn test_open_failure_leaves_no_trace() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    engine.set_fail_open(true);

    let err = manager.create_offer().await.unwrap_err();
    assert!(matches!(err, RelayError::EngineFailure(_)));
    assert!(manager.connection_ids().is_empty());

    // the manager keeps working once the engine recovers
    engine.set_fail_open(false);
    let (_, id) = manager.create_offer().await.expect("create_offer failed");
    assert!(manager.contains(&id));
}

#[tokio::test]
async fn test_offer_failure_closes_session() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    engine.set_fail_offer(true);

    let err = manager.create_offer().await.unwrap_err();
    assert!(matches!(err, RelayError::EngineFailure(_)));
    assert!(manager.connection_ids().is_empty());
    assert_eq!(engine.opened(), 1);
}
