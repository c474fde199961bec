use pushtalk_server::RelayMode;

use crate::integration::{create_test_manager, init_tracing, join, packet, wait_until};

#[tokio::test]
async fn test_only_speaker_is_relayed() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    let (alice, alice_session) = join(&manager, &engine, "Alice").await;
    let (_, bob_session) = join(&manager, &engine, "Bob").await;
    let (_, carol_session) = join(&manager, &engine, "Carol").await;

    // nobody holds the floor yet
    assert_eq!(alice_session.speak(packet(0)).await, 0);
    assert_eq!(bob_session.speak(packet(1)).await, 0);

    alice_session.say("speak_request_init|Alice").await;
    let gate = manager.speaker_gate().clone();
    assert!(wait_until(2000, || gate.current_speaker() == Some(alice.clone())).await);

    // listeners are still muted
    assert_eq!(bob_session.speak(packet(2)).await, 0);

    for seq in 3..8 {
        assert_eq!(alice_session.speak(packet(seq)).await, 2);
    }

    let expected: Vec<_> = (3..8).map(packet).collect();
    assert_eq!(bob_session.audio(), expected);
    assert_eq!(carol_session.audio(), expected);
    // never echoed back
    assert!(alice_session.audio().is_empty());

    alice_session.say("speak_request_finish|").await;
    assert!(wait_until(2000, || gate.current_speaker().is_none()).await);
    assert_eq!(alice_session.speak(packet(9)).await, 0);
    assert_eq!(bob_session.audio().len(), 5);
}
