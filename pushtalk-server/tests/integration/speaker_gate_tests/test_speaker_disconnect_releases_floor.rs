use pushtalk_server::{ConnectionState, RelayMode, SessionEvent};

use crate::integration::{create_test_manager, init_tracing, join, wait_until};

#[tokio::test]
async fn test_speaker_disconnect_releases_floor() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    let (alice, alice_session) = join(&manager, &engine, "Alice").await;
    let (_, bob_session) = join(&manager, &engine, "Bob").await;

    alice_session.say("speak_request_init|Alice").await;
    assert!(bob_session.wait_for_texts(2, 2000).await);
    bob_session.clear_texts();

    alice_session
        .emit(SessionEvent::ConnectionStateChanged(ConnectionState::Failed))
        .await;

    assert!(wait_until(2000, || alice_session.is_closed()).await);
    assert!(!manager.contains(&alice));
    assert_eq!(manager.speaker_gate().current_speaker(), None);

    assert!(bob_session.wait_for_texts(1, 2000).await);
    assert_eq!(bob_session.texts(), vec!["ok|speak_request_finish".to_owned()]);
    bob_session.clear_texts();

    bob_session.say("speak_request_init|Bob").await;
    assert!(bob_session.wait_for_texts(2, 2000).await);
    assert_eq!(
        bob_session.texts(),
        vec!["ok|speak_request_init".to_owned(), "speaking|Bob".to_owned()]
    );
}

#[tokio::test]
async fn test_listener_disconnect_keeps_floor() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    let (alice, alice_session) = join(&manager, &engine, "Alice").await;
    let (_, bob_session) = join(&manager, &engine, "Bob").await;

    alice_session.say("speak_request_init|Alice").await;
    assert!(alice_session.wait_for_texts(2, 2000).await);
    alice_session.clear_texts();

    bob_session
        .emit(SessionEvent::ConnectionStateChanged(ConnectionState::Closed))
        .await;
    assert!(wait_until(2000, || bob_session.is_closed()).await);

    assert_eq!(manager.speaker_gate().current_speaker(), Some(alice));
    assert!(alice_session.texts().is_empty());
}
