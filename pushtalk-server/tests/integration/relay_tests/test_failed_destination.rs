use pushtalk_server::RelayMode;

use crate::integration::{create_test_manager, init_tracing, open_connection, packet};

#[tokio::test]
async fn test_failed_destination_does_not_block_others() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::Open);
    let (_, speaker) = open_connection(&manager, &engine).await;
    let (broken_id, broken) = open_connection(&manager, &engine).await;
    let (_, healthy) = open_connection(&manager, &engine).await;

    broken.set_fail_audio(true);

    assert_eq!(speaker.speak(packet(1)).await, 1);
    assert_eq!(speaker.speak(packet(2)).await, 1);

    assert_eq!(healthy.audio(), vec![packet(1), packet(2)]);
    assert!(broken.audio().is_empty());
    // a broken audio track does not end the connection
    assert!(manager.contains(&broken_id));

    broken.set_fail_audio(false);
    assert_eq!(speaker.speak(packet(3)).await, 2);
    assert_eq!(broken.audio(), vec![packet(3)]);
}
