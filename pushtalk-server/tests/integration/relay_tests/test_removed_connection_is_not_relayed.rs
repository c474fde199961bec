use pushtalk_server::RelayMode;

use crate::integration::{create_test_manager, init_tracing, open_connection, packet};

#[tokio::test]
async fn test_removed_connection_is_not_relayed() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::Open);
    let (_, a) = open_connection(&manager, &engine).await;
    let (b_id, b) = open_connection(&manager, &engine).await;
    let (_, c) = open_connection(&manager, &engine).await;

    manager.close(&b_id).await.unwrap();

    // packets still in flight from a removed connection are dropped
    assert_eq!(b.speak(packet(1)).await, 0);
    assert!(a.audio().is_empty());
    assert!(c.audio().is_empty());

    // and it is no longer a destination
    assert_eq!(a.speak(packet(2)).await, 1);
    assert!(b.audio().is_empty());
    assert_eq!(c.audio(), vec![packet(2)]);
    assert!(manager.relay().destinations(&b_id).is_empty());
}
