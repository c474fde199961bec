use pushtalk_server::RelayMode;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

use crate::integration::{create_test_manager, init_tracing, open_connection, packet};

fn rotating() -> RelayMode {
    // long enough that the timer never fires during the test
    RelayMode::RotatingMute {
        interval: Duration::from_secs(3600),
    }
}

#[tokio::test]
async fn test_muted_connection_neither_speaks_nor_hears() {
    init_tracing();

    let (manager, engine) = create_test_manager(rotating());
    let (a_id, a) = open_connection(&manager, &engine).await;
    let (b_id, b) = open_connection(&manager, &engine).await;
    let (c_id, c) = open_connection(&manager, &engine).await;
    let sessions = [(a_id, a), (b_id, b), (c_id, c)];

    let fairness = manager.fairness().expect("no fairness scheduler").clone();
    let mut rng = StdRng::seed_from_u64(7);

    let rotation = fairness.rotate(&mut rng);
    assert_eq!(rotation.unmuted, None);
    let muted = rotation.muted.expect("someone should be muted");

    for (id, session) in &sessions {
        let expected = if *id == muted { 0 } else { 1 };
        assert_eq!(session.speak(packet(1)).await, expected, "{id}");
    }
    for (id, session) in &sessions {
        let heard = session.audio().len();
        if *id == muted {
            assert_eq!(heard, 0);
        } else {
            assert_eq!(heard, 1, "{id}");
        }
    }
}

#[tokio::test]
async fn test_rotation_moves_mute_to_someone_else() {
    init_tracing();

    let (manager, engine) = create_test_manager(rotating());
    for _ in 0..3 {
        open_connection(&manager, &engine).await;
    }
    let fairness = manager.fairness().unwrap().clone();
    let mut rng = StdRng::seed_from_u64(42);

    let mut previous = fairness.rotate(&mut rng).muted;
    for _ in 0..20 {
        let rotation = fairness.rotate(&mut rng);
        assert_eq!(rotation.unmuted, previous);
        assert!(rotation.muted.is_some());
        assert_ne!(rotation.muted, previous);
        assert_eq!(fairness.muted(), rotation.muted);
        previous = rotation.muted;
    }
}

#[tokio::test]
async fn test_nobody_muted_with_fewer_than_two() {
    init_tracing();

    let (manager, engine) = create_test_manager(rotating());
    let fairness = manager.fairness().unwrap().clone();
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(fairness.rotate(&mut rng).muted, None);

    let (id, _) = open_connection(&manager, &engine).await;
    assert_eq!(fairness.rotate(&mut rng).muted, None);
    assert!(!fairness.is_muted(&id));
}

#[tokio::test]
async fn test_removed_connection_is_unmuted() {
    init_tracing();

    let (manager, engine) = create_test_manager(rotating());
    open_connection(&manager, &engine).await;
    open_connection(&manager, &engine).await;
    let fairness = manager.fairness().unwrap().clone();

    let muted = fairness
        .rotate(&mut StdRng::seed_from_u64(3))
        .muted
        .unwrap();
    manager.close(&muted).await.unwrap();

    assert_eq!(fairness.muted(), None);
}

#[tokio::test(start_paused = true)]
async fn test_timer_rotates_periodically() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::RotatingMute {
        interval: Duration::from_secs(15),
    });
    open_connection(&manager, &engine).await;
    open_connection(&manager, &engine).await;
    let fairness = manager.fairness().unwrap().clone();

    assert_eq!(fairness.muted(), None);

    tokio::time::sleep(Duration::from_secs(16)).await;
    let first = fairness.muted();
    assert!(first.is_some());

    tokio::time::sleep(Duration::from_secs(15)).await;
    let second = fairness.muted();
    assert!(second.is_some());
    // with two connections the mute must alternate
    assert_ne!(first, second);

    manager.shutdown().await;
}
