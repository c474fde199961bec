use futures::future::join_all;
use pushtalk_server::RelayMode;
use std::time::Duration;

use crate::integration::{create_test_manager, init_tracing, join, wait_until};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_speak_requests_grant_one() {
    init_tracing();

    let (manager, engine) = create_test_manager(RelayMode::SpeakerGate);
    let mut clients = Vec::new();
    for n in 0..6 {
        clients.push(join(&manager, &engine, &format!("user{n}")).await);
    }

    join_all(
        clients
            .iter()
            .enumerate()
            .map(|(n, (_, session))| {
                let text = format!("speak_request_init|user{n}");
                async move { session.say(&text).await }
            }),
    )
    .await;

    // every client hears exactly one grant, every loser gets its own refusal
    assert!(
        wait_until(3000, || clients.iter().all(|(_, s)| {
            s.texts().iter().any(|t| t == "ok|speak_request_init")
        }))
        .await
    );
    let gate = manager.speaker_gate().clone();
    let winner = gate.current_speaker().expect("nobody got the floor");
    assert!(
        wait_until(3000, || clients
            .iter()
            .filter(|(_, s)| s.texts().iter().any(|t| t == "nok|speak_request_init"))
            .count()
            == clients.len() - 1)
        .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    for (id, session) in &clients {
        let texts = session.texts();
        let grants = texts.iter().filter(|t| *t == "ok|speak_request_init").count();
        let refusals = texts.iter().filter(|t| *t == "nok|speak_request_init").count();
        assert_eq!(grants, 1, "{id} saw {texts:?}");
        assert_eq!(refusals, usize::from(*id != winner), "{id} saw {texts:?}");
    }
    assert_eq!(gate.current_speaker(), Some(winner));
}
