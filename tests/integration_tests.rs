// Integration tests for Flirt Relay

use flirt_relay::core::notices;
use flirt_relay::{
    compatible, Dispatcher, InMemoryTransport, LeaveOutcome, MatchOutcome, PairingEngine, Profile,
    ProfileDialog, UserId,
};
use std::sync::Arc;
use std::time::Duration;

fn create_profile(gender: &str, preference: &str) -> Profile {
    Profile::new("25", gender, preference, "Somewhere")
}

fn create_dispatcher() -> (Dispatcher, Arc<InMemoryTransport>) {
    let transport = Arc::new(InMemoryTransport::new());
    let dispatcher = Dispatcher::new(
        PairingEngine::new(),
        ProfileDialog::new(1000, Duration::from_secs(60)),
        transport.clone(),
    );
    (dispatcher, transport)
}

#[tokio::test]
async fn test_waiting_then_connected_scenario() {
    let (dispatcher, transport) = create_dispatcher();
    dispatcher.submit_profile(1, create_profile("male", "female")).await.unwrap();
    dispatcher.submit_profile(2, create_profile("female", "male")).await.unwrap();

    dispatcher.handle(1, "/find").await;
    assert_eq!(transport.take(1).await, vec![notices::WAITING]);
    assert_eq!(dispatcher.engine().waiting_users().await, vec![1]);

    dispatcher.handle(2, "/find").await;
    assert_eq!(transport.take(1).await, vec![notices::CONNECTED]);
    assert_eq!(transport.take(2).await, vec![notices::CONNECTED]);

    let engine = dispatcher.engine();
    assert!(engine.waiting_users().await.is_empty());
    assert_eq!(engine.partner_of(1).await, Some(2));
    assert_eq!(engine.partner_of(2).await, Some(1));
}

#[tokio::test]
async fn test_incompatible_requester_is_appended() {
    let engine = PairingEngine::new();
    engine.submit_profile(1, create_profile("male", "female")).await.unwrap();
    engine.submit_profile(3, create_profile("male", "male")).await.unwrap();

    engine.request_match(1).await.unwrap();
    let outcome = engine.request_match(3).await.unwrap();

    assert_eq!(outcome, MatchOutcome::Waiting { already_waiting: false });
    assert_eq!(engine.waiting_users().await, vec![1, 3]);
}

#[tokio::test]
async fn test_relay_and_stop_scenario() {
    let (dispatcher, transport) = create_dispatcher();
    dispatcher.submit_profile(1, create_profile("male", "female")).await.unwrap();
    dispatcher.submit_profile(2, create_profile("female", "male")).await.unwrap();
    dispatcher.handle(1, "/find").await;
    dispatcher.handle(2, "/find").await;
    transport.take(1).await;
    transport.take(2).await;

    dispatcher.handle(1, "hi").await;
    assert_eq!(transport.take(2).await, vec!["hi"]);

    dispatcher.handle(1, "/stop").await;
    assert_eq!(transport.take(2).await, vec![notices::PARTNER_LEFT]);
    assert_eq!(transport.take(1).await, vec![notices::YOU_LEFT]);
    assert_eq!(dispatcher.engine().partner_of(1).await, None);
    assert_eq!(dispatcher.engine().partner_of(2).await, None);
}

#[tokio::test]
async fn test_first_fit_ordering() {
    let engine = PairingEngine::new();
    for id in [10, 11, 12] {
        engine.submit_profile(id, create_profile("female", "anyone")).await.unwrap();
        engine.request_match(id).await.ok();
    }
    // 10, 11 and 12 are mutually compatible, so 11 pairs with 10 and 12 waits.
    assert_eq!(engine.partner_of(11).await, Some(10));
    assert_eq!(engine.waiting_users().await, vec![12]);

    let engine = PairingEngine::new();
    for id in [1, 2, 3] {
        engine.submit_profile(id, create_profile("female", "male")).await.unwrap();
        engine.request_match(id).await.unwrap();
    }
    engine.submit_profile(99, create_profile("male", "female")).await.unwrap();

    assert_eq!(engine.request_match(99).await, Ok(MatchOutcome::Matched { partner: 1 }));
    assert_eq!(engine.waiting_users().await, vec![2, 3]);
}

#[tokio::test]
async fn test_relay_is_verbatim() {
    let (dispatcher, transport) = create_dispatcher();
    dispatcher.submit_profile(1, create_profile("male", "anyone")).await.unwrap();
    dispatcher.submit_profile(2, create_profile("male", "anyone")).await.unwrap();
    dispatcher.handle(1, "/find").await;
    dispatcher.handle(2, "/find").await;
    transport.take(1).await;

    transport.take(2).await;

    let text = "  Hello there!\nHow's it going? 🙂  ";
    dispatcher.handle(2, text).await;

    assert_eq!(transport.take(1).await, vec![text]);
    assert!(transport.take(2).await.is_empty());
    assert_eq!(transport.pending_users().await, 0);
}

#[tokio::test]
async fn test_idempotent_withdrawal() {
    let engine = PairingEngine::new();
    engine.submit_profile(5, create_profile("male", "female")).await.unwrap();

    let before = engine.snapshot().await;
    assert_eq!(engine.leave(5).await, LeaveOutcome::NotInChat);
    assert_eq!(engine.leave(5).await, LeaveOutcome::NotInChat);
    assert_eq!(engine.snapshot().await, before);
}

#[tokio::test]
async fn test_stop_after_partner_left() {
    let (dispatcher, transport) = create_dispatcher();
    dispatcher.submit_profile(1, create_profile("male", "female")).await.unwrap();
    dispatcher.submit_profile(2, create_profile("female", "male")).await.unwrap();
    dispatcher.handle(1, "/find").await;
    dispatcher.handle(2, "/find").await;
    dispatcher.handle(2, "/stop").await;
    transport.take(1).await;

    dispatcher.handle(1, "still there?").await;
    dispatcher.handle(1, "/stop").await;

    assert_eq!(
        transport.take(1).await,
        vec![notices::NOT_IN_CHAT_HINT, notices::NOT_IN_CHAT]
    );
    assert!(transport.take(2).await.iter().all(|m| m != "still there?"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_find_and_stop_keep_invariants() {
    let engine = PairingEngine::new();
    let genders = ["male", "female", "non-binary"];
    let preferences = ["male", "female", "anyone"];

    for id in 0..300 {
        let profile = create_profile(genders[id % 3], preferences[(id / 3) % 3]);
        engine.submit_profile(id as UserId, profile).await.unwrap();
    }

    let mut handles = Vec::new();
    for id in 0..300 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let user_id = id as UserId;
            engine.request_match(user_id).await.ok();
            if id % 7 == 0 {
                engine.leave(user_id).await;
            }
            if id % 11 == 0 {
                engine.request_match(user_id).await.ok();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    engine.check_invariants().await.unwrap();

    let waiting = engine.waiting_users().await;
    for id in 0..300 {
        let user_id = id as UserId;
        if let Some(partner) = engine.partner_of(user_id).await {
            assert_ne!(partner, user_id);
            assert!(!waiting.contains(&user_id));
            let a = engine.profile(user_id).await.unwrap();
            let b = engine.profile(partner).await.unwrap();
            assert!(compatible(&a, &b), "{} and {} paired but incompatible", user_id, partner);
        }
    }

    // Nobody waiting may be compatible with another waiting user.
    for (i, &a) in waiting.iter().enumerate() {
        for &b in &waiting[i + 1..] {
            let pa = engine.profile(a).await.unwrap();
            let pb = engine.profile(b).await.unwrap();
            assert!(!compatible(&pa, &pb), "{} and {} both waiting but compatible", a, b);
        }
    }
}
