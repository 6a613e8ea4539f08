use std::time::Duration;

use huddle_client::{PeerState, SessionError, SessionEvent};
use huddle_core::{ParticipantId, SessionDescription};

use crate::integration::{PeerHarness, init_tracing};
use crate::utils::{MockBehavior, MockConnectionFactory};

#[tokio::test]
async fn test_unexpected_answer_fails_only_that_peer() {
    init_tracing();
    let mut h = PeerHarness::new("bob", MockConnectionFactory::silent()).await;
    let alice = ParticipantId::from("alice");
    let carol = ParticipantId::from("carol");

    h.manager
        .handle_offer(alice.clone(), SessionDescription::offer("offer-a"))
        .await;
    h.manager.handle_peer_joined(carol.clone(), "Carol".into()).await;

    h.manager
        .handle_answer(alice.clone(), SessionDescription::answer("stray"))
        .await;

    assert_eq!(h.manager.peer_state(&alice), Some(PeerState::Failed));
    assert_eq!(h.manager.peer_state(&carol), Some(PeerState::OfferSent));

    let error = h.take_events().into_iter().find_map(|e| match e {
        SessionEvent::Error(err) => Some(err),
        _ => None,
    });
    let error = error.expect("handshake failure reported");
    assert!(matches!(error, SessionError::Handshake { .. }));
    assert_eq!(error.participant(), Some(&alice));
    assert!(!error.is_session_fatal());
}

#[tokio::test]
async fn test_answer_without_connection_is_dropped() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;

    h.manager
        .handle_answer(ParticipantId::from("bob"), SessionDescription::answer("stray"))
        .await;

    assert_eq!(h.manager.peer_count(), 0);
    assert!(h.take_events().is_empty());
}

#[tokio::test]
async fn test_late_answer_after_peer_left_is_dropped() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager.handle_peer_left(bob.clone()).await;
    h.take_events();

    h.manager
        .handle_answer(bob.clone(), SessionDescription::answer("late"))
        .await;

    assert_eq!(h.manager.peer_count(), 0);
    assert!(h.take_events().is_empty());
    assert_eq!(h.factory.connections_to(&bob).len(), 1);
}

#[tokio::test]
async fn test_late_answer_after_drop_is_dropped() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager.drop_peer(&bob).await.unwrap();
    h.take_events();

    h.manager
        .handle_answer(bob.clone(), SessionDescription::answer("late"))
        .await;

    assert_eq!(h.manager.peer_state(&bob), None);
    assert!(h.take_events().is_empty());
}

#[tokio::test]
async fn test_malformed_offer_marks_peer_failed() {
    init_tracing();
    let factory = MockConnectionFactory::new(MockBehavior {
        auto_connect: false,
        reject_remote_description: true,
    });
    let mut h = PeerHarness::new("bob", factory).await;
    let alice = ParticipantId::from("alice");

    h.manager
        .handle_offer(alice.clone(), SessionDescription::offer("garbage"))
        .await;

    assert_eq!(h.manager.peer_state(&alice), Some(PeerState::Failed));
    assert_eq!(h.signaling.answers_to(&alice).await, 0);
    assert!(h.factory.last_to(&alice).is_closed());
}

#[tokio::test]
async fn test_unanswered_offer_times_out_and_can_be_retried() {
    init_tracing();
    let mut h = PeerHarness::with_timeout(
        "alice",
        MockConnectionFactory::silent(),
        Some(Duration::from_millis(50)),
    )
    .await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.pump(300).await;

    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::Failed));
    assert!(h.take_events().iter().any(|e| matches!(
        e,
        SessionEvent::Error(SessionError::Handshake { participant, .. }) if participant == &bob
    )));

    h.manager.retry(&bob).await.unwrap();

    assert_eq!(h.factory.created(), 2);
    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::OfferSent));
    assert_eq!(h.signaling.offers_to(&bob).await, 2);
}

#[tokio::test]
async fn test_duplicate_join_replaces_failed_connection() {
    init_tracing();
    let mut h = PeerHarness::with_timeout(
        "alice",
        MockConnectionFactory::silent(),
        Some(Duration::from_millis(50)),
    )
    .await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.pump(300).await;
    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::Failed));

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;

    assert_eq!(h.factory.created(), 2);
    assert_eq!(h.manager.peer_count(), 1);
    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::OfferSent));
}

#[tokio::test]
async fn test_retry_unknown_participant_is_rejected() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let ghost = ParticipantId::from("ghost");

    assert_eq!(
        h.manager.retry(&ghost).await,
        Err(SessionError::UnknownParticipant(ghost.clone()))
    );
    assert_eq!(
        h.manager.drop_peer(&ghost).await,
        Err(SessionError::UnknownParticipant(ghost))
    );
}
