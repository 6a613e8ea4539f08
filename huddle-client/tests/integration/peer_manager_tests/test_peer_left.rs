use huddle_client::{PeerState, SessionEvent};
use huddle_core::{ParticipantId, SessionDescription};

use crate::integration::{PeerHarness, init_tracing};
use crate::utils::MockConnectionFactory;

#[tokio::test]
async fn test_peer_left_closes_and_removes_stream() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::auto_connect()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager
        .handle_answer(bob.clone(), SessionDescription::answer("answer-b"))
        .await;
    h.pump(100).await;
    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::Connected));
    h.take_events();

    h.manager.handle_peer_left(bob.clone()).await;

    assert_eq!(h.manager.peer_count(), 0);
    assert!(h.manager.participants().is_empty());
    assert!(h.factory.last_to(&bob).is_closed());

    let events = h.take_events();
    assert!(matches!(
        &events[0],
        SessionEvent::PeerStateChanged { state: PeerState::Closed, .. }
    ));
    assert!(matches!(
        &events[1],
        SessionEvent::RemoteStreamRemoved { participant } if participant == &bob
    ));
    assert!(matches!(
        &events[2],
        SessionEvent::UserLeft { name: Some(name), .. } if name == "Bob"
    ));
}

#[tokio::test]
async fn test_late_events_from_closed_connection_are_ignored() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::auto_connect()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager
        .handle_answer(bob.clone(), SessionDescription::answer("answer-b"))
        .await;
    // Connectivity is reported only after bob is gone.
    h.manager.handle_peer_left(bob.clone()).await;
    h.take_events();

    h.pump(100).await;

    assert_eq!(h.manager.peer_count(), 0);
    assert!(h.take_events().is_empty());
}

#[tokio::test]
async fn test_drop_peer_keeps_participant() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager.drop_peer(&bob).await.unwrap();

    assert_eq!(h.manager.peer_count(), 0);
    assert_eq!(h.manager.participants()[0].state, None);
    assert!(h.factory.last_to(&bob).is_closed());
}
