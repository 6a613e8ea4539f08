use huddle_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};

use crate::integration::{PeerHarness, init_tracing};
use crate::utils::{MockCall, MockConnectionFactory};

#[tokio::test]
async fn test_early_candidates_flushed_once_in_order() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    for c in ["candidate:1", "candidate:2", "candidate:3"] {
        h.manager
            .handle_remote_candidate(bob.clone(), IceCandidate::new(c))
            .await;
    }

    let record = h.factory.last_to(&bob);
    assert!(record.candidates().is_empty(), "applied before description");

    h.manager
        .handle_answer(bob.clone(), SessionDescription::answer("answer-b"))
        .await;
    h.manager
        .handle_remote_candidate(bob.clone(), IceCandidate::new("candidate:4"))
        .await;

    let calls = record.calls();
    let remote_at = calls
        .iter()
        .position(|c| c == &MockCall::SetRemote(SdpType::Answer))
        .expect("answer applied");
    let first_candidate = calls
        .iter()
        .position(|c| matches!(c, MockCall::AddCandidate(_)))
        .unwrap();
    assert!(first_candidate > remote_at);
    assert_eq!(
        record.candidates(),
        vec!["candidate:1", "candidate:2", "candidate:3", "candidate:4"]
    );
}

#[tokio::test]
async fn test_candidates_without_connection_are_dropped() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;

    h.manager
        .handle_remote_candidate(ParticipantId::from("ghost"), IceCandidate::new("candidate:1"))
        .await;

    assert_eq!(h.factory.created(), 0);
    assert!(h.take_events().is_empty());
}
