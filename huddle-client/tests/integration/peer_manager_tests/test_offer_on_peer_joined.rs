use huddle_client::{PeerState, SessionEvent, TrackKind};
use huddle_core::{ParticipantId, SdpType};

use crate::integration::{PeerHarness, init_tracing};
use crate::utils::{MockCall, MockConnectionFactory, SentSignal};

#[tokio::test]
async fn test_existing_member_offers_to_newcomer() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;

    assert_eq!(h.manager.peer_count(), 1);
    assert_eq!(h.manager.peer_state(&bob), Some(PeerState::OfferSent));
    assert_eq!(
        h.factory.last_to(&bob).calls(),
        vec![
            MockCall::AddTrack(TrackKind::Audio),
            MockCall::AddTrack(TrackKind::Video),
            MockCall::CreateOffer,
            MockCall::SetLocal(SdpType::Offer),
        ]
    );

    match h.signal_rx.recv().await {
        Some(SentSignal::Offer {
            target,
            description,
        }) => {
            assert_eq!(target, bob);
            assert_eq!(description.sdp_type, SdpType::Offer);
        }
        other => panic!("expected offer, got {other:?}"),
    }

    let events = h.take_events();
    assert!(matches!(
        &events[0],
        SessionEvent::UserJoined { participant, name } if participant == &bob && name == "Bob"
    ));
    assert!(matches!(
        &events[1],
        SessionEvent::PeerStateChanged { state: PeerState::OfferSent, .. }
    ));
}

#[tokio::test]
async fn test_duplicate_join_keeps_single_connection() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;
    let bob = ParticipantId::from("bob");

    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;
    h.manager.handle_peer_joined(bob.clone(), "Bob".into()).await;

    assert_eq!(h.factory.created(), 1);
    assert_eq!(h.manager.peer_count(), 1);
    assert_eq!(h.signaling.offers_to(&bob).await, 1);

    let joined = h
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::UserJoined { .. }))
        .count();
    assert_eq!(joined, 1);
}

#[tokio::test]
async fn test_own_join_is_ignored() {
    init_tracing();
    let mut h = PeerHarness::new("alice", MockConnectionFactory::silent()).await;

    h.manager
        .handle_peer_joined(ParticipantId::from("alice"), "Alice".into())
        .await;

    assert_eq!(h.factory.created(), 0);
    assert!(h.take_events().is_empty());
}

#[tokio::test]
async fn test_answering_side_reaches_connected() {
    init_tracing();
    let mut h = PeerHarness::new("bob", MockConnectionFactory::auto_connect()).await;
    let alice = ParticipantId::from("alice");

    h.manager
        .handle_offer(alice.clone(), huddle_core::SessionDescription::offer("offer-a"))
        .await;

    assert_eq!(h.manager.peer_state(&alice), Some(PeerState::AnswerSent));
    assert_eq!(h.signaling.answers_to(&alice).await, 1);
    let calls = h.factory.last_to(&alice).calls();
    assert_eq!(
        calls[2..].to_vec(),
        vec![
            MockCall::SetRemote(SdpType::Offer),
            MockCall::CreateAnswer,
            MockCall::SetLocal(SdpType::Answer),
        ]
    );

    h.pump(100).await;

    assert_eq!(h.manager.peer_state(&alice), Some(PeerState::Connected));
    let added = h
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::RemoteStreamAdded { .. }))
        .count();
    assert_eq!(added, 1);

    let participants = h.manager.participants();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].name, None);
}
