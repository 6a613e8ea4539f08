use huddle_client::{PeerState, SessionEvent};
use huddle_core::RoomId;
use huddle_relay::RelayHub;

use super::connected_pair;
use crate::integration::{TestParticipant, init_tracing};
use crate::utils::{EVENT_TIMEOUT_MS, drain_events, eventually, wait_for_event};

#[tokio::test]
async fn test_leave_closes_connection_on_both_sides() {
    init_tracing();
    let hub = RelayHub::new(64);
    let room = RoomId::from("standup");
    let (mut alice, mut bob) = connected_pair(&hub, &room).await;
    let bob_connection = alice.factory.last_to(&bob.id);

    bob.session.leave().await;

    assert!(!bob.session.is_joined().await);
    assert_eq!(bob.session.peer_count().await, 0);
    assert!(bob.session.local_media().await.is_empty());
    assert!(bob.factory.last_to(&alice.id).is_closed());

    let left = wait_for_event(&mut alice.events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::UserLeft { .. })
    })
    .await;
    assert!(matches!(
        left,
        Some(SessionEvent::UserLeft { participant, name: Some(name) })
            if participant == bob.id && name == "Bob"
    ));
    assert!(bob_connection.is_closed());
    assert_eq!(alice.session.peer_count().await, 0);
    assert_eq!(alice.session.peer_state(&bob.id).await, None);
    assert_eq!(hub.room_members(&room), vec![alice.id.clone()]);

    let bob_events = drain_events(&mut bob.events, 100).await;
    assert!(bob_events.iter().any(|e| matches!(
        e,
        SessionEvent::PeerStateChanged { state: PeerState::Closed, .. }
    )));
    assert!(
        bob_events
            .iter()
            .any(|e| matches!(e, SessionEvent::RemoteStreamRemoved { participant } if participant == &alice.id))
    );
}

#[tokio::test]
async fn test_leave_is_idempotent() {
    init_tracing();
    let hub = RelayHub::new(64);
    let room = RoomId::from("standup");
    let alice = TestParticipant::new("alice", &hub);

    alice.session.leave().await;

    alice
        .session
        .join(room.clone(), alice.id.clone(), "Alice")
        .await
        .unwrap();
    alice.session.leave().await;
    alice.session.leave().await;

    assert!(!alice.session.is_joined().await);
    assert_eq!(alice.session.current_room().await, None);
    assert!(
        eventually(EVENT_TIMEOUT_MS, || async {
            hub.client_count() == 0 && hub.room_count() == 0
        })
        .await
    );
}

#[tokio::test]
async fn test_session_can_rejoin_after_leaving() {
    init_tracing();
    let hub = RelayHub::new(64);
    let alice = TestParticipant::new("alice", &hub);

    alice
        .session
        .join(RoomId::from("first"), alice.id.clone(), "Alice")
        .await
        .unwrap();
    alice.session.leave().await;
    alice
        .session
        .join(RoomId::from("second"), alice.id.clone(), "Alice")
        .await
        .unwrap();

    assert_eq!(alice.session.current_room().await, Some(RoomId::from("second")));
    assert_eq!(alice.devices.requests().len(), 2);
    assert!(!alice.session.local_media().await.is_empty());
    alice.session.leave().await;
}
