use huddle_client::{SessionError, SessionEvent};
use huddle_core::RoomId;
use huddle_relay::RelayHub;

use super::connected_pair;
use crate::integration::init_tracing;
use crate::utils::{EVENT_TIMEOUT_MS, eventually, wait_for_event};

#[tokio::test]
async fn test_relay_loss_ends_session() {
    init_tracing();
    let hub = RelayHub::new(64);
    let room = RoomId::from("standup");
    let (mut alice, bob) = connected_pair(&hub, &room).await;

    let alice_client = alice.connector.clients().remove(0);
    hub.unregister(&alice_client);

    let lost = wait_for_event(&mut alice.events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::Error(SessionError::Transport(_)))
    })
    .await;
    assert!(lost.is_some(), "relay loss not reported");

    assert!(eventually(EVENT_TIMEOUT_MS, || async { !alice.session.is_joined().await }).await);
    assert!(alice.session.local_media().await.is_empty());
    assert!(alice.factory.last_to(&bob.id).is_closed());

    // Bob hears that alice is gone through the relay.
    assert!(eventually(EVENT_TIMEOUT_MS, || async { bob.session.peer_count().await == 0 }).await);

    // Leaving after the loss is still fine.
    alice.session.leave().await;
}

#[tokio::test]
async fn test_peer_commands_through_session() {
    init_tracing();
    let hub = RelayHub::new(64);
    let room = RoomId::from("standup");
    let (alice, bob) = connected_pair(&hub, &room).await;

    alice.session.drop_peer(&bob.id).await.unwrap();
    assert_eq!(alice.session.peer_count().await, 0);
    assert_eq!(alice.session.participants().await.len(), 1);

    alice.session.retry_peer(&bob.id).await.unwrap();
    assert_eq!(alice.factory.connections_to(&bob.id).len(), 2);
    assert_eq!(
        alice.session.retry_peer(&"ghost".into()).await,
        Err(SessionError::UnknownParticipant("ghost".into()))
    );
}
