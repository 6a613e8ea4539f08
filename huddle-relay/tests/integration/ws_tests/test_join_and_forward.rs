use huddle_core::{Envelope, ParticipantId, RoomId, SessionDescription, SignalMessage};
use huddle_relay::RelayConfig;

use crate::utils::{connect, init_tracing, join, recv, send, start_relay};

#[tokio::test]
async fn test_join_and_forward() {
    init_tracing();
    let addr = start_relay(RelayConfig::default()).await;

    let mut alice = connect(addr, "R1").await;
    let mut bob = connect(addr, "R1").await;

    join(&mut alice, "R1", "alice").await;
    // Give the relay a moment so alice is in the room before bob joins.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    join(&mut bob, "R1", "bob").await;

    let joined = recv(&mut alice).await;
    assert_eq!(joined.room, Some(RoomId::from("R1")));
    assert!(matches!(
        joined.message,
        SignalMessage::UserJoined(ref p) if p.participant.as_str() == "bob"
    ));

    send(
        &mut alice,
        Envelope::new(SignalMessage::Offer {
            target: ParticipantId::from("bob"),
            description: SessionDescription::offer("v=0"),
        }),
    )
    .await;

    let offer = recv(&mut bob).await;
    assert_eq!(offer.sender, Some(ParticipantId::from("alice")));
    assert!(matches!(offer.message, SignalMessage::Offer { .. }));
}

#[tokio::test]
async fn test_malformed_join_is_answered_with_error() {
    init_tracing();
    let addr = start_relay(RelayConfig::default()).await;
    let mut ws = connect(addr, "R1").await;

    use futures::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    ws.send(Message::Text(r#"{"type":"join-room","data":{}}"#.into()))
        .await
        .unwrap();

    let reply = recv(&mut ws).await;
    assert_eq!(
        reply.message,
        SignalMessage::Error("Invalid join room data".into())
    );
}
