use futures::SinkExt;
use huddle_core::SignalMessage;
use huddle_relay::RelayConfig;

use crate::utils::{connect, init_tracing, join, recv, start_relay};

#[tokio::test]
async fn test_leave_notifies_room() {
    init_tracing();
    let addr = start_relay(RelayConfig::default()).await;

    let mut alice = connect(addr, "R1").await;
    let mut bob = connect(addr, "R1").await;
    join(&mut alice, "R1", "alice").await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    join(&mut bob, "R1", "bob").await;
    let _ = recv(&mut alice).await;

    bob.close(None).await.unwrap();

    let left = recv(&mut alice).await;
    assert!(matches!(
        left.message,
        SignalMessage::UserLeft(ref p) if p.participant.as_str() == "bob" && p.name == "bob"
    ));
}
