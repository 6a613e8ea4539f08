use std::time::Duration;

use huddle_client::{
    ConnectionEvent, ConnectionEventKind, ConnectionFactory, DeviceCapabilities, LinkState,
    MediaConnection, MediaConstraints, MediaDeviceProvider, RtcConnectionFactory, SyntheticDevices,
    TransportConfig,
};
use huddle_core::{ConnectionId, ParticipantId, SdpType};
use tokio::sync::mpsc;

use crate::integration::init_tracing;

async fn with_tracks(connection: &dyn MediaConnection) {
    let tracks = SyntheticDevices::new(DeviceCapabilities::default())
        .get_user_media(&MediaConstraints::default())
        .await
        .unwrap();
    for track in tracks {
        connection.add_track(track).await.unwrap();
    }
}

#[tokio::test]
async fn test_rtc_connections_reach_connected_over_loopback() {
    init_tracing();
    let factory = RtcConnectionFactory::new(TransportConfig::local());
    let (alice_tx, mut alice_rx) = mpsc::channel::<ConnectionEvent>(256);
    let (bob_tx, mut bob_rx) = mpsc::channel::<ConnectionEvent>(256);

    let alice = factory
        .create(ParticipantId::from("bob"), ConnectionId::new(), alice_tx)
        .await
        .unwrap();
    let bob = factory
        .create(ParticipantId::from("alice"), ConnectionId::new(), bob_tx)
        .await
        .unwrap();
    with_tracks(alice.as_ref()).await;
    with_tracks(bob.as_ref()).await;

    let offer = alice.create_offer().await.unwrap();
    assert_eq!(offer.sdp_type, SdpType::Offer);
    assert!(offer.sdp.contains("m=audio"));
    assert!(offer.sdp.contains("m=video"));
    alice.set_local_description(&offer).await.unwrap();
    bob.set_remote_description(&offer).await.unwrap();

    let answer = bob.create_answer().await.unwrap();
    assert_eq!(answer.sdp_type, SdpType::Answer);
    bob.set_local_description(&answer).await.unwrap();
    alice.set_remote_description(&answer).await.unwrap();

    let mut alice_connected = false;
    let mut bob_connected = false;
    let deadline = tokio::time::sleep(Duration::from_secs(15));
    tokio::pin!(deadline);

    while !(alice_connected && bob_connected) {
        tokio::select! {
            Some(event) = alice_rx.recv() => match event.kind {
                ConnectionEventKind::LocalCandidate(candidate) => {
                    bob.add_ice_candidate(&candidate).await.unwrap();
                }
                ConnectionEventKind::StateChanged(LinkState::Connected) => alice_connected = true,
                _ => {}
            },
            Some(event) = bob_rx.recv() => match event.kind {
                ConnectionEventKind::LocalCandidate(candidate) => {
                    alice.add_ice_candidate(&candidate).await.unwrap();
                }
                ConnectionEventKind::StateChanged(LinkState::Connected) => bob_connected = true,
                _ => {}
            },
            _ = &mut deadline => break,
        }
    }

    assert!(alice_connected, "alice never connected");
    assert!(bob_connected, "bob never connected");

    alice.close().await.unwrap();
    bob.close().await.unwrap();
}
