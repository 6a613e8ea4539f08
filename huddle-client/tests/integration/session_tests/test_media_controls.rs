use huddle_client::{DeviceCapabilities, MediaConstraints, SessionError};
use huddle_core::RoomId;
use huddle_relay::RelayHub;

use super::connected_pair;
use crate::integration::{TestParticipant, init_tracing};
use crate::utils::MockConnectionFactory;

#[tokio::test]
async fn test_toggles_do_not_renegotiate() {
    init_tracing();
    let hub = RelayHub::new(64);
    let room = RoomId::from("standup");
    let (alice, bob) = connected_pair(&hub, &room).await;
    let calls_before = alice.factory.total_calls();

    assert!(!alice.session.toggle_video().await);
    assert!(!alice.session.toggle_audio().await);
    assert!(alice.session.toggle_video().await);

    let media = alice.session.local_media().await;
    assert!(media.video().unwrap().is_enabled());
    assert!(!media.audio().unwrap().is_enabled());
    assert!(!media.audio().unwrap().is_stopped());
    assert_eq!(alice.factory.total_calls(), calls_before);
    assert_eq!(bob.session.peer_count().await, 1);
}

#[tokio::test]
async fn test_missing_camera_aborts_join() {
    init_tracing();
    let hub = RelayHub::new(64);
    let alice = TestParticipant::with(
        "alice",
        &hub,
        DeviceCapabilities::microphone_only(),
        MockConnectionFactory::auto_connect(),
    );

    let err = alice
        .session
        .join(RoomId::from("standup"), alice.id.clone(), "Alice")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::MediaAcquisition(_)));
    assert!(!alice.session.toggle_video().await);
}

#[tokio::test]
async fn test_overconstrained_camera_falls_back_to_basic() {
    init_tracing();
    let hub = RelayHub::new(64);
    let alice = TestParticipant::with(
        "alice",
        &hub,
        DeviceCapabilities::camera(640, 480, 30),
        MockConnectionFactory::auto_connect(),
    );

    alice
        .session
        .join(RoomId::from("standup"), alice.id.clone(), "Alice")
        .await
        .unwrap();

    assert_eq!(
        alice.devices.requests(),
        vec![MediaConstraints::default(), MediaConstraints::basic()]
    );
    let media = alice.session.local_media().await;
    assert!(media.audio().is_some());
    assert!(media.video().is_some());
    alice.session.leave().await;
}
