use huddle_client::{DirectoryError, InMemoryDirectory, MeetingDirectory, SessionError};
use huddle_core::RoomId;
use huddle_relay::RelayHub;

use crate::integration::{TestParticipant, init_tracing};
use crate::utils::{EVENT_TIMEOUT_MS, eventually};

#[tokio::test]
async fn test_join_active_meeting() {
    init_tracing();
    let hub = RelayHub::new(64);
    let host = InMemoryDirectory::new("alice");
    let meeting = host.create("Standup", "daily sync").await.unwrap();
    let guest = host.for_user("bob");
    let bob = TestParticipant::new("bob", &hub);

    bob.session
        .join_meeting(&guest, meeting.room_id.clone(), bob.id.clone(), "Bob")
        .await
        .unwrap();

    assert!(
        eventually(EVENT_TIMEOUT_MS, || async {
            hub.room_members(&meeting.room_id) == vec![bob.id.clone()]
        })
        .await
    );
    let listed = guest.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].participants.contains(&bob.id));
    bob.session.leave().await;
}

#[tokio::test]
async fn test_ended_meeting_is_refused() {
    init_tracing();
    let hub = RelayHub::new(64);
    let host = InMemoryDirectory::new("alice");
    let meeting = host.create("Standup", "").await.unwrap();
    host.end(&meeting.room_id).await.unwrap();
    let bob = TestParticipant::new("bob", &hub);

    let err = bob
        .session
        .join_meeting(&host.for_user("bob"), meeting.room_id.clone(), bob.id.clone(), "Bob")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SessionError::Directory(DirectoryError::Ended(meeting.room_id.clone()))
    );
    assert!(bob.devices.requests().is_empty());
    assert!(!bob.session.is_joined().await);
}

#[tokio::test]
async fn test_unknown_meeting_is_refused() {
    init_tracing();
    let hub = RelayHub::new(64);
    let directory = InMemoryDirectory::new("bob");
    let bob = TestParticipant::new("bob", &hub);
    let room = RoomId::from("nope");

    let err = bob
        .session
        .join_meeting(&directory, room.clone(), bob.id.clone(), "Bob")
        .await
        .unwrap_err();

    assert_eq!(err, SessionError::Directory(DirectoryError::NotFound(room)));
}
