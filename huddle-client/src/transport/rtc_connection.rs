use crate::media::{LocalTrack, RemoteTrack, TrackKind};
use crate::transport::{
    ConnectionEvent, ConnectionEventKind, ConnectionFactory, LinkState, MediaConnection,
    TransportConfig,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use huddle_core::{ConnectionId, IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Creates webrtc-rs peer connections.
pub struct RtcConnectionFactory {
    config: TransportConfig,
}

impl RtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Default for RtcConnectionFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl ConnectionFactory for RtcConnectionFactory {
    async fn create(
        &self,
        participant: ParticipantId,
        connection: ConnectionId,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Box<dyn MediaConnection>> {
        let rtc = RtcConnection::new(participant, connection, self.config.clone(), events).await?;
        Ok(Box::new(rtc))
    }
}

pub struct RtcConnection {
    pub participant: ParticipantId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl RtcConnection {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        participant: ParticipantId,
        connection: ConnectionId,
        config: TransportConfig,
        event_tx: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            Vec::new()
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let emitter = EventSink {
            participant: participant.clone(),
            connection,
            tx: event_tx,
        };

        let state_sink = emitter.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                Box::pin(async move {
                    info!("Peer connection state for {}: {}", sink.participant, s);
                    sink.send(ConnectionEventKind::StateChanged(link_state(s))).await;
                })
            },
        ));

        let ice_sink = emitter.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                sink.send(ConnectionEventKind::LocalCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                }))
                .await;
            })
        }));

        let track_sink = emitter;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let sink = track_sink.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Video => TrackKind::Video,
                    _ => TrackKind::Audio,
                };
                debug!("Remote {} track from {}", kind, sink.participant);
                let remote = RemoteTrack {
                    id: track.id().to_string(),
                    kind,
                    stream_id: track.stream_id().to_string(),
                    source: Some(track),
                };
                sink.send(ConnectionEventKind::TrackAdded(remote)).await;
            })
        }));

        Ok(Self {
            participant,
            peer_connection,
        })
    }
}

#[async_trait]
impl MediaConnection for RtcConnection {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(track.rtc_track())
            .await
            .with_context(|| format!("Failed to attach {} track", track.kind()))?;

        // RTCP has to be drained for interceptors like NACK to work.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await
            .with_context(|| format!("Failed to apply remote {}", description.sdp_type))?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: candidate.sdp_mid.clone(),
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

#[derive(Clone)]
struct EventSink {
    participant: ParticipantId,
    connection: ConnectionId,
    tx: mpsc::Sender<ConnectionEvent>,
}

impl EventSink {
    async fn send(&self, kind: ConnectionEventKind) {
        let _ = self
            .tx
            .send(ConnectionEvent {
                participant: self.participant.clone(),
                connection: self.connection,
                kind,
            })
            .await;
    }
}

fn to_rtc(description: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = description.sdp.clone();
    let rtc = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(sdp)?,
    };
    Ok(rtc)
}

fn link_state(state: RTCPeerConnectionState) -> LinkState {
    match state {
        RTCPeerConnectionState::Connecting => LinkState::Connecting,
        RTCPeerConnectionState::Connected => LinkState::Connected,
        RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
        RTCPeerConnectionState::Failed => LinkState::Failed,
        RTCPeerConnectionState::Closed => LinkState::Closed,
        _ => LinkState::New,
    }
}
