use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use huddle::client::{
    DeviceCapabilities, MediaConstraints, RoomSession, RtcConnectionFactory, SessionConfig,
    SessionEvent, SyntheticDevices, TransportConfig, WsConnector, spawn_sample_feed,
};
use huddle::relay::{Relay, RelayConfig};
use huddle::{ParticipantId, RoomId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Full-mesh room calls over WebRTC")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay
    Relay {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Origin allowed to open a WebSocket; repeat for several. None means any.
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,

        /// Messages queued per client before it is dropped
        #[arg(long, default_value_t = 256)]
        queue: usize,
    },

    /// Join a room as a headless participant with synthetic media
    Join {
        room: String,

        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        relay: String,

        #[arg(short, long)]
        user: Option<String>,

        /// Display name; asked for when omitted
        #[arg(short, long)]
        name: Option<String>,

        /// Seconds a handshake may take; 0 waits forever
        #[arg(long, default_value_t = 30)]
        handshake_timeout: u64,

        #[arg(long)]
        audio_only: bool,

        /// ICE server URL; repeat for several. Defaults to public STUN servers.
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Relay {
            bind,
            allowed_origins,
            queue,
        } => {
            run_relay(RelayConfig {
                bind,
                allowed_origins,
                queue_capacity: queue,
            })
            .await
        }
        Commands::Join {
            room,
            relay,
            user,
            name,
            handshake_timeout,
            audio_only,
            ice_servers,
        } => {
            let user = user.unwrap_or_else(|| format!("guest-{}", RoomId::generate()));
            let name = match name {
                Some(name) => name,
                None => Input::<String>::new()
                    .with_prompt("Display name")
                    .default(user.clone())
                    .interact_text()
                    .context("Failed to read display name")?,
            };

            let mut transport = TransportConfig::default();
            if !ice_servers.is_empty() {
                transport.ice_servers = ice_servers;
            }
            let config = SessionConfig {
                constraints: if audio_only {
                    MediaConstraints::audio_only()
                } else {
                    MediaConstraints::default()
                },
                handshake_timeout: (handshake_timeout > 0)
                    .then(|| Duration::from_secs(handshake_timeout)),
                ..SessionConfig::default()
            };

            run_join(
                relay,
                RoomId::from(room),
                ParticipantId::from(user),
                name,
                config,
                transport,
            )
            .await
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_relay(config: RelayConfig) -> Result<()> {
    let relay = Relay::bind(config).await?;
    println!(
        "{} {}",
        "Relay listening on".green().bold(),
        relay.local_addr()?.to_string().cyan()
    );

    relay
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    println!("{}", "Relay stopped".yellow());
    Ok(())
}

async fn run_join(
    relay: String,
    room: RoomId,
    user: ParticipantId,
    name: String,
    config: SessionConfig,
    transport: TransportConfig,
) -> Result<()> {
    let session = RoomSession::new(
        config,
        Arc::new(SyntheticDevices::new(DeviceCapabilities::default())),
        Arc::new(WsConnector::new(relay)),
        Arc::new(RtcConnectionFactory::new(transport)),
    );
    let mut events = session.subscribe();

    session
        .join(room.clone(), user.clone(), name.clone())
        .await
        .with_context(|| format!("Failed to join room {}", room))?;
    println!(
        "{} {} as {} ({})",
        "Joined".green().bold(),
        room.to_string().cyan(),
        name.bold(),
        user
    );
    println!("{}", "Press Ctrl-C to leave".dimmed());

    let media = session.local_media().await;
    for track in media.tracks() {
        println!("  {} {} ({})", "local".dimmed(), track.kind(), track.label());
    }
    let feed = spawn_sample_feed(media);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event);
                    if let SessionEvent::Error(err) = &event {
                        if err.is_session_fatal() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    println!("{}", format!("... {} events skipped", skipped).dimmed());
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.leave().await;
    let _ = feed.await;
    println!("{} {}", "Left".yellow().bold(), room);
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::UserJoined { participant, name } => {
            println!("{} {} ({})", "+".green().bold(), name.bold(), participant);
        }
        SessionEvent::UserLeft { participant, name } => {
            let name = name.as_deref().unwrap_or("unknown");
            println!("{} {} ({})", "-".red().bold(), name.bold(), participant);
        }
        SessionEvent::RemoteStreamAdded {
            participant,
            stream,
        } => {
            println!(
                "{} stream {} from {}",
                "▶".cyan(),
                stream.id(),
                participant.to_string().bold()
            );
        }
        SessionEvent::RemoteStreamRemoved { participant } => {
            println!("{} stream from {} ended", "■".yellow(), participant);
        }
        SessionEvent::PeerStateChanged { participant, state } => {
            println!("{}", format!("  {} is {}", participant, state).dimmed());
        }
        SessionEvent::Error(err) => {
            println!("{} {}", "error:".red().bold(), err);
        }
    }
}
