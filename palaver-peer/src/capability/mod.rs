use crate::error::NegotiationError;
use async_trait::async_trait;
use palaver_core::{CandidateInit, IceServerConfig, MediaTrack, RemoteStream};
use tokio::sync::mpsc;

mod webrtc;

pub use self::webrtc::{WebRtcCapability, WebRtcFactory};

/// Configuration handed to the capability factory.
#[derive(Debug, Clone)]
pub struct CapabilityConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Everything the connection capability reports back, delivered over the
/// channel the engine handed to the factory.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A local connectivity candidate was discovered (trickle).
    CandidateDiscovered(CandidateInit),
    /// The peer's media started arriving.
    RemoteTrack(RemoteStream),
    /// The peer created the data channel (answerer side); not yet open.
    IncomingChannel,
    ChannelOpen,
    ChannelMessage(String),
    ChannelError(String),
    ChannelClosed,
    /// The underlying connection failed, disconnected or was closed.
    ConnectionClosed,
}

/// The opaque connection capability the engine orchestrates. The engine
/// never implements media or connectivity itself; it drives this contract
/// and reacts to the [`ConnectionEvent`] stream.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError>;

    async fn create_data_channel(&self, label: &str) -> Result<(), NegotiationError>;

    async fn create_offer(&self) -> Result<String, NegotiationError>;

    async fn create_answer(&self) -> Result<String, NegotiationError>;

    async fn set_local_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError>;

    /// Send an application payload over the open data channel.
    async fn send_text(&self, text: &str) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        config: &CapabilityConfig,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError>;
}
