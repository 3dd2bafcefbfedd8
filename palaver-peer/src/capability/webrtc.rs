use crate::capability::{
    CapabilityConfig, ConnectionEvent, PeerConnection, PeerConnectionFactory, SdpKind,
};
use crate::error::NegotiationError;
use async_trait::async_trait;
use palaver_core::{CandidateInit, MediaKind, MediaTrack, RemoteStream};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`WebRtcCapability`] instances.
pub struct WebRtcFactory;

#[async_trait]
impl PeerConnectionFactory for WebRtcFactory {
    async fn create(
        &self,
        config: &CapabilityConfig,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError> {
        let capability = WebRtcCapability::new(config, events).await?;
        Ok(Box::new(capability))
    }
}

/// Connection capability backed by the `webrtc` crate. The engine drives it
/// through the [`PeerConnection`] contract only; nothing here is specific
/// to any particular signaling medium.
pub struct WebRtcCapability {
    pc: Arc<RTCPeerConnection>,
    chat: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    events: mpsc::Sender<ConnectionEvent>,
}

impl WebRtcCapability {
    pub async fn new(
        config: &CapabilityConfig,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Self, NegotiationError> {
        let mut media = MediaEngine::default();
        media
            .register_default_codecs()
            .map_err(|e| NegotiationError::Capability(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media)
            .map_err(|e| NegotiationError::Capability(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| NegotiationError::Capability(e.to_string()))?,
        );
        let chat: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));

        let state_tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                info!("peer connection state: {:?}", state);
                match state {
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = tx.send(ConnectionEvent::ConnectionClosed).await;
                    }
                    _ => {}
                }
            })
        }));

        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    warn!("discovered candidate could not be serialized");
                    return;
                };
                let discovered = CandidateInit {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(ConnectionEvent::CandidateDiscovered(discovered))
                    .await;
            })
        }));

        let track_tx = events.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                let mut id = track.stream_id();
                if id.is_empty() {
                    id = track.id();
                }
                let _ = tx.send(ConnectionEvent::RemoteTrack(RemoteStream { id })).await;
            })
        }));

        // Answerer side: the offerer created the channel, it arrives here.
        let dc_tx = events.clone();
        let dc_slot = chat.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = dc_slot.clone();
            Box::pin(async move {
                debug!("incoming data channel '{}'", dc.label());
                let _ = tx.send(ConnectionEvent::IncomingChannel).await;
                Self::wire_channel(&slot, &tx, dc).await;
            })
        }));

        Ok(Self { pc, chat, events })
    }

    async fn wire_channel(
        slot: &Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
        events: &mpsc::Sender<ConnectionEvent>,
        dc: Arc<RTCDataChannel>,
    ) {
        let open_tx = events.clone();
        dc.on_open(Box::new(move || {
            let tx = open_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ConnectionEvent::ChannelOpen).await;
            })
        }));

        let msg_tx = events.clone();
        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let tx = msg_tx.clone();
            Box::pin(async move {
                let text = String::from_utf8_lossy(&msg.data).into_owned();
                let _ = tx.send(ConnectionEvent::ChannelMessage(text)).await;
            })
        }));

        let err_tx = events.clone();
        dc.on_error(Box::new(move |err| {
            let tx = err_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ConnectionEvent::ChannelError(err.to_string())).await;
            })
        }));

        let close_tx = events.clone();
        dc.on_close(Box::new(move || {
            let tx = close_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ConnectionEvent::ChannelClosed).await;
            })
        }));

        *slot.lock().await = Some(dc);
    }
}

#[async_trait]
impl PeerConnection for WebRtcCapability {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError> {
        // No capture here: the track handle becomes a transceiver slot the
        // application feeds outside the negotiation core.
        let kind = match track.kind {
            MediaKind::Audio => RTPCodecType::Audio,
            MediaKind::Video => RTPCodecType::Video,
        };
        self.pc
            .add_transceiver_from_kind(kind, None)
            .await
            .map_err(|e| NegotiationError::Capability(e.to_string()))?;
        debug!("registered {:?} transceiver for track '{}'", track.kind, track.id);
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<(), NegotiationError> {
        let dc = self
            .pc
            .create_data_channel(label, None)
            .await
            .map_err(|e| NegotiationError::Channel(e.to_string()))?;
        Self::wire_channel(&self.chat, &self.events, dc).await;
        Ok(())
    }

    async fn create_offer(&self) -> Result<String, NegotiationError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::Offer(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::Answer(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_local_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        let desc = description(kind, sdp)?;
        self.pc
            .set_local_description(desc)
            .await
            .map_err(|e| NegotiationError::Description("local", e.to_string()))
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        let desc = description(kind, sdp)?;
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::Description("remote", e.to_string()))
    }

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| NegotiationError::Candidate(e.to_string()))
    }

    async fn send_text(&self, text: &str) -> Result<(), NegotiationError> {
        let chat = self.chat.lock().await;
        let Some(dc) = chat.as_ref() else {
            return Err(NegotiationError::Channel("no data channel".into()));
        };
        dc.send_text(text.to_owned())
            .await
            .map(|_| ())
            .map_err(|e| NegotiationError::Channel(e.to_string()))
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.pc
            .close()
            .await
            .map_err(|e| NegotiationError::Capability(e.to_string()))
    }
}

fn description(kind: SdpKind, sdp: String) -> Result<RTCSessionDescription, NegotiationError> {
    match kind {
        SdpKind::Offer => RTCSessionDescription::offer(sdp),
        SdpKind::Answer => RTCSessionDescription::answer(sdp),
    }
    .map_err(|e| NegotiationError::Description("parse", e.to_string()))
}
