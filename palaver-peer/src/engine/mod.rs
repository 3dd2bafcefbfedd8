use crate::buffer::{CandidateBuffer, OutboundQueue};
use crate::capability::{CapabilityConfig, ConnectionEvent, PeerConnection, PeerConnectionFactory};
use crate::error::{NegotiationError, SessionError};
use crate::transport::{SignalingTransport, TransportEvent};
use palaver_core::{MediaTrack, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod channel_impl;
mod signal_impl;
mod start_call_impl;

pub(crate) const CHAT_CHANNEL_LABEL: &str = "chat";

/// One negotiation attempt walks this machine. `Closed` is terminal and
/// reachable from everywhere, via explicit close or fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    CreatingOffer,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Connected,
    Closed,
}

impl NegotiationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationState::Idle => "idle",
            NegotiationState::CreatingOffer => "creating-offer",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::OfferReceived => "offer-received",
            NegotiationState::AnswerSent => "answer-sent",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        }
    }
}

/// Fixed once an offer is sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

#[derive(Debug)]
enum SessionCommand {
    StartCall(Vec<MediaTrack>),
    SendChat(String),
    EndCall,
}

/// What a session reports to the layer driving it (a UI, a CLI, a test).
#[derive(Debug)]
pub enum SessionEvent {
    StateChanged(NegotiationState),
    RemoteStream(palaver_core::RemoteStream),
    ChatMessage(String),
    /// One-shot per closed period: a chat payload was queued because the
    /// data channel is not open yet.
    ChannelNotReady,
    SignalingError(SessionError),
}

/// Command surface handed to the caller. Cheap to clone; all commands are
/// serviced by the session's event loop in arrival order.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn start_call(&self, tracks: Vec<MediaTrack>) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::StartCall(tracks))
            .await
            .map_err(|_| SessionError::Terminated)
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::SendChat(text.into()))
            .await
            .map_err(|_| SessionError::Terminated)
    }

    /// Idempotent; ending a session that is already gone is a no-op.
    pub async fn end_call(&self) {
        let _ = self.commands.send(SessionCommand::EndCall).await;
    }
}

/// The negotiation engine: a single-actor event loop that owns the
/// connection capability, drives the offer/answer exchange over an
/// injected signaling transport, buffers early candidates, and queues
/// outbound chat until the data channel opens.
pub struct Session {
    factory: Box<dyn PeerConnectionFactory>,
    transport: Arc<dyn SignalingTransport>,
    config: CapabilityConfig,

    state: NegotiationState,
    role: Option<Role>,
    capability: Option<Box<dyn PeerConnection>>,
    conn_events: Option<mpsc::Receiver<ConnectionEvent>>,
    signals: Option<mpsc::UnboundedReceiver<TransportEvent>>,

    local_tracks: Vec<MediaTrack>,
    local_offer: Option<SignalEnvelope>,
    remote_description_set: bool,
    channel_open: bool,
    queue_warned: bool,

    pending_candidates: CandidateBuffer,
    outbound: OutboundQueue,

    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    pub fn new(
        factory: Box<dyn PeerConnectionFactory>,
        transport: Arc<dyn SignalingTransport>,
        config: CapabilityConfig,
    ) -> (
        Session,
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let session = Session {
            factory,
            transport,
            config,
            state: NegotiationState::Idle,
            role: None,
            capability: None,
            conn_events: None,
            signals: None,
            local_tracks: Vec::new(),
            local_offer: None,
            remote_description_set: false,
            channel_open: false,
            queue_warned: false,
            pending_candidates: CandidateBuffer::new(),
            outbound: OutboundQueue::new(),
            commands: command_rx,
            events: event_tx,
        };

        (
            session,
            SessionHandle {
                commands: command_tx,
            },
            event_rx,
        )
    }

    /// The session event loop. Commands, transport events and capability
    /// events are multiplexed onto one timeline, so every negotiation step
    /// completes before the next one is looked at.
    pub async fn run(mut self) {
        match self.transport.connect().await {
            Ok(rx) => self.signals = Some(rx),
            Err(e) => {
                self.emit(SessionEvent::SignalingError(e.into()));
                self.close_session().await;
                return;
            }
        }

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.close_session().await;
                        break;
                    }
                },
                event = recv_transport(&mut self.signals) => match event {
                    Some(event) => self.handle_transport_event(event).await,
                    None => {
                        if self.state != NegotiationState::Closed {
                            warn!("signaling stream ended");
                        }
                        self.signals = None;
                    }
                },
                event = recv_connection(&mut self.conn_events) => match event {
                    Some(event) => self.handle_connection_event(event).await,
                    None => self.conn_events = None,
                },
            }
        }

        info!("session event loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartCall(tracks) => self.start_call(tracks).await,
            SessionCommand::SendChat(text) => self.send_chat(text).await,
            SessionCommand::EndCall => self.close_session().await,
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.state == NegotiationState::Closed {
            return;
        }
        match event {
            TransportEvent::Opened => debug!("signaling transport ready"),
            TransportEvent::Message(envelope) => self.on_signal(envelope).await,
            TransportEvent::Error(e) => self.emit(SessionEvent::SignalingError(e.into())),
        }
    }

    /// Tear everything down exactly once: capability released, both
    /// buffers cleared, state `Closed`. Safe from any state.
    pub(super) async fn close_session(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        if let Some(capability) = self.capability.take() {
            if let Err(e) = capability.close().await {
                warn!("capability close reported: {}", e);
            }
        }
        self.conn_events = None;
        self.pending_candidates.clear();
        self.outbound.clear();
        self.channel_open = false;
        self.set_state(NegotiationState::Closed);
    }

    /// Fatal negotiation failure: surface it, then land in `Closed`,
    /// never half-closed.
    pub(super) async fn fail_session(&mut self, error: NegotiationError) {
        self.emit(SessionEvent::SignalingError(error.into()));
        self.close_session().await;
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub(super) fn set_state(&mut self, next: NegotiationState) {
        if self.state == next {
            return;
        }
        info!(
            "negotiation state {} -> {}",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
        self.emit(SessionEvent::StateChanged(next));
    }

    /// Every locally produced description or candidate leaves through here.
    pub(super) async fn forward(&mut self, envelope: SignalEnvelope) {
        if let Err(e) = self.transport.send(envelope).await {
            self.emit(SessionEvent::SignalingError(e.into()));
        }
    }
}

async fn recv_transport(
    rx: &mut Option<mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_connection(
    rx: &mut Option<mpsc::Receiver<ConnectionEvent>>,
) -> Option<ConnectionEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
