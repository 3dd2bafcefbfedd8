use crate::capability::ConnectionEvent;
use crate::engine::{NegotiationState, Session, SessionEvent};
use crate::error::NegotiationError;
use palaver_core::SignalEnvelope;
use tracing::{debug, info, warn};

impl Session {
    pub(super) async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        if self.state == NegotiationState::Closed {
            return;
        }
        match event {
            ConnectionEvent::CandidateDiscovered(candidate) => {
                self.forward(SignalEnvelope::ice_candidate(candidate)).await;
            }
            ConnectionEvent::RemoteTrack(stream) => {
                self.emit(SessionEvent::RemoteStream(stream));
            }
            ConnectionEvent::IncomingChannel => {
                debug!("peer-created data channel announced");
            }
            ConnectionEvent::ChannelOpen => self.on_channel_open().await,
            ConnectionEvent::ChannelMessage(text) => {
                self.emit(SessionEvent::ChatMessage(text));
            }
            ConnectionEvent::ChannelError(reason) => {
                self.emit(SessionEvent::SignalingError(
                    NegotiationError::Channel(reason).into(),
                ));
            }
            ConnectionEvent::ChannelClosed => {
                warn!("data channel closed");
                self.channel_open = false;
            }
            ConnectionEvent::ConnectionClosed => {
                info!("connection capability reported closure");
                self.close_session().await;
            }
        }
    }

    /// The channel became usable: flush everything queued, strictly in
    /// insertion order, and re-arm the not-ready diagnostic.
    async fn on_channel_open(&mut self) {
        self.channel_open = true;
        self.queue_warned = false;

        let queued = self.outbound.drain();
        if !queued.is_empty() {
            debug!("flushing {} queued chat message(s)", queued.len());
        }
        for text in queued {
            self.transmit(&text).await;
        }

        self.set_state(NegotiationState::Connected);
    }

    pub(super) async fn send_chat(&mut self, text: String) {
        if self.state == NegotiationState::Closed {
            self.emit(SessionEvent::SignalingError(
                NegotiationError::InvalidState {
                    operation: "send_chat",
                    state: self.state.as_str(),
                }
                .into(),
            ));
            return;
        }

        if self.channel_open {
            self.transmit(&text).await;
            return;
        }

        self.outbound.enqueue(text);
        if !self.queue_warned {
            self.queue_warned = true;
            warn!("data channel not open yet; queueing chat");
            self.emit(SessionEvent::ChannelNotReady);
        }
    }

    async fn transmit(&mut self, text: &str) {
        let sent = match self.capability.as_deref() {
            Some(capability) => capability.send_text(text).await,
            None => Err(NegotiationError::Channel("no capability".into())),
        };
        if let Err(e) = sent {
            self.emit(SessionEvent::SignalingError(e.into()));
        }
    }
}
