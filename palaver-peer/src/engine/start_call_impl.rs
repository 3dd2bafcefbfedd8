use crate::capability::SdpKind;
use crate::engine::{CHAT_CHANNEL_LABEL, NegotiationState, Role, Session, SessionEvent};
use crate::error::NegotiationError;
use palaver_core::{MediaTrack, SignalEnvelope};
use tokio::sync::mpsc;

impl Session {
    /// Offerer entry point: build the capability, produce the local offer
    /// and hand it to the transport. Valid only from `Idle`; a re-entrant
    /// call while an offer is being created is rejected, not queued.
    pub(super) async fn start_call(&mut self, tracks: Vec<MediaTrack>) {
        if self.state != NegotiationState::Idle {
            self.emit(SessionEvent::SignalingError(
                NegotiationError::InvalidState {
                    operation: "start_call",
                    state: self.state.as_str(),
                }
                .into(),
            ));
            return;
        }

        self.local_tracks = tracks;
        self.role = Some(Role::Offerer);
        if let Err(e) = self.create_capability().await {
            self.fail_session(e).await;
            return;
        }
        self.set_state(NegotiationState::CreatingOffer);

        let offer = match self.negotiate_local_offer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.fail_session(e).await;
                return;
            }
        };

        let envelope = SignalEnvelope::offer(offer);
        self.local_offer = Some(envelope.clone());
        self.forward(envelope).await;
        self.set_state(NegotiationState::OfferSent);
    }

    async fn negotiate_local_offer(&mut self) -> Result<String, NegotiationError> {
        let capability = self.capability()?;
        let sdp = capability.create_offer().await?;
        capability
            .set_local_description(SdpKind::Offer, sdp.clone())
            .await?;
        Ok(sdp)
    }

    /// Create the connection capability, register the caller's tracks and
    /// (on the offerer side) the chat channel, and start consuming its
    /// event stream.
    pub(super) async fn create_capability(&mut self) -> Result<(), NegotiationError> {
        let (event_tx, event_rx) = mpsc::channel(64);
        let capability = self.factory.create(&self.config, event_tx).await?;

        for track in &self.local_tracks {
            capability.add_track(track).await?;
        }
        if matches!(self.role, Some(Role::Offerer)) {
            capability.create_data_channel(CHAT_CHANNEL_LABEL).await?;
        }

        self.capability = Some(capability);
        self.conn_events = Some(event_rx);
        self.remote_description_set = false;
        self.channel_open = false;
        Ok(())
    }

    pub(super) fn capability(&self) -> Result<&dyn crate::capability::PeerConnection, NegotiationError> {
        self.capability
            .as_deref()
            .ok_or_else(|| NegotiationError::Capability("capability not created".into()))
    }
}
