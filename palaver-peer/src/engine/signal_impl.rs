use crate::capability::SdpKind;
use crate::engine::{NegotiationState, Role, Session};
use crate::error::NegotiationError;
use palaver_core::{CandidateInit, SignalEnvelope, SignalPayload};
use tracing::{debug, info, warn};

impl Session {
    /// Every remote message enters the engine here and nowhere else.
    pub(super) async fn on_signal(&mut self, envelope: SignalEnvelope) {
        match envelope.payload.clone() {
            SignalPayload::Offer { sdp } => self.on_remote_offer(envelope, sdp).await,
            SignalPayload::Answer { sdp } => self.on_remote_answer(sdp).await,
            SignalPayload::IceCandidate { candidate } => self.on_remote_candidate(candidate).await,
        }
    }

    async fn on_remote_offer(&mut self, envelope: SignalEnvelope, sdp: String) {
        match self.state {
            NegotiationState::Idle => {
                self.role = Some(Role::Answerer);
                if let Err(e) = self.answer_remote_offer(sdp).await {
                    self.fail_session(e).await;
                }
            }
            NegotiationState::OfferSent => {
                // Glare: both sides offered at once. Whichever offer has the
                // smaller (timestamp, sdp) pair keeps the offerer role; both
                // peers see the same two pairs and reach the same verdict.
                let remote_wins = match &self.local_offer {
                    Some(local) => remote_offer_wins(&envelope, local),
                    None => true,
                };
                if remote_wins {
                    info!("offer glare: yielding offerer role to the remote peer");
                    self.yield_offerer_role().await;
                    if let Err(e) = self.answer_remote_offer(sdp).await {
                        self.fail_session(e).await;
                    }
                } else {
                    debug!("offer glare: keeping offerer role, remote offer discarded");
                }
            }
            _ => warn!("ignoring offer while {}", self.state.as_str()),
        }
    }

    /// Tear down the half-negotiated offerer capability so the answerer
    /// path can start from a clean slate.
    async fn yield_offerer_role(&mut self) {
        if let Some(capability) = self.capability.take() {
            if let Err(e) = capability.close().await {
                warn!("capability close reported: {}", e);
            }
        }
        self.conn_events = None;
        self.local_offer = None;
        self.remote_description_set = false;
        self.channel_open = false;
        self.role = Some(Role::Answerer);
    }

    /// Answerer path: apply the remote offer, drain any candidates that
    /// beat it here, produce and send exactly one answer.
    async fn answer_remote_offer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if self.capability.is_none() {
            self.create_capability().await?;
        }
        self.set_state(NegotiationState::OfferReceived);

        self.capability()?
            .set_remote_description(SdpKind::Offer, sdp)
            .await?;
        self.remote_description_set = true;
        self.apply_pending_candidates().await;

        let answer = {
            let capability = self.capability()?;
            let answer = capability.create_answer().await?;
            capability
                .set_local_description(SdpKind::Answer, answer.clone())
                .await?;
            answer
        };

        self.forward(SignalEnvelope::answer(answer)).await;
        self.set_state(NegotiationState::AnswerSent);
        Ok(())
    }

    async fn on_remote_answer(&mut self, sdp: String) {
        if self.state != NegotiationState::OfferSent {
            warn!("ignoring answer while {}", self.state.as_str());
            return;
        }

        let applied = match self.capability.as_deref() {
            Some(capability) => {
                capability
                    .set_remote_description(SdpKind::Answer, sdp)
                    .await
            }
            None => Err(NegotiationError::Capability("capability not created".into())),
        };

        match applied {
            Ok(()) => {
                self.remote_description_set = true;
                self.apply_pending_candidates().await;
                // Connected is entered once the capability reports the
                // channel usable; until then the state stays as is.
            }
            Err(e) => self.fail_session(e).await,
        }
    }

    /// Candidates are never dropped and never applied before the remote
    /// description: too early means buffered, nothing else.
    async fn on_remote_candidate(&mut self, candidate: CandidateInit) {
        if self.remote_description_set {
            self.apply_candidate(candidate).await;
        } else {
            debug!("buffering candidate that arrived before the remote description");
            self.pending_candidates.enqueue(candidate);
        }
    }

    pub(super) async fn apply_pending_candidates(&mut self) {
        if self.pending_candidates.is_empty() {
            return;
        }
        let drained = self.pending_candidates.drain();
        debug!("applying {} buffered candidate(s)", drained.len());
        for candidate in drained {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&mut self, candidate: CandidateInit) {
        let applied = match self.capability.as_deref() {
            Some(capability) => capability.add_ice_candidate(candidate).await,
            None => Err(NegotiationError::Capability("capability not created".into())),
        };
        if let Err(e) = applied {
            warn!("candidate application failed: {}", e);
            self.emit(super::SessionEvent::SignalingError(e.into()));
        }
    }
}

/// Symmetric glare verdict: does the remote offer out-rank the local one?
fn remote_offer_wins(remote: &SignalEnvelope, local: &SignalEnvelope) -> bool {
    glare_key(remote) < glare_key(local)
}

fn glare_key(envelope: &SignalEnvelope) -> (i64, &str) {
    let sdp = match &envelope.payload {
        SignalPayload::Offer { sdp } => sdp.as_str(),
        _ => "",
    };
    (envelope.timestamp, sdp)
}
