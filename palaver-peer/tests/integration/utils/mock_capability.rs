use async_trait::async_trait;
use palaver_core::{CandidateInit, MediaTrack};
use palaver_peer::capability::{
    CapabilityConfig, ConnectionEvent, PeerConnection, PeerConnectionFactory, SdpKind,
};
use palaver_peer::error::NegotiationError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Everything the session asked the capability to do, in call order.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub tracks: Vec<MediaTrack>,
    pub channels: Vec<String>,
    pub local_descriptions: Vec<(SdpKind, String)>,
    pub remote_descriptions: Vec<(SdpKind, String)>,
    pub candidates: Vec<CandidateInit>,
    pub sent_texts: Vec<String>,
}

/// Shared handle to a scripted connection capability: records every call
/// the engine makes and lets a test fire capability events by hand.
#[derive(Clone, Default)]
pub struct MockRig {
    recorded: Arc<Mutex<Recorded>>,
    created: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    offers: Arc<AtomicUsize>,
    fail_offer: Arc<AtomicBool>,
    events: Arc<Mutex<Option<mpsc::Sender<ConnectionEvent>>>>,
}

impl MockRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> MockFactory {
        MockFactory { rig: self.clone() }
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    /// How many capabilities the factory has built.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn fail_next_offer(&self) {
        self.fail_offer.store(true, Ordering::SeqCst);
    }

    /// Fire a capability event into the most recently created capability's
    /// stream, as the real capability would.
    pub async fn fire(&self, event: ConnectionEvent) {
        let sender = self.events.lock().unwrap().clone();
        let sender = sender.expect("no capability created yet");
        sender.send(event).await.expect("session is gone");
    }

    pub async fn open_channel(&self) {
        self.fire(ConnectionEvent::ChannelOpen).await;
    }
}

pub struct MockFactory {
    rig: MockRig,
}

#[async_trait]
impl PeerConnectionFactory for MockFactory {
    async fn create(
        &self,
        _config: &CapabilityConfig,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Box<dyn PeerConnection>, NegotiationError> {
        self.rig.created.fetch_add(1, Ordering::SeqCst);
        *self.rig.events.lock().unwrap() = Some(events);
        Ok(Box::new(MockCapability {
            rig: self.rig.clone(),
        }))
    }
}

pub struct MockCapability {
    rig: MockRig,
}

#[async_trait]
impl PeerConnection for MockCapability {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError> {
        self.rig.recorded.lock().unwrap().tracks.push(track.clone());
        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<(), NegotiationError> {
        self.rig
            .recorded
            .lock()
            .unwrap()
            .channels
            .push(label.to_owned());
        Ok(())
    }

    async fn create_offer(&self) -> Result<String, NegotiationError> {
        if self.rig.fail_offer.swap(false, Ordering::SeqCst) {
            return Err(NegotiationError::Offer("scripted failure".into()));
        }
        let n = self.rig.offers.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("offer-sdp-{n}"))
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        Ok("answer-sdp".to_owned())
    }

    async fn set_local_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        self.rig
            .recorded
            .lock()
            .unwrap()
            .local_descriptions
            .push((kind, sdp));
        Ok(())
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        self.rig
            .recorded
            .lock()
            .unwrap()
            .remote_descriptions
            .push((kind, sdp));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError> {
        self.rig.recorded.lock().unwrap().candidates.push(candidate);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NegotiationError> {
        self.rig
            .recorded
            .lock()
            .unwrap()
            .sent_texts
            .push(text.to_owned());
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.rig.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
