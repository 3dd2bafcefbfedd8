use async_trait::async_trait;
use palaver_core::{SignalEnvelope, SignalPayload};
use palaver_peer::error::TransportError;
use palaver_peer::transport::{SignalingTransport, TransportEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Transport double that captures everything the session sends and lets a
/// test inject incoming messages, in the manner of the relay delivering
/// them.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SignalEnvelope>>,
    incoming: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SignalEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_payloads(&self) -> Vec<SignalPayload> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|envelope| envelope.payload.clone())
            .collect()
    }

    /// Push one remote message at the session.
    pub fn deliver(&self, envelope: SignalEnvelope) {
        let incoming = self.incoming.lock().unwrap();
        let incoming = incoming.as_ref().expect("session has not connected yet");
        incoming
            .send(TransportEvent::Message(envelope))
            .expect("session is gone");
    }

    pub fn connected(&self) -> bool {
        self.incoming.lock().unwrap().is_some()
    }
}

#[async_trait]
impl SignalingTransport for MockTransport {
    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Opened);
        *self.incoming.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn send(&self, envelope: SignalEnvelope) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(envelope);
        Ok(())
    }
}
