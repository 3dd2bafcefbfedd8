use crate::error::TransportError;
use crate::transport::{SignalingTransport, TransportEvent};
use async_trait::async_trait;
use palaver_core::SignalEnvelope;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// In-process signaling for two parties sharing one execution context
/// (tests, demos). Each endpoint appends sends to a durable list the peer
/// owns; [`LocalTransport::receive`] drains the whole pending list in FIFO
/// order and dispatches it, then clears it. Not a cross-host medium.
pub struct LocalTransport {
    inbox: Arc<Mutex<Vec<SignalEnvelope>>>,
    peer_inbox: Arc<Mutex<Vec<SignalEnvelope>>>,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl LocalTransport {
    /// Two endpoints wired crosswise: what one sends, the other receives.
    pub fn pair() -> (LocalTransport, LocalTransport) {
        let a_to_b = Arc::new(Mutex::new(Vec::new()));
        let b_to_a = Arc::new(Mutex::new(Vec::new()));

        let a = LocalTransport {
            inbox: b_to_a.clone(),
            peer_inbox: a_to_b.clone(),
            events: Mutex::new(None),
        };
        let b = LocalTransport {
            inbox: a_to_b,
            peer_inbox: b_to_a,
            events: Mutex::new(None),
        };
        (a, b)
    }

    /// Drain and dispatch everything the peer has sent so far.
    pub fn receive(&self) -> Result<usize, TransportError> {
        let events = self.events.lock();
        let Some(events) = events.as_ref() else {
            return Err(TransportError::NotConnected);
        };

        let drained: Vec<SignalEnvelope> = std::mem::take(&mut *self.inbox.lock());

        debug!("local transport dispatching {} message(s)", drained.len());
        let count = drained.len();
        for envelope in drained {
            let _ = events.send(TransportEvent::Message(envelope));
        }
        Ok(count)
    }
}

#[async_trait]
impl SignalingTransport for LocalTransport {
    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError> {
        let mut slot = self.events.lock();
        if slot.is_some() {
            return Err(TransportError::AlreadyConnected);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Opened);
        *slot = Some(tx);
        Ok(rx)
    }

    async fn send(&self, envelope: SignalEnvelope) -> Result<(), TransportError> {
        if self.events.lock().is_none() {
            return Err(TransportError::NotConnected);
        }
        self.peer_inbox.lock().push(envelope);
        Ok(())
    }
}
