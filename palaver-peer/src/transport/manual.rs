use crate::error::TransportError;
use crate::transport::{SignalingTransport, TransportEvent};
use async_trait::async_trait;
use palaver_core::SignalEnvelope;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// The human side of manual signaling: how serialized messages reach the
/// person doing the copying, and how pasted text comes back. Implemented
/// by the CLI with real prompts and by tests with a script.
pub trait ManualExchange: Send + Sync {
    /// Surface one serialized message for out-of-band copying.
    fn present(&self, serialized: &str) -> Result<(), TransportError>;

    /// Block until the human pastes one message back in.
    fn collect(&self) -> Result<String, TransportError>;
}

impl<E: ManualExchange + ?Sized> ManualExchange for std::sync::Arc<E> {
    fn present(&self, serialized: &str) -> Result<(), TransportError> {
        (**self).present(serialized)
    }

    fn collect(&self) -> Result<String, TransportError> {
        (**self).collect()
    }
}

/// Signaling by copy/paste: every outgoing message is shown to a human,
/// every incoming message is pasted back. Pasted garbage re-prompts; it
/// never reaches the negotiation engine.
pub struct ManualTransport<E> {
    exchange: E,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl<E: ManualExchange> ManualTransport<E> {
    pub fn new(exchange: E) -> Self {
        Self {
            exchange,
            events: Mutex::new(None),
        }
    }

    /// Prompt for one pasted message, re-prompting until it parses, and
    /// dispatch it. Blocks the calling thread on the human.
    pub fn receive(&self) -> Result<(), TransportError> {
        if self.events.lock().is_none() {
            return Err(TransportError::NotConnected);
        }
        loop {
            let pasted = self.exchange.collect()?;
            match serde_json::from_str::<SignalEnvelope>(pasted.trim()) {
                Ok(envelope) => {
                    let events = self.events.lock();
                    let Some(events) = events.as_ref() else {
                        return Err(TransportError::NotConnected);
                    };
                    let _ = events.send(TransportEvent::Message(envelope));
                    return Ok(());
                }
                Err(e) => {
                    warn!("pasted text is not a signaling message: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl<E: ManualExchange> SignalingTransport for ManualTransport<E> {
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
        let serialized = serde_json::to_string(&envelope)?;
        self.exchange.present(&serialized)
    }
}
