use crate::error::TransportError;
use async_trait::async_trait;
use palaver_core::SignalEnvelope;
use tokio::sync::mpsc;

mod local;
mod manual;
mod room;

pub use local::LocalTransport;
pub use manual::{ManualExchange, ManualTransport};
pub use room::{RoomConfig, RoomTransport};

/// What a signaling medium delivers to its subscriber.
#[derive(Debug)]
pub enum TransportEvent {
    /// The medium is ready; delivered exactly once, before any message.
    Opened,
    /// One incoming signaling message, in the order the variant guarantees.
    Message(SignalEnvelope),
    /// A connection or delivery failure. Never silently swallowed.
    Error(TransportError),
}

/// An interchangeable out-of-band medium for signaling messages.
///
/// The negotiation engine never knows which variant it is talking to: a
/// shared room on a relay, a process-local queue pair, or a human copying
/// JSON between two windows all satisfy the same contract. No variant may
/// reorder, deduplicate or silently drop messages.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Establish readiness and hand back the event stream. [`TransportEvent::Opened`]
    /// is the first event on success; connection failures are returned here.
    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError>;

    /// Hand a message to the medium. Fire-and-forget from the caller's
    /// perspective: delivery failures surface as [`TransportEvent::Error`].
    async fn send(&self, envelope: SignalEnvelope) -> Result<(), TransportError>;
}
