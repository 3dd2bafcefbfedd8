pub mod buffer;
pub mod capability;
pub mod engine;
pub mod error;
pub mod transport;

pub use capability::{
    CapabilityConfig, ConnectionEvent, PeerConnection, PeerConnectionFactory, SdpKind,
};
pub use engine::{NegotiationState, Role, Session, SessionEvent, SessionHandle};
pub use error::{NegotiationError, SessionError, TransportError};
pub use transport::{SignalingTransport, TransportEvent};
