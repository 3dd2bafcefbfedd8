use thiserror::Error;

/// Failures of the out-of-band signaling medium.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach the signaling room: {0}")]
    Connect(String),

    #[error("signaling send rejected: {0}")]
    Send(String),

    #[error("malformed signaling payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("signaling transport is not connected")]
    NotConnected,

    #[error("signaling transport is already connected")]
    AlreadyConnected,
}

/// Failures reported by the connection capability while negotiating.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("could not create the connection capability: {0}")]
    Capability(String),

    #[error("offer creation failed: {0}")]
    Offer(String),

    #[error("answer creation failed: {0}")]
    Answer(String),

    #[error("could not apply {0} description: {1}")]
    Description(&'static str, String),

    #[error("could not apply connectivity candidate: {0}")]
    Candidate(String),

    #[error("data channel failure: {0}")]
    Channel(String),

    #[error("{operation} is not valid while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

/// Anything a session can surface to its caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error("session is no longer running")]
    Terminated,
}
