use serde::{Deserialize, Serialize};

/// STUN/TURN server entry handed to the connection capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Connectivity candidate in the shape browsers serialize it to.
/// The negotiation layer never looks inside; it is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

impl CandidateInit {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

/// The three message kinds a signaling channel carries.
///
/// Exactly one `Offer` and at most one `Answer` are accepted per session;
/// `IceCandidate`s may arrive in any number and any order relative to the
/// `Answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate { candidate: CandidateInit },
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer { .. } => "offer",
            SignalPayload::Answer { .. } => "answer",
            SignalPayload::IceCandidate { .. } => "ice-candidate",
        }
    }
}

/// A signaling message as it travels: the payload plus the creation
/// timestamp the sender stamps at send time (ms since epoch). The timestamp
/// orders messages for debugging and glare arbitration; protocol
/// correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    #[serde(flatten)]
    pub payload: SignalPayload,
    pub timestamp: i64,
}

impl SignalEnvelope {
    /// Wrap a payload, stamping the current wall clock.
    pub fn now(payload: SignalPayload) -> Self {
        Self {
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::now(SignalPayload::Offer { sdp: sdp.into() })
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::now(SignalPayload::Answer { sdp: sdp.into() })
    }

    pub fn ice_candidate(candidate: CandidateInit) -> Self {
        Self::now(SignalPayload::IceCandidate { candidate })
    }
}
