mod media;
mod peer;
mod room;
mod signaling;

pub use media::{MediaKind, MediaTrack, RemoteStream};
pub use peer::PeerId;
pub use room::{InvalidRoomId, RoomId};
pub use signaling::{CandidateInit, IceServerConfig, SignalEnvelope, SignalPayload};
