pub mod model;

pub use model::{
    CandidateInit, IceServerConfig, InvalidRoomId, MediaKind, MediaTrack, PeerId, RemoteStream,
    RoomId, SignalEnvelope, SignalPayload,
};
