pub use palaver_core::model::{PeerId, RoomId};

pub mod model {
    pub use palaver_core::model::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use palaver_peer::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use palaver_relay::*;
}
