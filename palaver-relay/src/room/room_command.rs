use palaver_core::PeerId;
use tokio::sync::mpsc;

/// Commands a room actor services, one connection-facing task at a time.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection joined the room: replay the whole log to it, then
    /// include it in future fan-out.
    Subscribe {
        client: PeerId,
        sender: mpsc::UnboundedSender<String>,
    },

    /// A validated signaling message to append and fan out.
    Publish { from: PeerId, frame: String },

    /// The connection went away.
    Unsubscribe { client: PeerId },
}
