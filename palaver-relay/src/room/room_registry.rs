use crate::room::{RoomCommand, RoomLog};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Lazily spawns one [`RoomLog`] actor per room id and hands out its
/// command sender. Rooms live for the lifetime of the process; a room's
/// log survives every subscriber leaving, which is what "durable" means
/// for this medium.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, mpsc::Sender<RoomCommand>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }

    pub fn room_sender(&self, room_id: &str) -> mpsc::Sender<RoomCommand> {
        // entry() keeps two racing joiners from spawning twin rooms
        self.rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| {
                info!("creating room '{}'", room_id);
                let (tx, rx) = mpsc::channel(100);
                tokio::spawn(RoomLog::new(room_id.to_owned(), rx).run());
                tx
            })
            .value()
            .clone()
    }
}
