mod room_command;
mod room_log;
mod room_registry;

pub use room_command::RoomCommand;
pub use room_log::{RoomLog, StoredSignal};
pub use room_registry::RoomRegistry;
