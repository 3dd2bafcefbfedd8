use crate::room::RoomCommand;
use palaver_core::PeerId;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One appended signaling message, remembered for replay.
#[derive(Debug, Clone)]
pub struct StoredSignal {
    pub from: PeerId,
    pub frame: String,
}

/// The per-room actor: an append-only log of signaling frames plus the
/// set of live subscribers. Append order is the delivery order every
/// subscriber observes; late joiners get the backlog replayed first, which
/// is what lets an answerer find an offer published before it arrived.
pub struct RoomLog {
    name: String,
    log: Vec<StoredSignal>,
    subscribers: HashMap<PeerId, mpsc::UnboundedSender<String>>,
    commands: mpsc::Receiver<RoomCommand>,
}

impl RoomLog {
    pub fn new(name: String, commands: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            name,
            log: Vec::new(),
            subscribers: HashMap::new(),
            commands,
        }
    }

    pub async fn run(mut self) {
        info!("room '{}' started", self.name);

        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                RoomCommand::Subscribe { client, sender } => self.subscribe(client, sender),
                RoomCommand::Publish { from, frame } => self.publish(from, frame),
                RoomCommand::Unsubscribe { client } => {
                    self.subscribers.remove(&client);
                    debug!("room '{}': {} left", self.name, client);
                }
            }
        }

        info!("room '{}' finished", self.name);
    }

    fn subscribe(&mut self, client: PeerId, sender: mpsc::UnboundedSender<String>) {
        debug!(
            "room '{}': {} joined, replaying {} frame(s)",
            self.name,
            client,
            self.log.len()
        );
        for stored in &self.log {
            if sender.send(stored.frame.clone()).is_err() {
                warn!("room '{}': {} vanished during replay", self.name, client);
                return;
            }
        }
        self.subscribers.insert(client, sender);
    }

    /// Append, then fan out to everyone except the publisher: a peer
    /// processing its own offer would corrupt its answer path, so the
    /// relay never echoes a frame to the connection that published it.
    fn publish(&mut self, from: PeerId, frame: String) {
        self.log.push(StoredSignal {
            from: from.clone(),
            frame: frame.clone(),
        });

        let mut gone = Vec::new();
        for (client, sender) in &self.subscribers {
            if *client == from {
                continue;
            }
            if sender.send(frame.clone()).is_err() {
                gone.push(client.clone());
            }
        }
        for client in gone {
            self.subscribers.remove(&client);
        }
    }
}
