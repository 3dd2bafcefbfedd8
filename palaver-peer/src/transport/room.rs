use crate::error::TransportError;
use crate::transport::{SignalingTransport, TransportEvent};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use palaver_core::{RoomId, SignalEnvelope};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

/// Where to find the shared room.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Relay base URL, e.g. `ws://127.0.0.1:7700`.
    pub relay_url: String,
    pub room: RoomId,
}

impl RoomConfig {
    pub fn new(relay_url: impl Into<String>, room: RoomId) -> Self {
        Self {
            relay_url: relay_url.into(),
            room,
        }
    }

    fn room_url(&self) -> String {
        format!(
            "{}/rooms/{}",
            self.relay_url.trim_end_matches('/'),
            self.room
        )
    }
}

/// Shared-room signaling: both parties subscribe to one append-only room
/// log on a relay, found through a shared room id. Delivery order is the
/// relay's append order; late subscribers get the backlog replayed first,
/// so unattended operation works.
pub struct RoomTransport {
    config: RoomConfig,
    outbound: Mutex<Option<mpsc::UnboundedSender<SignalEnvelope>>>,
}

impl RoomTransport {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            outbound: Mutex::new(None),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.config.room
    }
}

#[async_trait]
impl SignalingTransport for RoomTransport {
    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError> {
        if self.outbound.lock().is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let url = self.config.room_url();
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("joined signaling room {}", self.config.room);

        let (mut write, mut read) = socket.split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<SignalEnvelope>();

        let _ = event_tx.send(TransportEvent::Opened);

        let write_events = event_tx.clone();
        tokio::spawn(async move {
            while let Some(envelope) = out_rx.recv().await {
                let json = match serde_json::to_string(&envelope) {
                    Ok(json) => json,
                    Err(e) => {
                        let _ = write_events.send(TransportEvent::Error(e.into()));
                        continue;
                    }
                };
                if let Err(e) = write.send(WsMessage::Text(json)).await {
                    let _ = write_events
                        .send(TransportEvent::Error(TransportError::Send(e.to_string())));
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<SignalEnvelope>(&text) {
                            Ok(envelope) => {
                                debug!("room delivered {}", envelope.payload.kind());
                                let _ = event_tx.send(TransportEvent::Message(envelope));
                            }
                            Err(e) => {
                                warn!("room delivered malformed payload: {}", e);
                                let _ = event_tx.send(TransportEvent::Error(e.into()));
                            }
                        }
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = event_tx
                            .send(TransportEvent::Error(TransportError::Connect(e.to_string())));
                        break;
                    }
                }
            }
        });

        *self.outbound.lock() = Some(out_tx);
        Ok(event_rx)
    }

    async fn send(&self, envelope: SignalEnvelope) -> Result<(), TransportError> {
        let outbound = self.outbound.lock();
        let Some(outbound) = outbound.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        outbound
            .send(envelope)
            .map_err(|_| TransportError::Send("room connection is gone".into()))
    }
}
