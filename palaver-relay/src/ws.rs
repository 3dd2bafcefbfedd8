use crate::room::{RoomCommand, RoomRegistry};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use palaver_core::{PeerId, RoomId, SignalEnvelope};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    let Ok(room_id) = room_id.parse::<RoomId>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, registry))
        .into_response()
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, registry: RoomRegistry) {
    let client = PeerId::new();
    info!("connection {} joined room '{}'", client, room_id);

    let room = registry.room_sender(room_id.as_str());
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    if room
        .send(RoomCommand::Subscribe {
            client: client.clone(),
            sender: tx,
        })
        .await
        .is_err()
    {
        warn!("room '{}' is gone", room_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let room = room.clone();
        let client = client.clone();
        let room_id = room_id.clone();

        async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => {
                        // Validate at the boundary; the log only ever holds
                        // well-formed signaling frames.
                        match serde_json::from_str::<SignalEnvelope>(&text) {
                            Ok(envelope) => {
                                debug!(
                                    "room '{}': {} published {}",
                                    room_id,
                                    client,
                                    envelope.payload.kind()
                                );
                                let cmd = RoomCommand::Publish {
                                    from: client.clone(),
                                    frame: text.to_string(),
                                };
                                if room.send(cmd).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("room '{}': rejected malformed frame: {}", room_id, e)
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = room
                .send(RoomCommand::Unsubscribe {
                    client: client.clone(),
                })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("connection {} left room '{}'", client, room_id);
}
