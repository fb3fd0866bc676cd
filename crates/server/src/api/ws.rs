//! WebSocket support for real-time dashboard updates.
//!
//! Each connection is one broadcast hub subscriber. The first frame is the
//! `initial_state` snapshot; every later pipeline event follows in order.
//! A client too slow to keep up is sent a close frame (code 1013) rather than
//! left connected and silently missing events.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use governor_core::PipelineEvent;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Close reason sent when the hub drops a subscriber that fell behind.
pub const SUBSCRIBER_DROPPED_REASON: &str = "subscriber dropped: event queue overflow";

/// Replies to client control frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlMessage {
    Pong,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
///
/// The connection lives as long as both directions do: a client close ends
/// the send task, and a send task that stops (hub dropped the subscriber or
/// the socket failed) ends the receive loop.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let mut subscription = match state.engine().subscribe() {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("Failed to subscribe WebSocket client: {}", e);
            return;
        }
    };
    let subscriber_id = subscription.id();
    let (mut sender, mut receiver) = socket.split();
    let (control_tx, mut control_rx) = mpsc::channel::<ControlMessage>(8);

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!(subscriber = ?subscriber_id, "WebSocket client connected");

    // Forward hub events and control replies to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let (msg_type, json) = tokio::select! {
                event = subscription.recv() => {
                    let Some(event) = event else {
                        // The hub only closes a queue it gave up on; tell the
                        // client so it can reconnect for a fresh snapshot.
                        warn!("Subscriber dropped by hub, closing WebSocket");
                        let _ = sender.send(Message::Close(Some(CloseFrame {
                            code: close_code::AGAIN,
                            reason: Utf8Bytes::from_static(SUBSCRIBER_DROPPED_REASON),
                        }))).await;
                        break;
                    };
                    (event.event_type(), serialize_event(&event))
                }
                Some(control) = control_rx.recv() => {
                    ("pong", serde_json::to_string(&control).map_err(|e| e.to_string()))
                }
            };

            let json = match json {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize WebSocket message: {}", e);
                    continue;
                }
            };

            WS_MESSAGES_SENT.with_label_values(&[msg_type]).inc();
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("WebSocket send failed, client disconnected");
                break;
            }
        }
    });

    // Handle incoming messages from client (ping, close) until either side ends
    loop {
        let incoming = tokio::select! {
            _ = &mut send_task => {
                debug!("WebSocket send side finished");
                break;
            }
            incoming = receiver.next() => incoming,
        };

        match incoming {
            None => break,
            Some(Ok(Message::Close(_))) => {
                debug!("WebSocket client requested close");
                break;
            }
            Some(Ok(Message::Text(text))) if text.as_str().trim() == "ping" => {
                if control_tx.send(ControlMessage::Pong).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Text(text))) => {
                debug!("Ignoring text message: {}", text.as_str());
            }
            Some(Ok(_)) => {
                // Protocol pings are answered by axum
            }
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    state.engine().hub().unsubscribe(subscriber_id);
    WS_CONNECTIONS_ACTIVE.dec();
    info!(subscriber = ?subscriber_id, "WebSocket client disconnected");
}

fn serialize_event(event: &PipelineEvent) -> Result<String, String> {
    serde_json::to_string(event).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_wire_format() {
        let json = serde_json::to_string(&ControlMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
