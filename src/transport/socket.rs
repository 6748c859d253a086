// ABOUTME: Persistent WebSocket channel adapter, room-scoped by conversation id.
// ABOUTME: Writer task drains an outbound queue; reader task decodes events for the router.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use banter_core::traits::{ChannelEvent, EventChannel};

/// Frames from the client to the server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ClientFrame {
    #[serde(rename = "join_room")]
    JoinRoom { conversation_id: String },
    #[serde(rename = "send_message")]
    SendMessage {
        conversation_id: String,
        text: String,
    },
}

/// Frames from the server to the client
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ServerFrame {
    #[serde(rename = "receive_message")]
    ReceiveMessage { text: String },
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<ServerFrame> for ChannelEvent {
    fn from(frame: ServerFrame) -> Self {
        match frame {
            ServerFrame::ReceiveMessage { text } => ChannelEvent::MessageReceived { text },
            ServerFrame::Error { message } => ChannelEvent::Fault { message },
        }
    }
}

/// Persistent channel over a WebSocket, opened once at activation and
/// closed on client teardown. Room membership is switched on conversation
/// selection; replies arrive out-of-band as `ChannelEvent`s.
pub struct SocketTransport {
    outbound: mpsc::Sender<ClientFrame>,
    events: broadcast::Sender<ChannelEvent>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl SocketTransport {
    /// Connect and spawn the reader/writer tasks.
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .context("WebSocket connect failed")?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ClientFrame>(64);
        let (event_tx, _) = broadcast::channel(256);

        let writer_task = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize outbound frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    tracing::debug!("WebSocket send failed, writer stopping");
                    break;
                }
            }
        });

        let reader_events = event_tx.clone();
        let reader_task = tokio::spawn(async move {
            while let Some(result) = source.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        let frame: ServerFrame = match serde_json::from_str(&text) {
                            Ok(f) => f,
                            Err(e) => {
                                tracing::debug!(error = %e, "Invalid frame from server");
                                continue;
                            }
                        };
                        let _ = reader_events.send(frame.into());
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed the persistent channel");
                        let _ = reader_events.send(ChannelEvent::Fault {
                            message: "connection closed".to_string(),
                        });
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "WebSocket read error");
                        let _ = reader_events.send(ChannelEvent::Fault {
                            message: e.to_string(),
                        });
                        break;
                    }
                }
            }
        });

        tracing::info!(url = %url, "Persistent channel connected");

        Ok(Self {
            outbound: outbound_tx,
            events: event_tx,
            writer_task,
            reader_task,
        })
    }

    /// Tear the channel down. Safe to call once at client shutdown.
    pub fn close(&self) {
        self.writer_task.abort();
        self.reader_task.abort();
    }

    async fn enqueue(&self, frame: ClientFrame) -> Result<()> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| anyhow::anyhow!("persistent channel closed"))
    }
}

#[async_trait]
impl EventChannel for SocketTransport {
    async fn join_room(&self, conversation_id: &str) -> Result<()> {
        self.enqueue(ClientFrame::JoinRoom {
            conversation_id: conversation_id.to_string(),
        })
        .await
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()> {
        self.enqueue(ClientFrame::SendMessage {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_serializes_with_type_tag() {
        let frame = ClientFrame::JoinRoom {
            conversation_id: "conv_1".to_string(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "join_room");
        assert_eq!(json["conversation_id"], "conv_1");

        let frame = ClientFrame::SendMessage {
            conversation_id: "conv_1".to_string(),
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "send_message");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_server_frame_decodes_message_and_error() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"receive_message","text":"hi"}"#).unwrap();
        assert_eq!(
            ChannelEvent::from(frame),
            ChannelEvent::MessageReceived {
                text: "hi".to_string()
            }
        );

        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"error","message":"room closed"}"#).unwrap();
        assert_eq!(
            ChannelEvent::from(frame),
            ChannelEvent::Fault {
                message: "room closed".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_server_frame_is_a_parse_error() {
        let parsed = serde_json::from_str::<ServerFrame>(r#"{"type":"presence","user":"x"}"#);
        assert!(parsed.is_err());
    }
}
