// ABOUTME: View-facing events broadcast by the dispatch router.
// ABOUTME: Keeps the core UI-free; the embedding surface subscribes and renders.

use tokio::sync::broadcast;

use crate::store::Message;

/// UI-affecting side effects of dispatching.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// A message was appended to a conversation.
    MessageAppended {
        conversation_id: String,
        message: Message,
    },
    /// The pending indicator changed; the send affordance must be disabled
    /// while pending is true.
    PendingChanged {
        conversation_id: String,
        pending: bool,
    },
    /// A blocking notice for a validation fault. No message was created.
    Notice { text: String },
    /// Input focus should return to the composer.
    ComposerFocus,
}

/// Hub for broadcasting view events to whoever embeds the core.
#[derive(Clone)]
pub struct ViewHub {
    sender: broadcast::Sender<ViewEvent>,
}

impl ViewHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Broadcast an event. Send errors (no subscribers) are ignored.
    pub fn broadcast(&self, event: ViewEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }
}

impl Default for ViewHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hub_delivers_to_subscriber() {
        let hub = ViewHub::new();
        let mut rx = hub.subscribe();
        hub.broadcast(ViewEvent::ComposerFocus);
        assert!(matches!(rx.recv().await, Ok(ViewEvent::ComposerFocus)));
    }

    #[test]
    fn test_hub_broadcast_without_subscribers_is_noop() {
        let hub = ViewHub::new();
        hub.broadcast(ViewEvent::Notice {
            text: "select a conversation".to_string(),
        });
    }
}
