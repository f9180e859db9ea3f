use crate::models::ChatMessage;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Live fan-out for conversation channels, keyed by match id.
///
/// Each match gets its own broadcast channel, created lazily on first use.
/// Subscribers receive only messages published after they subscribed;
/// callers wanting full continuity read `history` first and deduplicate by
/// message id. Dropping a receiver cancels that subscription with no
/// residual delivery.
pub struct ConversationHub {
    senders: DashMap<Uuid, broadcast::Sender<ChatMessage>>,
    capacity: usize,
}

impl ConversationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: DashMap::new(),
            capacity,
        }
    }

    fn sender(&self, match_id: Uuid) -> broadcast::Sender<ChatMessage> {
        self.senders
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Deliver a committed message to the match's current subscribers.
    /// A channel with no subscribers drops the message; history is the
    /// durable record, not the hub.
    pub fn publish(&self, message: ChatMessage) {
        let match_id = message.match_id;
        let delivered = self.sender(match_id).send(message).unwrap_or(0);
        tracing::trace!("Published to {} subscribers on match {}", delivered, match_id);
    }

    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<ChatMessage> {
        self.sender(match_id).subscribe()
    }

    /// Close a match's channel; active subscribers observe end-of-stream.
    /// Used by the reset cascade.
    pub fn close(&self, match_id: Uuid) {
        self.senders.remove(&match_id);
    }

    pub fn subscriber_count(&self, match_id: Uuid) -> usize {
        self.senders
            .get(&match_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ConversationHub {
    fn default() -> Self {
        Self::new(256)
    }
}
