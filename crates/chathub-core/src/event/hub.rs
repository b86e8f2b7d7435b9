//! Broadcast relay hub with per-chat groups.
//!
//! Built on `tokio::sync::broadcast`. Every subscription sees every event;
//! [`RelaySubscription`] filters them down to the chat groups it joined and
//! drops messages it originated. Publishing with no subscribers is a no-op.

use std::collections::HashSet;

use chathub_types::event::RelayEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Multi-consumer relay for chat events.
///
/// Cloning the hub clones the sender, allowing multiple producers.
#[derive(Clone)]
pub struct RelayHub {
    sender: broadcast::Sender<RelayEvent>,
}

impl RelayHub {
    /// Create a hub with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Start a subscription for one client connection.
    pub fn subscribe(&self, connection_id: impl Into<String>) -> RelaySubscription {
        RelaySubscription {
            connection_id: connection_id.into(),
            groups: HashSet::new(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to every subscription joined to the event's chat.
    pub fn publish(&self, event: RelayEvent) {
        let chat_id = event.chat_id();
        if self.sender.send(event).is_err() {
            tracing::trace!(%chat_id, "No relay subscribers, event dropped");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for RelayHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHub")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

/// One client's view of the hub: a set of joined chat groups.
pub struct RelaySubscription {
    connection_id: String,
    groups: HashSet<Uuid>,
    receiver: broadcast::Receiver<RelayEvent>,
}

impl RelaySubscription {
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Join a chat group. Returns `false` if already joined.
    pub fn join(&mut self, chat_id: Uuid) -> bool {
        self.groups.insert(chat_id)
    }

    /// Leave a chat group. Returns `false` if not joined.
    pub fn leave(&mut self, chat_id: &Uuid) -> bool {
        self.groups.remove(chat_id)
    }

    pub fn is_member(&self, chat_id: &Uuid) -> bool {
        self.groups.contains(chat_id)
    }

    fn wants(&self, event: &RelayEvent) -> bool {
        self.groups.contains(&event.chat_id()) && event.sender() != Some(self.connection_id.as_str())
    }

    /// Wait for the next event addressed to one of the joined groups.
    ///
    /// Returns `None` once the hub is gone. Lagged subscriptions skip the
    /// missed events and keep receiving.
    pub async fn recv(&mut self) -> Option<RelayEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        connection_id = %self.connection_id,
                        skipped,
                        "Relay subscriber lagged, skipping events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
