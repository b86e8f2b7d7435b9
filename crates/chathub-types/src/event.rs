//! Events pushed to relay hub clients.
//!
//! Every event is scoped to a chat; only clients that joined that chat's
//! group receive it. Serialized as internally tagged JSON
//! (`{"type": "chat_edited", ...}`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{ChatMessage, ChatSession};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A session's title, system description or memory balance changed.
    ChatEdited { chat_id: Uuid, session: ChatSession },

    /// A user joined the chat.
    UserJoined { chat_id: Uuid, user_id: String },

    /// A client relayed a message to the rest of the group.
    ReceiveMessage {
        chat_id: Uuid,
        sender_id: String,
        message: serde_json::Value,
    },

    /// A user started or stopped typing.
    UserTyping {
        chat_id: Uuid,
        user_id: String,
        is_typing: bool,
    },

    /// A document was imported into the chat's memory.
    DocumentUploaded { chat_id: Uuid, message: ChatMessage },
}

impl RelayEvent {
    /// The chat group this event is delivered to.
    pub fn chat_id(&self) -> Uuid {
        match self {
            RelayEvent::ChatEdited { chat_id, .. }
            | RelayEvent::UserJoined { chat_id, .. }
            | RelayEvent::ReceiveMessage { chat_id, .. }
            | RelayEvent::UserTyping { chat_id, .. }
            | RelayEvent::DocumentUploaded { chat_id, .. } => *chat_id,
        }
    }

    /// Connection id that originated the event, if it should not be echoed back.
    pub fn sender(&self) -> Option<&str> {
        match self {
            RelayEvent::ReceiveMessage { sender_id, .. } => Some(sender_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let chat_id = Uuid::now_v7();
        let event = RelayEvent::UserJoined {
            chat_id,
            user_id: "u1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "user_joined");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(event.chat_id(), chat_id);
        assert!(event.sender().is_none());
    }
}
