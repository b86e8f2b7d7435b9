//! Chat session, message, participant, and memory source types.
//!
//! These are plain records persisted through a storage context. The serialized
//! form uses camelCase field names and is identical across backends.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{EntityKind, StorageEntity};

/// Serialized name of the chat id field (messages, participants, sources).
pub const CHAT_ID_FIELD: &str = "chatId";
/// Serialized name of the user id field (participants).
pub const USER_ID_FIELD: &str = "userId";
/// Serialized name of the memory source name field.
pub const NAME_FIELD: &str = "name";

/// Default share of chat memory vs. document memory used for a new session.
pub const DEFAULT_MEMORY_BALANCE: f32 = 0.5;

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub created_on: DateTime<Utc>,
    /// System prompt describing the assistant's persona for this chat.
    pub system_description: String,
    /// Balance between long-term and working memory (0.0..=1.0).
    pub memory_balance: f32,
    #[serde(default)]
    pub enabled_plugins: Vec<String>,
}

impl ChatSession {
    pub fn new(title: impl Into<String>, system_description: impl Into<String>, memory_balance: f32) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            created_on: Utc::now(),
            system_description: system_description.into(),
            memory_balance,
            enabled_plugins: Vec::new(),
        }
    }
}

impl StorageEntity for ChatSession {
    const KIND: EntityKind = EntityKind::ChatSessions;

    fn id(&self) -> Uuid {
        self.id
    }

    fn partition(&self) -> String {
        self.id.to_string()
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorRole {
    User,
    Bot,
}

impl fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorRole::User => write!(f, "User"),
            AuthorRole::Bot => write!(f, "Bot"),
        }
    }
}

impl FromStr for AuthorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(AuthorRole::User),
            "bot" => Ok(AuthorRole::Bot),
            other => Err(format!("invalid author role: '{other}'")),
        }
    }
}

/// Kind of content a chat message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChatMessageType {
    #[default]
    Message,
    Plan,
    Document,
}

/// A single message within a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub author_role: AuthorRole,
    #[serde(rename = "type", default)]
    pub message_type: ChatMessageType,
    /// Token usage per prompt stage, when the message was produced by a model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<BTreeMap<String, u32>>,
}

/// User id recorded on messages authored by the assistant.
pub const BOT_USER_ID: &str = "bot";
/// Display name recorded on messages authored by the assistant.
pub const BOT_USER_NAME: &str = "Bot";

impl ChatMessage {
    /// A message written by the assistant.
    pub fn from_bot(chat_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            chat_id,
            timestamp: Utc::now(),
            user_id: BOT_USER_ID.to_string(),
            user_name: BOT_USER_NAME.to_string(),
            content: content.into(),
            author_role: AuthorRole::Bot,
            message_type: ChatMessageType::Message,
            token_usage: None,
        }
    }

    /// A message written by a user.
    pub fn from_user(
        chat_id: Uuid,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            chat_id,
            timestamp: Utc::now(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            content: content.into(),
            author_role: AuthorRole::User,
            message_type: ChatMessageType::Message,
            token_usage: None,
        }
    }

    pub fn with_type(mut self, message_type: ChatMessageType) -> Self {
        self.message_type = message_type;
        self
    }
}

impl StorageEntity for ChatMessage {
    const KIND: EntityKind = EntityKind::ChatMessages;

    fn id(&self) -> Uuid {
        self.id
    }

    fn partition(&self) -> String {
        self.chat_id.to_string()
    }
}

/// Membership of a user in a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipant {
    pub id: Uuid,
    pub user_id: String,
    pub chat_id: Uuid,
}

/// Namespace for participant ids derived from (chat, user).
const PARTICIPANT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b3d_4c57_a812_d05e_7f93_c4b1);

impl ChatParticipant {
    /// The id is derived from the pair, so a second record for the same user
    /// and chat collides on `create`.
    pub fn new(user_id: impl Into<String>, chat_id: Uuid) -> Self {
        let user_id = user_id.into();
        Self {
            id: Self::id_for(&user_id, chat_id),
            user_id,
            chat_id,
        }
    }

    pub fn id_for(user_id: &str, chat_id: Uuid) -> Uuid {
        Uuid::new_v5(&PARTICIPANT_NAMESPACE, format!("{chat_id}/{user_id}").as_bytes())
    }
}

impl StorageEntity for ChatParticipant {
    const KIND: EntityKind = EntityKind::ChatParticipants;

    fn id(&self) -> Uuid {
        self.id
    }

    fn partition(&self) -> String {
        self.user_id.clone()
    }
}

/// Where a memory source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemorySourceType {
    File,
    Web,
}

/// A document or link whose content was imported into a chat's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySource {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyper_link: Option<String>,
    pub source_type: MemorySourceType,
    /// User id of whoever shared the source.
    pub shared_by: String,
    pub created_on: DateTime<Utc>,
    /// Size of the original document in bytes.
    pub size: u64,
    /// Approximate token count of the extracted text.
    pub tokens: u64,
}

impl StorageEntity for MemorySource {
    const KIND: EntityKind = EntityKind::MemorySources;

    fn id(&self) -> Uuid {
        self.id
    }

    fn partition(&self) -> String {
        self.chat_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_serializes_camel_case() {
        let session = ChatSession::new("Planning", "You are helpful.", DEFAULT_MEMORY_BALANCE);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["title"], "Planning");
        assert_eq!(json["systemDescription"], "You are helpful.");
        assert!(json.get("createdOn").is_some());
        assert!(json.get("memoryBalance").is_some());
    }

    #[test]
    fn test_message_type_field_is_named_type() {
        let msg = ChatMessage::from_bot(Uuid::now_v7(), "hi").with_type(ChatMessageType::Document);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Document");
        assert_eq!(json["authorRole"], "Bot");
        assert!(json.get("tokenUsage").is_none());
    }

    #[test]
    fn test_message_type_defaults_when_absent() {
        let chat_id = Uuid::now_v7();
        let json = serde_json::json!({
            "id": Uuid::now_v7(),
            "chatId": chat_id,
            "timestamp": Utc::now(),
            "userId": "u1",
            "userName": "User One",
            "content": "hello",
            "authorRole": "User",
        });
        let msg: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.message_type, ChatMessageType::Message);
        assert_eq!(msg.chat_id, chat_id);
    }

    #[test]
    fn test_partitions() {
        let session = ChatSession::new("t", "d", 0.5);
        assert_eq!(session.partition(), session.id.to_string());

        let participant = ChatParticipant::new("user-1", session.id);
        assert_eq!(participant.partition(), "user-1");

        let msg = ChatMessage::from_user(session.id, "user-1", "User", "hi");
        assert_eq!(msg.partition(), session.id.to_string());
    }

    #[test]
    fn test_participant_id_is_stable_per_pair() {
        let chat = Uuid::now_v7();
        let other = Uuid::now_v7();
        let a = ChatParticipant::new("bob", chat);
        assert_eq!(a.id, ChatParticipant::new("bob", chat).id);
        assert_ne!(a.id, ChatParticipant::new("alice", chat).id);
        assert_ne!(a.id, ChatParticipant::new("bob", other).id);
    }

    #[test]
    fn test_author_role_from_str() {
        assert_eq!("bot".parse::<AuthorRole>().unwrap(), AuthorRole::Bot);
        assert_eq!("User".parse::<AuthorRole>().unwrap(), AuthorRole::User);
        assert!("system".parse::<AuthorRole>().is_err());
    }
}
