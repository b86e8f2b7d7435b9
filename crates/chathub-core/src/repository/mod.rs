//! Typed repositories layered over a storage context.
//!
//! `Repository<T, S>` forwards the four storage operations and each entity
//! type gets its domain lookups as an inherent impl built on `find_by_field`.
//! A repository exclusively owns its storage context.

use std::marker::PhantomData;

use chathub_types::chat::{
    CHAT_ID_FIELD, ChatMessage, ChatParticipant, ChatSession, MemorySource, NAME_FIELD,
    USER_ID_FIELD,
};
use chathub_types::error::RepositoryError;
use chathub_types::storage::{Filter, StorageEntity};
use uuid::Uuid;

use crate::storage::StorageContext;

pub type ChatSessionRepository<S> = Repository<ChatSession, S>;
pub type ChatMessageRepository<S> = Repository<ChatMessage, S>;
pub type ChatParticipantRepository<S> = Repository<ChatParticipant, S>;
pub type MemorySourceRepository<S> = Repository<MemorySource, S>;

/// Repository over a storage context for entity type `T`.
pub struct Repository<T, S> {
    context: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T: StorageEntity, S: StorageContext<T>> Repository<T, S> {
    pub fn new(context: S) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// Access the underlying storage context.
    pub fn context(&self) -> &S {
        &self.context
    }

    pub async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        self.context.create(entity).await
    }

    pub async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        self.context.upsert(entity).await
    }

    pub async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        self.context.try_find_by_id(id).await
    }

    pub async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        self.context.find_by_field(filter).await
    }
}

fn chat_id_filter(chat_id: &Uuid) -> Filter {
    Filter::eq(CHAT_ID_FIELD, chat_id.to_string())
}

impl<S: StorageContext<ChatMessage>> Repository<ChatMessage, S> {
    /// All messages of a chat, in storage order.
    pub async fn find_by_chat_id(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.find_by_field(&chat_id_filter(chat_id)).await
    }

    /// Most recent message of a chat by timestamp.
    pub async fn find_last_by_chat_id(
        &self,
        chat_id: &Uuid,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let messages = self.find_by_chat_id(chat_id).await?;
        Ok(messages.into_iter().max_by_key(|m| m.timestamp))
    }
}

impl<S: StorageContext<ChatParticipant>> Repository<ChatParticipant, S> {
    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<ChatParticipant>, RepositoryError> {
        self.find_by_field(&Filter::eq(USER_ID_FIELD, user_id)).await
    }

    pub async fn find_by_chat_id(&self, chat_id: &Uuid) -> Result<Vec<ChatParticipant>, RepositoryError> {
        self.find_by_field(&chat_id_filter(chat_id)).await
    }

    /// Whether `user_id` has a participant record for `chat_id`.
    pub async fn is_user_in_chat(&self, user_id: &str, chat_id: &Uuid) -> Result<bool, RepositoryError> {
        let filter = Filter::eq(USER_ID_FIELD, user_id).and(chat_id_filter(chat_id));
        Ok(!self.find_by_field(&filter).await?.is_empty())
    }
}

impl<S: StorageContext<MemorySource>> Repository<MemorySource, S> {
    pub async fn find_by_chat_id(&self, chat_id: &Uuid) -> Result<Vec<MemorySource>, RepositoryError> {
        self.find_by_field(&chat_id_filter(chat_id)).await
    }

    /// Sources with the given document name, across all chats.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<MemorySource>, RepositoryError> {
        self.find_by_field(&Filter::eq(NAME_FIELD, name)).await
    }
}
