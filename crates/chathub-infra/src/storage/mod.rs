//! Storage backends and their startup selection.
//!
//! The configured `chat_store.type` picks one backend for all four entity
//! types. [`AnyStorageContext`] is the tagged variant handed to the
//! repositories so the rest of the system stays generic over a single type.

pub mod cosmos;
pub mod filesystem;
pub mod volatile;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chathub_core::storage::StorageContext;
use chathub_types::chat::{ChatMessage, ChatParticipant, ChatSession, MemorySource};
use chathub_types::config::{ChatStoreOptions, ChatStoreType, CosmosOptions};
use chathub_types::error::{ConfigError, RepositoryError};
use chathub_types::storage::{Filter, StorageEntity};
use uuid::Uuid;

pub use cosmos::{CosmosClient, CosmosConnection, CosmosContext};
pub use filesystem::FileSystemContext;
pub use volatile::VolatileContext;

/// Storage context for entity type `T`, backed by whichever store was configured.
pub enum AnyStorageContext<T> {
    Volatile(VolatileContext<T>),
    Filesystem(FileSystemContext<T>),
    Cosmos(CosmosContext<T>),
}

impl<T> AnyStorageContext<T> {
    pub fn kind(&self) -> ChatStoreType {
        match self {
            AnyStorageContext::Volatile(_) => ChatStoreType::Volatile,
            AnyStorageContext::Filesystem(_) => ChatStoreType::Filesystem,
            AnyStorageContext::Cosmos(_) => ChatStoreType::Cosmos,
        }
    }
}

impl<T: StorageEntity> StorageContext<T> for AnyStorageContext<T> {
    async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        match self {
            AnyStorageContext::Volatile(ctx) => ctx.create(entity).await,
            AnyStorageContext::Filesystem(ctx) => ctx.create(entity).await,
            AnyStorageContext::Cosmos(ctx) => ctx.create(entity).await,
        }
    }

    async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        match self {
            AnyStorageContext::Volatile(ctx) => ctx.upsert(entity).await,
            AnyStorageContext::Filesystem(ctx) => ctx.upsert(entity).await,
            AnyStorageContext::Cosmos(ctx) => ctx.upsert(entity).await,
        }
    }

    async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        match self {
            AnyStorageContext::Volatile(ctx) => ctx.try_find_by_id(id).await,
            AnyStorageContext::Filesystem(ctx) => ctx.try_find_by_id(id).await,
            AnyStorageContext::Cosmos(ctx) => ctx.try_find_by_id(id).await,
        }
    }

    async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        match self {
            AnyStorageContext::Volatile(ctx) => ctx.find_by_field(filter).await,
            AnyStorageContext::Filesystem(ctx) => ctx.find_by_field(filter).await,
            AnyStorageContext::Cosmos(ctx) => ctx.find_by_field(filter).await,
        }
    }
}

/// One storage context per entity type, all on the same backend.
pub struct ChatStores {
    pub sessions: AnyStorageContext<ChatSession>,
    pub messages: AnyStorageContext<ChatMessage>,
    pub participants: AnyStorageContext<ChatParticipant>,
    pub sources: AnyStorageContext<MemorySource>,
}

/// Build the storage contexts selected by `options`.
///
/// A selected backend without its option section is a [`ConfigError`].
pub async fn build_chat_stores(options: &ChatStoreOptions) -> anyhow::Result<ChatStores> {
    match options.kind {
        ChatStoreType::Volatile => {
            tracing::info!("Using volatile chat store; data is lost on restart");
            Ok(ChatStores {
                sessions: AnyStorageContext::Volatile(VolatileContext::new()),
                messages: AnyStorageContext::Volatile(VolatileContext::new()),
                participants: AnyStorageContext::Volatile(VolatileContext::new()),
                sources: AnyStorageContext::Volatile(VolatileContext::new()),
            })
        }
        ChatStoreType::Filesystem => {
            let fs = options.filesystem.as_ref().ok_or(ConfigError::MissingSection {
                option: "chat_store",
                kind: "Filesystem",
                section: "chat_store.filesystem",
            })?;
            let base = Path::new(&fs.file_path);
            tracing::info!(base = %base.display(), "Using filesystem chat store");
            Ok(ChatStores {
                sessions: AnyStorageContext::Filesystem(open_file_store(base).await?),
                messages: AnyStorageContext::Filesystem(open_file_store(base).await?),
                participants: AnyStorageContext::Filesystem(open_file_store(base).await?),
                sources: AnyStorageContext::Filesystem(open_file_store(base).await?),
            })
        }
        ChatStoreType::Cosmos => {
            let cosmos = options.cosmos.as_ref().ok_or(ConfigError::MissingSection {
                option: "chat_store",
                kind: "Cosmos",
                section: "chat_store.cosmos",
            })?;
            build_cosmos_stores(cosmos)
        }
    }
}

async fn open_file_store<T: StorageEntity>(base: &Path) -> anyhow::Result<FileSystemContext<T>> {
    FileSystemContext::open(base)
        .await
        .with_context(|| format!("failed to open {} store under {}", T::KIND, base.display()))
}

fn build_cosmos_stores(options: &CosmosOptions) -> anyhow::Result<ChatStores> {
    let connection = CosmosConnection::parse(&options.connection_string)?;
    tracing::info!(
        endpoint = %connection.endpoint,
        database = %options.database,
        "Using Cosmos DB chat store"
    );
    let client = Arc::new(CosmosClient::new(
        connection,
        Duration::from_secs(options.request_timeout_secs),
    )?);

    fn context<T: StorageEntity>(client: &Arc<CosmosClient>, options: &CosmosOptions) -> AnyStorageContext<T> {
        AnyStorageContext::Cosmos(CosmosContext::new(
            Arc::clone(client),
            options.database.clone(),
            options.container_for(T::KIND).to_string(),
        ))
    }

    Ok(ChatStores {
        sessions: context(&client, options),
        messages: context(&client, options),
        participants: context(&client, options),
        sources: context(&client, options),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chathub_types::config::FileSystemOptions;
    use tempfile::TempDir;

    #[tokio::test]
    async fn volatile_is_the_default() {
        let stores = build_chat_stores(&ChatStoreOptions::default()).await.unwrap();
        assert_eq!(stores.sessions.kind(), ChatStoreType::Volatile);
        assert_eq!(stores.sources.kind(), ChatStoreType::Volatile);
    }

    #[tokio::test]
    async fn volatile_scenario_create_find_conflict() {
        let stores = build_chat_stores(&ChatStoreOptions::default()).await.unwrap();
        let session = ChatSession::new("A", "desc", 0.5);
        stores.sessions.create(&session).await.unwrap();
        assert_eq!(
            stores.sessions.try_find_by_id(&session.id).await.unwrap(),
            Some(session.clone())
        );
        assert!(matches!(
            stores.sessions.create(&session).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn filesystem_stores_write_separate_files() {
        let tmp = TempDir::new().unwrap();
        let options = ChatStoreOptions {
            kind: ChatStoreType::Filesystem,
            filesystem: Some(FileSystemOptions {
                file_path: tmp.path().join("chats.json").display().to_string(),
            }),
            cosmos: None,
        };
        let stores = build_chat_stores(&options).await.unwrap();
        assert_eq!(stores.messages.kind(), ChatStoreType::Filesystem);

        let session = ChatSession::new("Files", "desc", 0.5);
        stores.sessions.create(&session).await.unwrap();
        stores
            .messages
            .create(&ChatMessage::from_bot(session.id, "hi"))
            .await
            .unwrap();

        assert!(tmp.path().join("chats_sessions.json").exists());
        assert!(tmp.path().join("chats_messages.json").exists());
        assert!(!tmp.path().join("chats_participants.json").exists());
    }

    #[tokio::test]
    async fn cosmos_without_section_is_config_error() {
        let options = ChatStoreOptions {
            kind: ChatStoreType::Cosmos,
            filesystem: None,
            cosmos: None,
        };
        let err = build_chat_stores(&options).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingSection { .. })
        ));
    }

    #[tokio::test]
    async fn cosmos_bad_connection_string_is_config_error() {
        let options = ChatStoreOptions {
            kind: ChatStoreType::Cosmos,
            filesystem: None,
            cosmos: Some(CosmosOptions {
                connection_string: "AccountEndpoint=https://x;".to_string(),
                database: "db".to_string(),
                chat_sessions_container: "s".to_string(),
                chat_messages_container: "m".to_string(),
                chat_participants_container: "p".to_string(),
                chat_memory_sources_container: "ms".to_string(),
                ..Default::default()
            }),
        };
        let err = build_chat_stores(&options).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn cosmos_contexts_use_configured_containers() {
        let (_fake, connection) = cosmos::fake::start().await;
        let options = ChatStoreOptions {
            kind: ChatStoreType::Cosmos,
            filesystem: None,
            cosmos: Some(CosmosOptions {
                connection_string: connection,
                database: "db".to_string(),
                chat_sessions_container: "sessions".to_string(),
                chat_messages_container: "messages".to_string(),
                chat_participants_container: "participants".to_string(),
                chat_memory_sources_container: "sources".to_string(),
                ..Default::default()
            }),
        };
        let stores = build_chat_stores(&options).await.unwrap();
        match &stores.participants {
            AnyStorageContext::Cosmos(ctx) => assert_eq!(ctx.container(), "participants"),
            _ => panic!("expected a Cosmos context"),
        }

        let participant = ChatParticipant::new("alice", Uuid::now_v7());
        stores.participants.create(&participant).await.unwrap();
        assert_eq!(
            stores.participants.try_find_by_id(&participant.id).await.unwrap(),
            Some(participant)
        );
    }
}
