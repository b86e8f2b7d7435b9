//! Azure Cosmos DB storage context (SQL API over REST).
//!
//! One container per entity type. Documents are the serialized entities, so
//! the `id` field doubles as the Cosmos document id. Lookups are
//! cross-partition queries.

pub mod client;
pub mod query;
pub mod signature;

use std::marker::PhantomData;
use std::sync::Arc;

use chathub_core::storage::StorageContext;
use chathub_types::error::RepositoryError;
use chathub_types::storage::{Filter, StorageEntity};
use serde_json::Value;
use uuid::Uuid;

pub use client::CosmosClient;
pub use query::SqlQuery;
pub use signature::CosmosConnection;

/// Storage context bound to one Cosmos DB container.
pub struct CosmosContext<T> {
    client: Arc<CosmosClient>,
    database: String,
    container: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: StorageEntity> CosmosContext<T> {
    pub fn new(client: Arc<CosmosClient>, database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
            container: container.into(),
            _entity: PhantomData,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    async fn write(&self, entity: &T, upsert: bool) -> Result<(), RepositoryError> {
        let document =
            serde_json::to_value(entity).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.client
            .write_document(&self.database, &self.container, &entity.partition(), &document, upsert)
            .await
    }

    async fn query(&self, query: &SqlQuery) -> Result<Vec<T>, RepositoryError> {
        self.client
            .query_documents(&self.database, &self.container, query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}

fn decode<T: StorageEntity>(document: Value) -> Result<T, RepositoryError> {
    serde_json::from_value(document).map_err(|e| {
        RepositoryError::Serialization(format!("invalid {} document: {e}", T::KIND))
    })
}

impl<T: StorageEntity> StorageContext<T> for CosmosContext<T> {
    async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        self.write(entity, false).await
    }

    async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        self.write(entity, true).await
    }

    async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        Ok(self.query(&SqlQuery::by_id(id)).await?.into_iter().next())
    }

    async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        self.query(&SqlQuery::select(filter)).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chathub_types::chat::{CHAT_ID_FIELD, ChatMessage, ChatSession};

    async fn client() -> (fake::FakeCosmos, Arc<CosmosClient>) {
        let (fake, connection) = fake::start().await;
        let connection = CosmosConnection::parse(&connection).unwrap();
        let client = CosmosClient::new(connection, Duration::from_secs(5)).unwrap();
        (fake, Arc::new(client))
    }

    #[tokio::test]
    async fn create_find_and_conflict() {
        let (_fake, client) = client().await;
        let sessions = CosmosContext::<ChatSession>::new(client, "db", "chatsessions");

        let session = ChatSession::new("Remote", "desc", 0.5);
        sessions.create(&session).await.unwrap();
        assert_eq!(
            sessions.try_find_by_id(&session.id).await.unwrap(),
            Some(session.clone())
        );
        assert!(matches!(
            sessions.create(&session).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(sessions.try_find_by_id(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_document() {
        let (fake, client) = client().await;
        let sessions = CosmosContext::<ChatSession>::new(client, "db", "chatsessions");

        let session = ChatSession::new("Before", "desc", 0.5);
        sessions.create(&session).await.unwrap();
        let mut edited = session.clone();
        edited.title = "After".to_string();
        edited.memory_balance = 0.25;
        sessions.upsert(&edited).await.unwrap();

        assert_eq!(sessions.try_find_by_id(&session.id).await.unwrap(), Some(edited));
        assert_eq!(fake.containers.lock().unwrap()["chatsessions"].len(), 1);
    }

    #[tokio::test]
    async fn find_by_field_follows_continuation() {
        let (fake, client) = client().await;
        let messages = CosmosContext::<ChatMessage>::new(client, "db", "chatmessages");

        let chat = Uuid::now_v7();
        for i in 0..5 {
            messages
                .create(&ChatMessage::from_user(chat, "u", "U", format!("m{i}")))
                .await
                .unwrap();
        }
        messages
            .create(&ChatMessage::from_bot(Uuid::now_v7(), "other chat"))
            .await
            .unwrap();

        *fake.query_requests.lock().unwrap() = 0;
        let found = messages
            .find_by_field(&Filter::eq(CHAT_ID_FIELD, chat.to_string()))
            .await
            .unwrap();
        assert_eq!(found.len(), 5);
        assert!(found.iter().all(|m| m.chat_id == chat));
        assert_eq!(*fake.query_requests.lock().unwrap(), 3);
    }
}
