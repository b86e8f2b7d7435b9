//! In-memory storage context. Contents are lost on restart.

use chathub_core::storage::StorageContext;
use chathub_types::error::RepositoryError;
use chathub_types::storage::{Filter, StorageEntity};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// Concurrent map from entity id to entity.
pub struct VolatileContext<T> {
    items: DashMap<Uuid, T>,
}

impl<T> VolatileContext<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for VolatileContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StorageEntity> StorageContext<T> for VolatileContext<T> {
    async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        match self.items.entry(entity.id()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "{} entity {} already exists",
                T::KIND,
                entity.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entity.clone());
                Ok(())
            }
        }
    }

    async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        self.items.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        Ok(self.items.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        Ok(self
            .items
            .iter()
            .filter(|entry| filter.matches_entity(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }
}
