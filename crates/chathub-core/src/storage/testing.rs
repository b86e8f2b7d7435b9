//! Map-backed storage context for unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use chathub_types::error::RepositoryError;
use chathub_types::storage::{Filter, StorageEntity};
use uuid::Uuid;

use super::StorageContext;

pub(crate) struct MapContext<T> {
    items: Mutex<HashMap<Uuid, T>>,
}

impl<T> MapContext<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: StorageEntity> StorageContext<T> for MapContext<T> {
    async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        if items.contains_key(&entity.id()) {
            return Err(RepositoryError::Conflict(entity.id().to_string()));
        }
        items.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        self.items.lock().unwrap().insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        Ok(self.items.lock().unwrap().get(id).cloned())
    }

    async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|e| filter.matches_entity(*e))
            .cloned()
            .collect())
    }
}
