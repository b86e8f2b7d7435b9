//! Generic persistence interface implemented once per backend.

use chathub_types::error::RepositoryError;
use chathub_types::storage::{Filter, StorageEntity};
use uuid::Uuid;

/// Minimal persistence capability for one entity type.
///
/// Implementations must be safe to call concurrently from many requests.
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait StorageContext<T: StorageEntity>: Send + Sync {
    /// Insert a new entity. Returns `Conflict` if the id already exists.
    fn create(
        &self,
        entity: &T,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert or replace the entity with the same id.
    fn upsert(
        &self,
        entity: &T,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up an entity by id. Absence is `Ok(None)`, never an error.
    fn try_find_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<T>, RepositoryError>> + Send;

    /// All entities matching the filter, in no particular order.
    fn find_by_field(
        &self,
        filter: &Filter,
    ) -> impl std::future::Future<Output = Result<Vec<T>, RepositoryError>> + Send;
}
