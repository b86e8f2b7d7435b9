//! JSON-file storage context.
//!
//! Each entity type lives in its own file holding an id-to-entity map. The
//! file is read once when the context is opened and rewritten in full after
//! every mutation. Writes go to a sibling `.tmp` file that is then renamed
//! over the original.
//!
//! Only one process may write a given file at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chathub_core::storage::StorageContext;
use chathub_types::error::RepositoryError;
use chathub_types::storage::{EntityKind, Filter, StorageEntity};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Derive the file for `kind` from the configured base path by inserting the
/// kind's suffix before the extension.
///
/// `data/chats.json` becomes `data/chats_sessions.json`,
/// `data/chats_messages.json`, and so on.
pub fn path_for(base: &Path, kind: EntityKind) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}{}.{}", kind.file_suffix(), ext.to_string_lossy()),
        None => format!("{stem}{}", kind.file_suffix()),
    };
    base.with_file_name(file_name)
}

/// File-backed storage context for one entity type.
pub struct FileSystemContext<T> {
    path: PathBuf,
    items: Mutex<HashMap<Uuid, T>>,
}

impl<T: StorageEntity> FileSystemContext<T> {
    /// Open the store for `T` under `base`, loading any existing records.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub async fn open(base: &Path) -> Result<Self, RepositoryError> {
        let path = path_for(base, T::KIND);
        let items = load_items(&path).await?;
        tracing::debug!(
            path = %path.display(),
            count = items.len(),
            "Opened {} store",
            T::KIND
        );
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// File this context persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, items: &HashMap<Uuid, T>) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(items)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| io_error(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

async fn load_items<T: StorageEntity>(path: &Path) -> Result<HashMap<Uuid, T>, RepositoryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(HashMap::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            RepositoryError::Serialization(format!("{}: {e}", path.display()))
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(err) => Err(io_error(path, err)),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Io(format!("{}: {err}", path.display()))
}

impl<T: StorageEntity> StorageContext<T> for FileSystemContext<T> {
    async fn create(&self, entity: &T) -> Result<(), RepositoryError> {
        let id = entity.id();
        let mut items = self.items.lock().await;
        if items.contains_key(&id) {
            return Err(RepositoryError::Conflict(format!(
                "{} entity {id} already exists",
                T::KIND
            )));
        }

        items.insert(id, entity.clone());
        if let Err(err) = self.persist(&items).await {
            items.remove(&id);
            return Err(err);
        }
        Ok(())
    }

    async fn upsert(&self, entity: &T) -> Result<(), RepositoryError> {
        let id = entity.id();
        let mut items = self.items.lock().await;
        let previous = items.insert(id, entity.clone());
        if let Err(err) = self.persist(&items).await {
            match previous {
                Some(old) => items.insert(id, old),
                None => items.remove(&id),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn try_find_by_id(&self, id: &Uuid) -> Result<Option<T>, RepositoryError> {
        Ok(self.items.lock().await.get(id).cloned())
    }

    async fn find_by_field(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        Ok(self
            .items
            .lock()
            .await
            .values()
            .filter(|e| filter.matches_entity(*e))
            .cloned()
            .collect())
    }
}
