//! Storage entity contract shared by every backend.
//!
//! An entity type declares which logical collection it lives in
//! ([`EntityKind`]), its unique id and its partition value. Backends use the
//! kind to derive file suffixes (filesystem) or container names (Cosmos).

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// The logical collection an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ChatSessions,
    ChatMessages,
    ChatParticipants,
    MemorySources,
}

impl EntityKind {
    /// Suffix inserted before the extension of the configured filesystem path.
    pub fn file_suffix(self) -> &'static str {
        match self {
            EntityKind::ChatSessions => "_sessions",
            EntityKind::ChatMessages => "_messages",
            EntityKind::ChatParticipants => "_participants",
            EntityKind::MemorySources => "_memorysources",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::ChatSessions => "chat_sessions",
            EntityKind::ChatMessages => "chat_messages",
            EntityKind::ChatParticipants => "chat_participants",
            EntityKind::MemorySources => "memory_sources",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be persisted by a storage context.
///
/// The serialized form is the document stored by every backend, so field
/// names used in [`Filter`]s are the serialized (camelCase) names.
pub trait StorageEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this entity type is stored in.
    const KIND: EntityKind;

    /// Unique id within the collection.
    fn id(&self) -> Uuid;

    /// Partition key value (used by the Cosmos backend).
    fn partition(&self) -> String;
}

/// Field predicate evaluated by `find_by_field`.
///
/// Local backends evaluate it against the serialized entity; the Cosmos
/// backend translates it into a parameterized SQL `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Top-level field equals the given JSON value.
    Eq {
        field: &'static str,
        value: serde_json::Value,
    },
    /// All inner filters match.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<serde_json::Value>) -> Self {
        Filter::Eq {
            field,
            value: value.into(),
        }
    }

    /// Combine with another filter, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Filter::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Filter::And(parts)
    }

    /// Evaluate against a serialized document.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        match self {
            Filter::Eq { field, value } => doc.get(*field) == Some(value),
            Filter::And(parts) => parts.iter().all(|f| f.matches(doc)),
        }
    }

    /// Evaluate against an entity by serializing it first.
    ///
    /// An entity that fails to serialize never matches.
    pub fn matches_entity<T: Serialize>(&self, entity: &T) -> bool {
        serde_json::to_value(entity)
            .map(|doc| self.matches(&doc))
            .unwrap_or(false)
    }
}
