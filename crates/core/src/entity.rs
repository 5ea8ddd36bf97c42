//! Entity record shared by the cache, coordinator and transport
//!
//! Each entity has:
//! - An id, unique within its kind
//! - Exactly one current status drawn from its kind's status set
//! - Free-form fields as delivered by the backend
//! - A `pending` flag, true only while an optimistic transition is in flight

use crate::status::Status;
use crate::types::{EntityId, EntityKey, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form JSON object: entity fields and transition payloads
pub type Payload = serde_json::Map<String, Value>;

/// One business record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Backend id
    pub id: EntityId,
    /// Kind of record
    pub kind: EntityKind,
    /// Current status (optimistic while `pending`)
    pub status: Status,
    /// Remaining backend fields
    pub fields: Payload,
    /// True strictly between an optimistic write and its commit/rollback
    pub pending: bool,
}

impl Entity {
    /// Create an entity with no fields
    ///
    /// The kind is taken from the status, so an entity can never carry a
    /// status of another kind.
    pub fn new(id: impl Into<EntityId>, status: impl Into<Status>) -> Self {
        let status = status.into();
        Self {
            id: id.into(),
            kind: status.kind(),
            status,
            fields: Payload::new(),
            pending: false,
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Fully qualified key of this entity
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind, self.id.clone())
    }

    /// Get a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a string field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Build a payload carrying a single `reason` field
///
/// # Examples
///
/// ```
/// use pitlane_core::entity::reason;
///
/// let payload = reason("supplier out of stock");
/// assert_eq!(payload["reason"], "supplier out of stock");
/// ```
pub fn reason(text: impl Into<String>) -> Payload {
    let mut payload = Payload::new();
    payload.insert("reason".to_string(), Value::String(text.into()));
    payload
}
