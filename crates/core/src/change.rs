//! Change notifications and cache load state
//!
//! Listings re-render from [`EntityChange`] events instead of polling the
//! cache. Every write to a cached entity publishes one event carrying the
//! entity as readers now see it.

use crate::entity::Entity;
use crate::types::{EntityId, EntityKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused an entity to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeCause {
    /// Merged from a page fetch
    Fetched,
    /// Inserted from a creation call
    Created,
    /// Optimistic status written, transition in flight
    Optimistic,
    /// Transition confirmed by the backend
    Committed,
    /// Transition failed and the previous status was restored
    RolledBack,
}

impl ChangeCause {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCause::Fetched => "Fetched",
            ChangeCause::Created => "Created",
            ChangeCause::Optimistic => "Optimistic",
            ChangeCause::Committed => "Committed",
            ChangeCause::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for ChangeCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entity-by-id change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    /// Entity that changed
    pub key: EntityKey,
    /// Entity after the change
    pub entity: Entity,
    /// Why it changed
    pub cause: ChangeCause,
    /// When the change was applied to the cache
    pub at: DateTime<Utc>,
}

impl EntityChange {
    /// Create a change event stamped with the current time
    pub fn new(entity: Entity, cause: ChangeCause) -> Self {
        Self {
            key: entity.key(),
            entity,
            cause,
            at: Utc::now(),
        }
    }

    /// Check whether this event concerns `id`
    pub fn is_for(&self, id: &EntityId) -> bool {
        &self.key.id == id
    }
}

/// Loading status of a per-kind cache
///
/// Monotonic: `Empty → PartiallyLoaded → FullyLoaded`. Only an explicit
/// refresh moves it back to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadState {
    /// No page loaded yet
    Empty,
    /// Some pages loaded
    PartiallyLoaded,
    /// Every page loaded as of the last full load
    FullyLoaded,
}

impl LoadState {
    /// Check if every page is loaded
    pub fn is_full(&self) -> bool {
        matches!(self, LoadState::FullyLoaded)
    }
}
