//! Error taxonomy for transitions and page loads
//!
//! ## Error Codes (Canonical)
//!
//! | Code | Description | Touches network |
//! |------|-------------|-----------------|
//! | NotFound | Entity absent from the cache | no |
//! | InvalidTransition | Edge absent from the registry, or source state terminal | no |
//! | ValidationError | Required payload missing or invalid | no |
//! | Forbidden | Acting role does not satisfy the rule | no |
//! | Busy | Another transition holds the guard for this entity | no |
//! | RemoteError | Transport call rejected or failed; rolled back | yes |
//! | Cancelled | Caller went away before the call settled | yes |
//!
//! Errors that do not touch the network never mutate the cache, so a caller
//! can retry them immediately without side effects.

use crate::status::Status;
use crate::types::{EntityKey, EntityKind, Role};
use thiserror::Error;

/// Failure of a status transition request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Entity is not in the cache
    #[error("entity not found: {key}")]
    NotFound {
        /// Requested entity
        key: EntityKey,
    },

    /// No rule allows this edge
    #[error("invalid transition for {kind}: {from} -> {to}")]
    InvalidTransition {
        /// Entity kind
        kind: EntityKind,
        /// Confirmed status of the entity
        from: Status,
        /// Requested target
        to: Status,
    },

    /// Payload fails the rule's schema
    #[error("validation error on '{field}': {problem}")]
    Validation {
        /// Offending payload field
        field: String,
        /// What is wrong with it
        problem: String,
    },

    /// Acting role does not satisfy the rule
    #[error("forbidden: transition requires role {required}, session acts as {actual}")]
    Forbidden {
        /// Role the rule requires
        required: Role,
        /// Role of the session
        actual: Role,
    },

    /// A transition for this entity is already in flight
    #[error("busy: a transition is already in flight for {key}")]
    Busy {
        /// Contended entity
        key: EntityKey,
    },

    /// Transport rejected or failed; the optimistic write was rolled back
    #[error("remote error for {key}: {message}")]
    Remote {
        /// Entity whose transition failed
        key: EntityKey,
        /// Underlying transport failure
        message: String,
    },

    /// The caller's liveness token died before the transport settled
    #[error("transition for {key} cancelled by its caller")]
    Cancelled {
        /// Entity whose result was discarded
        key: EntityKey,
    },
}

impl TransitionError {
    /// Get the canonical error code
    pub fn error_code(&self) -> &'static str {
        match self {
            TransitionError::NotFound { .. } => "NotFound",
            TransitionError::InvalidTransition { .. } => "InvalidTransition",
            TransitionError::Validation { .. } => "ValidationError",
            TransitionError::Forbidden { .. } => "Forbidden",
            TransitionError::Busy { .. } => "Busy",
            TransitionError::Remote { .. } => "RemoteError",
            TransitionError::Cancelled { .. } => "Cancelled",
        }
    }

    /// Check if the error was detected before any transport call
    ///
    /// Such errors never mutated the cache.
    pub fn is_preflight(&self) -> bool {
        !matches!(
            self,
            TransitionError::Remote { .. } | TransitionError::Cancelled { .. }
        )
    }

    /// Check if retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransitionError::Busy { .. } | TransitionError::Remote { .. }
        )
    }
}

/// Failure of a page load or full-corpus load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport failed to deliver the page
    #[error("failed to load {kind} page {page}: {message}")]
    Remote {
        /// Entity kind
        kind: EntityKind,
        /// Page index
        page: usize,
        /// Underlying transport failure
        message: String,
    },

    /// The caller's liveness token died before the page arrived
    #[error("load of {kind} page {page} cancelled by its caller")]
    Cancelled {
        /// Entity kind
        kind: EntityKind,
        /// Page index that was discarded
        page: usize,
    },
}

impl LoadError {
    /// Get the canonical error code
    pub fn error_code(&self) -> &'static str {
        match self {
            LoadError::Remote { .. } => "RemoteError",
            LoadError::Cancelled { .. } => "Cancelled",
        }
    }
}
