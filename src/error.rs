//! Unified error type for Pitlane.
//!
//! Every layer keeps its own error enum; this module wraps them behind one
//! type so callers of the facade match on a single `Error`.

use pitlane_core::{LoadError, TransitionError};
use pitlane_engine::ConfigError;
use pitlane_registry::RegistryError;
use pitlane_transport::TransportError;
use thiserror::Error;

/// All Pitlane errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Status transition failed
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Page or full-corpus load failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Direct transport call (e.g. create) failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration is unreadable or out of range
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Custom transition table is malformed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Builder was opened without a transport
    #[error("no transport configured")]
    MissingTransport,
}

/// Result type for Pitlane operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Busy entities, failed transport calls and failed page loads may
    /// succeed when tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transition(e) => e.is_retryable(),
            Error::Load(e) => matches!(e, LoadError::Remote { .. }),
            Error::Transport(e) => match e {
                TransportError::Http { status, .. } => *status >= 500,
                TransportError::Network(_) | TransportError::Timeout(_) => true,
                TransportError::Decode(_) | TransportError::Unsupported(_) => false,
            },
            _ => false,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Transition(e) => matches!(e, TransitionError::NotFound { .. }),
            Error::Transport(e) => e.status() == Some(404),
            _ => false,
        }
    }

    /// Check if the entity was busy with another transition.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Transition(TransitionError::Busy { .. }))
    }

    /// Canonical error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Transition(e) => e.error_code(),
            Error::Load(e) => e.error_code(),
            Error::Transport(_) => "TransportError",
            Error::Config(_) => "ConfigError",
            Error::Registry(_) => "RegistryError",
            Error::MissingTransport => "MissingTransport",
        }
    }
}
