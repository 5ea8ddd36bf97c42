//! Transport and wire decoding errors

use pitlane_core::EntityKind;
use std::time::Duration;
use thiserror::Error;

/// Wire payload could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is neither a list nor a known envelope
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),

    /// Required key absent from an entity object
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// `id` is neither a string nor a non-negative integer
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// `status` is not a wire string of the kind
    #[error("unknown {kind} status '{status}'")]
    UnknownStatus {
        /// Kind being decoded
        kind: EntityKind,
        /// Offending wire string
        status: String,
    },
}

/// Failure of a transport call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Backend answered with a non-success status code
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code
        status: u16,
        /// Backend message
        message: String,
    },

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Call exceeded its deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Backend does not offer this operation
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl TransportError {
    /// Shorthand for an HTTP failure
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        TransportError::Http {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}
