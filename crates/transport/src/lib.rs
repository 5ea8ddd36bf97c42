//! Transport layer for Pitlane
//!
//! Everything the engine knows about the backend goes through the
//! [`Transport`] trait:
//! - [`transport`]: the trait and the decoded [`Page`]
//! - [`envelope`]: normalization of the backend's list and entity envelopes
//! - [`json`]: a decoding [`Transport`] over a raw [`JsonBackend`]
//! - [`memory`]: an in-process backend with call logging, failure injection
//!   and gates
//! - [`context`]: the explicit [`SessionContext`] passed into every call

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod envelope;
pub mod error;
pub mod json;
pub mod memory;
pub mod transport;

pub use context::SessionContext;
pub use envelope::{entity_from_json, entity_to_json, unwrap_list_payload, ListPayload};
pub use error::{DecodeError, TransportError};
pub use json::{JsonBackend, JsonTransport};
pub use memory::{Gate, InMemoryTransport};
pub use transport::{Page, Transport};
