//! Core types for Pitlane
//!
//! This crate defines the vocabulary shared by every other layer:
//! - [`types`]: entity ids, kinds, keys and session roles
//! - [`status`]: per-kind status enums and the kind-tagged [`Status`]
//! - [`entity`]: the cached [`Entity`] record and payloads
//! - [`change`]: change notifications and cache load state
//! - [`error`]: the transition and load error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod entity;
pub mod error;
pub mod status;
pub mod types;

pub use change::{ChangeCause, EntityChange, LoadState};
pub use entity::{reason, Entity, Payload};
pub use error::{LoadError, TransitionError};
pub use status::{
    AppointmentStatus, PayrollStatus, PurchaseRequestStatus, ServiceTicketStatus, Status,
    StatusSet,
};
pub use types::{EntityId, EntityKey, EntityKind, Role};
