//! Convenient imports for Pitlane.
//!
//! ```ignore
//! use pitlane::prelude::*;
//!
//! let pitlane = Pitlane::builder()
//!     .transport(InMemoryTransport::new())
//!     .actor(Role::Receptionist)
//!     .open()?;
//! ```

// Main entry point
pub use crate::pitlane::{Pitlane, PitlaneBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Handles
pub use crate::handles::Entities;

// Core types
pub use crate::types::{
    reason, AppointmentStatus, ChangeCause, Entity, EntityChange, EntityId, EntityKind,
    LoadState, Payload, PayrollStatus, PurchaseRequestStatus, Role, ServiceTicketStatus, Status,
    StatusSet,
};

// Engine types
pub use crate::types::{EngineConfig, Predicate, TransitionRequest};

// Transport
pub use crate::types::{InMemoryTransport, JsonBackend, JsonTransport, SessionContext, Transport};

// Cancellation
pub use crate::types::{Liveness, LivenessToken};

// Re-export serde_json for convenience
pub use serde_json::json;
