//! Public types for the Pitlane facade.
//!
//! This module re-exports types from the internal crates with a clean public
//! interface.

// Identity and vocabulary
pub use pitlane_core::{EntityId, EntityKey, EntityKind, Role};

// Statuses
pub use pitlane_core::{
    AppointmentStatus, PayrollStatus, PurchaseRequestStatus, ServiceTicketStatus, Status,
    StatusSet,
};

// Records and changes
pub use pitlane_core::{reason, ChangeCause, Entity, EntityChange, LoadState, Payload};

// Layer errors
pub use pitlane_core::{LoadError, TransitionError};
pub use pitlane_engine::ConfigError;
pub use pitlane_registry::RegistryError;
pub use pitlane_transport::{DecodeError, TransportError};

// Registry
pub use pitlane_registry::{PayloadSchema, Registry, RegistryBuilder, TransitionRule};

// Concurrency
pub use pitlane_concurrency::{Liveness, LivenessToken};

// Transport
pub use pitlane_transport::{
    Gate, InMemoryTransport, JsonBackend, JsonTransport, Page, SessionContext, Transport,
};

// Engine
pub use pitlane_engine::{EngineConfig, MetricsSnapshot, Predicate, TransitionRequest};
