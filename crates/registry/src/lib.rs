//! Transition table registry
//!
//! Static lookup of legal `(from -> to)` status edges per entity kind, with
//! the payload and actor constraints attached to each edge:
//! - [`TransitionRule`]: one edge
//! - [`PayloadSchema`]: mandatory payload of an edge
//! - [`TransitionTable`]: status graph of one kind
//! - [`Registry`]: one table per kind; [`Registry::standard`] encodes the
//!   garage backend's matrices

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod rule;
pub mod standard;
pub mod table;

pub use rule::{PayloadSchema, PayloadViolation, TransitionRule, ViolationKind};
pub use standard::standard_rules;
pub use table::{Registry, RegistryBuilder, RegistryError, TransitionTable};
