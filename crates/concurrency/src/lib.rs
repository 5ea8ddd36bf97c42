//! Concurrency layer for Pitlane
//!
//! This crate implements the coordination primitives of the transition
//! engine:
//! - [`ConcurrencyGuard`]: per-entity, non-queuing mutual exclusion
//! - [`GuardPermit`]: RAII lock that releases on every exit path
//! - [`Liveness`] / [`LivenessToken`]: discard results of calls whose
//!   initiator has gone away

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod guard;
pub mod liveness;

pub use guard::{ConcurrencyGuard, GuardPermit, GuardStats};
pub use liveness::{Liveness, LivenessToken};
