//! # Pitlane
//!
//! Status-transition engine for garage administration dashboards.
//!
//! Pitlane keeps the listing screens of a garage back office (appointments,
//! service tickets, purchase requests, payroll approvals) consistent with
//! the backend:
//!
//! - status changes are checked against a per-kind transition table before
//!   any network call
//! - accepted changes show up immediately and roll back if the backend
//!   rejects them
//! - one transition per entity at a time; a second one is refused as busy
//! - listings page through the backend, and the first search loads the full
//!   corpus once, de-duplicated by id
//!
//! ## Quick Start
//!
//! ```ignore
//! use pitlane::prelude::*;
//!
//! let pitlane = Pitlane::builder()
//!     .transport(JsonTransport::new(my_backend))
//!     .actor(Role::Manager)
//!     .open()?;
//!
//! // Browse one page
//! let page = pitlane.purchase_requests.load_page(0).await?;
//!
//! // Decide
//! pitlane.purchase_requests.approve("pr-1").await?;
//! pitlane.purchase_requests.reject("pr-2", "duplicate order").await?;
//!
//! // Search across every page
//! let hits = pitlane.service_tickets.search("nguyen").await?;
//! ```
//!
//! ## Layers
//!
//! - [`pitlane_core`] - ids, kinds, statuses, entities, errors
//! - [`pitlane_registry`] - legal transitions per kind
//! - [`pitlane_concurrency`] - per-entity guard and liveness tokens
//! - [`pitlane_transport`] - backend contract and adapters
//! - [`pitlane_engine`] - cache, coordinator and engine

#![warn(missing_docs)]

mod error;
mod handles;
mod pitlane;
mod types;

pub mod prelude;

// Re-export main entry points
pub use crate::pitlane::{Pitlane, PitlaneBuilder};
pub use error::{Error, Result};

// Re-export handles
pub use handles::{Appointments, Entities, Payroll, PurchaseRequests, ServiceTickets};

// Re-export types
pub use types::*;
