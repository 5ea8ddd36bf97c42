//! Engine layer for Pitlane
//!
//! This crate ties the registry, the guard and the transport together:
//! - [`EntityCache`]: windowed / full-corpus cache, one per entity kind
//! - [`Coordinator`]: validates, guards and applies optimistic transitions
//! - [`Engine`]: one cache per kind over a shared transport and guard
//! - [`EngineConfig`]: page sizes, transport timeout, channel capacity
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pitlane_core::{EntityKind, PurchaseRequestStatus, Role};
//! use pitlane_engine::{Engine, EngineConfig, Predicate};
//! use pitlane_registry::Registry;
//! use pitlane_transport::{InMemoryTransport, SessionContext};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(
//!     Arc::new(InMemoryTransport::new()),
//!     SessionContext::new(Role::Manager),
//!     Registry::standard(),
//!     EngineConfig::default(),
//! )?;
//! engine.load_page(EntityKind::PurchaseRequest, 0).await?;
//! engine
//!     .request_transition(EntityKind::PurchaseRequest, "pr-1", PurchaseRequestStatus::Approved, None)
//!     .await?;
//! let hits = engine
//!     .query(EntityKind::PurchaseRequest, &Predicate::text("brake pads"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod predicate;

pub use cache::EntityCache;
pub use config::{ConfigError, EngineConfig};
pub use coordinator::{Coordinator, MetricsSnapshot, TransitionMetrics, TransitionRequest};
pub use engine::Engine;
pub use predicate::Predicate;
