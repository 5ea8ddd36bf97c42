//! Main entry point for Pitlane.
//!
//! This module provides the `Pitlane` struct, which owns one engine and
//! exposes a typed handle per entity kind.

use crate::error::{Error, Result};
use crate::handles::{Appointments, Payroll, PurchaseRequests, ServiceTickets};
use pitlane_core::{Entity, EntityChange, EntityId, EntityKind, LoadState, Payload, Role, Status};
use pitlane_engine::{Engine, EngineConfig, MetricsSnapshot, Predicate, TransitionRequest};
use pitlane_registry::Registry;
use pitlane_transport::{SessionContext, Transport};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The Pitlane engine.
///
/// Create one with [`Pitlane::builder`].
///
/// # Example
///
/// ```ignore
/// use pitlane::prelude::*;
///
/// let pitlane = Pitlane::builder()
///     .transport(InMemoryTransport::new())
///     .actor(Role::Manager)
///     .open()?;
///
/// pitlane.purchase_requests.load_page(0).await?;
/// pitlane.purchase_requests.approve("pr-1").await?;
/// let hits = pitlane.purchase_requests.search("brake").await?;
/// ```
pub struct Pitlane {
    /// The underlying engine
    pub(crate) inner: Arc<Engine>,

    /// Appointment listing
    pub appointments: Appointments,

    /// Service ticket listing
    pub service_tickets: ServiceTickets,

    /// Purchase request approvals
    pub purchase_requests: PurchaseRequests,

    /// Payroll approvals
    pub payroll: Payroll,
}

impl Pitlane {
    /// Create a builder.
    pub fn builder() -> PitlaneBuilder {
        PitlaneBuilder::new()
    }

    /// Open with default settings over `transport`, acting as `ctx`.
    pub fn open(transport: impl Transport + 'static, ctx: SessionContext) -> Result<Self> {
        Self::builder().transport(transport).context(ctx).open()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.inner
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        self.inner.config()
    }

    /// Move `id` of `kind` to `target`.
    pub async fn request_transition(
        &self,
        kind: EntityKind,
        id: impl Into<EntityId>,
        target: impl Into<Status>,
        payload: Option<Payload>,
    ) -> Result<Entity> {
        Ok(self
            .inner
            .request_transition(kind, id, target, payload)
            .await?)
    }

    /// Run a fully specified transition request.
    pub async fn request_transition_with(
        &self,
        kind: EntityKind,
        request: TransitionRequest,
    ) -> Result<Entity> {
        Ok(self.inner.request_transition_with(kind, request).await?)
    }

    /// Load page `page` of `kind` as the current window.
    pub async fn load_page(&self, kind: EntityKind, page: usize) -> Result<Vec<Entity>> {
        Ok(self.inner.load_page(kind, page).await?)
    }

    /// Load every remaining page of `kind`.
    pub async fn ensure_fully_loaded(&self, kind: EntityKind) -> Result<()> {
        Ok(self.inner.ensure_fully_loaded(kind).await?)
    }

    /// Entities of `kind` selected by `predicate`.
    pub async fn query(&self, kind: EntityKind, predicate: &Predicate) -> Result<Vec<Entity>> {
        Ok(self.inner.query(kind, predicate).await?)
    }

    /// Change stream of `kind`.
    pub fn subscribe(&self, kind: EntityKind) -> broadcast::Receiver<EntityChange> {
        self.inner.subscribe(kind)
    }

    /// Create a record of `kind`.
    pub async fn create(&self, kind: EntityKind, fields: Payload) -> Result<Entity> {
        Ok(self.inner.create(kind, fields).await?)
    }

    /// Cached entity.
    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.inner.get(kind, id)
    }

    /// Drop loaded pages of `kind`.
    pub fn refresh(&self, kind: EntityKind) {
        self.inner.refresh(kind)
    }

    /// Load state of `kind`.
    pub fn load_state(&self, kind: EntityKind) -> LoadState {
        self.inner.load_state(kind)
    }

    /// Check if a transition is in flight for `id`.
    pub fn is_busy(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.inner.is_busy(kind, id)
    }

    /// Ids of `kind` with a transition in flight.
    pub fn busy_ids(&self, kind: EntityKind) -> BTreeSet<EntityId> {
        self.inner.busy_ids(kind)
    }

    /// Transition counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }

    fn from_engine(engine: Arc<Engine>) -> Self {
        Self {
            appointments: Appointments::new(engine.clone()),
            service_tickets: ServiceTickets::new(engine.clone()),
            purchase_requests: PurchaseRequests::new(engine.clone()),
            payroll: Payroll::new(engine.clone()),
            inner: engine,
        }
    }
}

impl std::fmt::Debug for Pitlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pitlane").field("engine", &self.inner).finish()
    }
}

/// Builder for a [`Pitlane`].
///
/// # Example
///
/// ```ignore
/// // Dashboard session with a file-based configuration
/// let pitlane = Pitlane::builder()
///     .transport(JsonTransport::new(my_http_backend))
///     .context(SessionContext::new(Role::Manager).with_token(token))
///     .config_file("pitlane.toml")?
///     .open()?;
///
/// // Tests: in-memory backend, short timeout
/// let pitlane = Pitlane::builder()
///     .transport(InMemoryTransport::new())
///     .transport_timeout(Some(Duration::from_millis(50)))
///     .open()?;
/// ```
pub struct PitlaneBuilder {
    transport: Option<Arc<dyn Transport>>,
    context: SessionContext,
    config: EngineConfig,
    registry: Option<Arc<Registry>>,
}

impl PitlaneBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            transport: None,
            context: SessionContext::default(),
            config: EngineConfig::default(),
            registry: None,
        }
    }

    /// Set the transport.
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Set a transport that is also used elsewhere.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the session context.
    pub fn context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }

    /// Act as `role` with no credentials.
    pub fn actor(self, role: Role) -> Self {
        self.context(SessionContext::new(role))
    }

    /// Use `config`.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.config = EngineConfig::from_file(path)?;
        Ok(self)
    }

    /// Override the page size of one kind.
    pub fn page_size(mut self, kind: EntityKind, size: usize) -> Self {
        self.config = self.config.with_page_size(kind, size);
        self
    }

    /// Bound every transport call; `None` disables the bound.
    pub fn transport_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config = self.config.with_transport_timeout(timeout);
        self
    }

    /// Use a custom transition registry instead of the standard one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Open the engine.
    ///
    /// # Errors
    /// - `Error::MissingTransport` if no transport was set
    /// - `Error::Config` if the configuration is out of range
    pub fn open(self) -> Result<Pitlane> {
        let transport = self.transport.ok_or(Error::MissingTransport)?;
        let registry = self.registry.unwrap_or_else(Registry::standard);
        let engine = Engine::new(transport, self.context, registry, self.config)?;
        Ok(Pitlane::from_engine(Arc::new(engine)))
    }
}

impl Default for PitlaneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
