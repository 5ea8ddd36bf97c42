//! Per-kind wiring of caches, guard and coordinator

use crate::cache::EntityCache;
use crate::config::{ConfigError, EngineConfig};
use crate::coordinator::{Coordinator, MetricsSnapshot, TransitionRequest};
use crate::predicate::Predicate;
use pitlane_concurrency::{ConcurrencyGuard, LivenessToken};
use pitlane_core::{
    Entity, EntityChange, EntityId, EntityKey, EntityKind, LoadError, LoadState, Payload, Status,
    TransitionError,
};
use pitlane_registry::Registry;
use pitlane_transport::{SessionContext, Transport, TransportError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// One cache per entity kind over a shared transport, guard and registry
pub struct Engine {
    config: EngineConfig,
    ctx: Arc<SessionContext>,
    transport: Arc<dyn Transport>,
    coordinator: Coordinator,
    /// Indexed by [`slot`]
    caches: Vec<EntityCache>,
}

fn slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Appointment => 0,
        EntityKind::ServiceTicket => 1,
        EntityKind::PurchaseRequest => 2,
        EntityKind::PayrollRecord => 3,
    }
}

impl Engine {
    /// Wire an engine
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if `config` fails validation
    pub fn new(
        transport: Arc<dyn Transport>,
        ctx: SessionContext,
        registry: Arc<Registry>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let ctx = Arc::new(ctx);
        let timeout = config.transport_timeout();
        let caches = EntityKind::ALL
            .into_iter()
            .map(|kind| {
                EntityCache::new(
                    kind,
                    config.page_size_for(kind),
                    Arc::clone(&transport),
                    Arc::clone(&ctx),
                )
                .with_timeout(timeout)
                .with_channel_capacity(config.change_channel_capacity)
            })
            .collect();
        let coordinator = Coordinator::new(
            registry,
            Arc::new(ConcurrencyGuard::new()),
            Arc::clone(&transport),
            Arc::clone(&ctx),
        )
        .with_timeout(timeout);
        info!(
            actor = %ctx.actor(),
            default_page_size = config.default_page_size,
            timeout_ms = config.transport_timeout_ms,
            "engine ready"
        );
        Ok(Self {
            config,
            ctx,
            transport,
            coordinator,
            caches,
        })
    }

    /// Cache of `kind`
    pub fn cache(&self, kind: EntityKind) -> &EntityCache {
        &self.caches[slot(kind)]
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session the engine acts for
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Transition registry
    pub fn registry(&self) -> &Arc<Registry> {
        self.coordinator.registry()
    }

    /// Move `id` of `kind` to `target`
    pub async fn request_transition(
        &self,
        kind: EntityKind,
        id: impl Into<EntityId>,
        target: impl Into<Status>,
        payload: Option<Payload>,
    ) -> Result<Entity, TransitionError> {
        let mut request = TransitionRequest::new(id, target);
        request.payload = payload;
        self.request_transition_with(kind, request).await
    }

    /// Run a fully specified transition request
    pub async fn request_transition_with(
        &self,
        kind: EntityKind,
        request: TransitionRequest,
    ) -> Result<Entity, TransitionError> {
        self.coordinator.request(self.cache(kind), request).await
    }

    /// Load page `page` of `kind` into its window
    pub async fn load_page(&self, kind: EntityKind, page: usize) -> Result<Vec<Entity>, LoadError> {
        self.cache(kind).load_page(page).await
    }

    /// [`load_page`](Self::load_page) bound to a caller's liveness
    pub async fn load_page_with(
        &self,
        kind: EntityKind,
        page: usize,
        token: LivenessToken,
    ) -> Result<Vec<Entity>, LoadError> {
        self.cache(kind).load_page_with(page, token).await
    }

    /// Load every remaining page of `kind`
    pub async fn ensure_fully_loaded(&self, kind: EntityKind) -> Result<(), LoadError> {
        self.cache(kind).ensure_fully_loaded().await
    }

    /// Entities of `kind` selected by `predicate`
    pub async fn query(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
    ) -> Result<Vec<Entity>, LoadError> {
        self.cache(kind).query(predicate).await
    }

    /// Change stream of `kind`
    pub fn subscribe(&self, kind: EntityKind) -> broadcast::Receiver<EntityChange> {
        self.cache(kind).subscribe()
    }

    /// Create a record through the transport and cache it
    pub async fn create(&self, kind: EntityKind, fields: Payload) -> Result<Entity, TransportError> {
        let call = self.transport.create(&self.ctx, kind, fields);
        let created = match self.config.transport_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(TransportError::Timeout(limit)))?,
            None => call.await?,
        };
        debug!(%kind, id = %created.id, status = %created.status, "created");
        Ok(self.cache(kind).insert_created(created))
    }

    /// Cached entity
    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.cache(kind).get(id)
    }

    /// Drop loaded pages of `kind`
    pub fn refresh(&self, kind: EntityKind) {
        self.cache(kind).refresh();
    }

    /// Load state of `kind`
    pub fn load_state(&self, kind: EntityKind) -> LoadState {
        self.cache(kind).load_state()
    }

    /// Check if a transition is in flight for `id`
    pub fn is_busy(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.coordinator
            .guard()
            .is_held(&EntityKey::new(kind, id.clone()))
    }

    /// Ids of `kind` with a transition in flight
    pub fn busy_ids(&self, kind: EntityKind) -> BTreeSet<EntityId> {
        self.coordinator
            .guard()
            .held_keys()
            .into_iter()
            .filter(|key| key.kind == kind)
            .map(|key| key.id)
            .collect()
    }

    /// Targets reachable from the confirmed status of a cached entity
    pub fn available_transitions(&self, kind: EntityKind, id: &EntityId) -> Option<BTreeSet<Status>> {
        self.cache(kind)
            .snapshot(id)
            .map(|(_, confirmed)| self.registry().allowed_targets(kind, confirmed))
    }

    /// Transition counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.coordinator.metrics()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .field("caches", &self.caches)
            .finish()
    }
}
