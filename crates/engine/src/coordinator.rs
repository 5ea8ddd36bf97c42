//! Optimistic mutation coordinator
//!
//! Drives one status transition from request to settled state:
//!
//! ```text
//! 1 lookup ─► 2 no-op? ─► 3 rule? ─► 4 payload/actor ─► 5 guard
//!                                                          │
//!        9 rollback ◄── failure ── 7 transport ◄── 6 optimistic write
//!        8 commit   ◄── success ──┘
//! ```
//!
//! Steps 1 to 5 never touch the cache or the network; each failure maps to
//! its own [`TransitionError`]. Checks run against the status last confirmed
//! by the server, so a second request racing an in-flight transition reaches
//! the guard and is rejected as `Busy`. Once the guard permit is held the
//! checks run again, so a transition settled by another task in between is
//! seen before anything is written.
//!
//! The optimistic write is wrapped in a drop guard: if the request future is
//! dropped while the transport call is pending, the previous status is
//! restored and the guard entry released.

use crate::cache::EntityCache;
use pitlane_concurrency::{ConcurrencyGuard, LivenessToken};
use pitlane_core::{Entity, EntityId, EntityKey, Payload, Status, TransitionError};
use pitlane_registry::Registry;
use pitlane_transport::{SessionContext, Transport, TransportError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One status change request
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    /// Entity to move
    pub id: EntityId,
    /// Requested status
    pub target: Status,
    /// Extra fields sent with the change, e.g. a rejection reason
    pub payload: Option<Payload>,
    /// Caller liveness; a dead token discards the result
    pub liveness: LivenessToken,
}

impl TransitionRequest {
    /// Request without payload
    pub fn new(id: impl Into<EntityId>, target: impl Into<Status>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            payload: None,
            liveness: LivenessToken::detached(),
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a `reason` payload
    pub fn with_reason(self, reason: impl Into<String>) -> Self {
        self.with_payload(pitlane_core::reason(reason))
    }

    /// Tie the request to a caller's liveness
    pub fn with_liveness(mut self, token: LivenessToken) -> Self {
        self.liveness = token;
        self
    }
}

/// Transition counters
#[derive(Debug, Default)]
pub struct TransitionMetrics {
    committed: AtomicU64,
    rolled_back: AtomicU64,
    rejected: AtomicU64,
    noop: AtomicU64,
    cancelled: AtomicU64,
}

/// Point-in-time copy of [`TransitionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Transitions confirmed by the backend
    pub committed: u64,
    /// Transitions rolled back after a transport failure
    pub rolled_back: u64,
    /// Requests rejected before any transport call
    pub rejected: u64,
    /// Requests whose target was already the confirmed status
    pub noop: u64,
    /// Transitions whose caller went away
    pub cancelled: u64,
}

impl TransitionMetrics {
    /// Copy the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            committed: self.committed.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            noop: self.noop.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Restores the previous status unless disarmed
struct OptimisticWrite<'a> {
    cache: &'a EntityCache,
    id: &'a EntityId,
    previous: Status,
    armed: bool,
}

impl OptimisticWrite<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for OptimisticWrite<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                kind = %self.cache.kind(),
                id = %self.id,
                previous = %self.previous,
                "transition dropped in flight, rolling back"
            );
            self.cache.rollback_transition(self.id, self.previous);
        }
    }
}

/// Validates, guards and applies transitions
pub struct Coordinator {
    registry: Arc<Registry>,
    guard: Arc<ConcurrencyGuard>,
    transport: Arc<dyn Transport>,
    ctx: Arc<SessionContext>,
    timeout: Option<Duration>,
    metrics: TransitionMetrics,
}

impl Coordinator {
    /// Create a coordinator
    pub fn new(
        registry: Arc<Registry>,
        guard: Arc<ConcurrencyGuard>,
        transport: Arc<dyn Transport>,
        ctx: Arc<SessionContext>,
    ) -> Self {
        Self {
            registry,
            guard,
            transport,
            ctx,
            timeout: None,
            metrics: TransitionMetrics::default(),
        }
    }

    /// Bound every transport call by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registry used for validation
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Guard shared by every kind
    pub fn guard(&self) -> &Arc<ConcurrencyGuard> {
        &self.guard
    }

    /// Counter snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Move an entity of `cache`'s kind to `request.target`
    ///
    /// # Errors
    /// - `NotFound`, `InvalidTransition`, `Validation`, `Forbidden`, `Busy`:
    ///   detected before any side effect
    /// - `Remote`: transport failed or timed out; the previous status was
    ///   restored
    /// - `Cancelled`: the request's liveness token died before the transport
    ///   settled; the entity is left in the transport's outcome
    pub async fn request(
        &self,
        cache: &EntityCache,
        request: TransitionRequest,
    ) -> Result<Entity, TransitionError> {
        let TransitionRequest {
            id,
            target,
            payload,
            liveness,
        } = request;
        let kind = cache.kind();
        let key = EntityKey::new(kind, id.clone());

        if let Err(outcome) = self.admit(cache, &key, target, payload.as_ref()) {
            return outcome;
        }

        let Some(permit) = self.guard.try_lock(key.clone()) else {
            TransitionMetrics::bump(&self.metrics.rejected);
            debug!(%kind, %id, to = %target, "transition rejected, entity busy");
            return Err(TransitionError::Busy { key });
        };

        // Another transition may have settled between the first check and
        // the lock; only a check made under the permit is binding.
        let (entity, previous) = match self.admit(cache, &key, target, payload.as_ref()) {
            Ok(admitted) => admitted,
            Err(outcome) => {
                permit.release();
                return outcome;
            }
        };

        if cache.begin_optimistic(&id, target).is_none() {
            TransitionMetrics::bump(&self.metrics.rejected);
            return Err(TransitionError::NotFound { key });
        }
        let write = OptimisticWrite {
            cache,
            id: &id,
            previous,
            armed: true,
        };
        debug!(%kind, %id, from = %previous, to = %target, "optimistic write");

        let outcome = self
            .call_transport(&entity, target, payload.as_ref())
            .await;
        write.disarm();

        if !liveness.is_live() {
            match &outcome {
                Ok(_) => cache.commit_transition(&id, target, None),
                Err(_) => cache.rollback_transition(&id, previous),
            };
            permit.release();
            TransitionMetrics::bump(&self.metrics.cancelled);
            warn!(%kind, %id, to = %target, "caller went away, result discarded");
            return Err(TransitionError::Cancelled { key });
        }

        match outcome {
            Ok(server) => {
                let settled = cache.commit_transition(&id, target, server);
                permit.release();
                let settled = settled.ok_or(TransitionError::NotFound { key })?;
                TransitionMetrics::bump(&self.metrics.committed);
                debug!(%kind, %id, from = %previous, to = %settled.status, "transition committed");
                Ok(settled)
            }
            Err(e) => {
                cache.rollback_transition(&id, previous);
                permit.release();
                TransitionMetrics::bump(&self.metrics.rolled_back);
                warn!(%kind, %id, from = %previous, to = %target, error = %e, "transition rolled back");
                Err(TransitionError::Remote {
                    key,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Run the preflight checks, counting and logging early exits
    ///
    /// `Ok` carries the entity and its confirmed status; `Err` carries the
    /// value `request` returns without touching the cache.
    fn admit(
        &self,
        cache: &EntityCache,
        key: &EntityKey,
        target: Status,
        payload: Option<&Payload>,
    ) -> Result<(Entity, Status), Result<Entity, TransitionError>> {
        let (kind, id) = (key.kind, &key.id);
        match self.preflight(cache, key, target, payload) {
            Ok(Preflight::Proceed { entity, confirmed }) => Ok((entity, confirmed)),
            Ok(Preflight::AlreadyThere(entity)) => {
                TransitionMetrics::bump(&self.metrics.noop);
                debug!(%kind, %id, status = %target, "transition is a no-op");
                Err(Ok(entity))
            }
            Err(e) => {
                TransitionMetrics::bump(&self.metrics.rejected);
                debug!(%kind, %id, to = %target, code = e.error_code(), "transition rejected");
                Err(Err(e))
            }
        }
    }

    fn preflight(
        &self,
        cache: &EntityCache,
        key: &EntityKey,
        target: Status,
        payload: Option<&Payload>,
    ) -> Result<Preflight, TransitionError> {
        let kind = key.kind;
        let (entity, confirmed) = cache
            .snapshot(&key.id)
            .ok_or_else(|| TransitionError::NotFound { key: key.clone() })?;

        if confirmed == target {
            return Ok(Preflight::AlreadyThere(entity));
        }

        let invalid = || TransitionError::InvalidTransition {
            kind,
            from: confirmed,
            to: target,
        };
        if target.kind() != kind {
            return Err(invalid());
        }
        let rule = self
            .registry
            .rule(kind, confirmed, target)
            .ok_or_else(invalid)?;

        if let Some(schema) = &rule.requires_payload {
            schema.validate(payload)?;
        }
        if let Some(required) = rule.actor {
            let actual = self.ctx.actor();
            if actual != required {
                return Err(TransitionError::Forbidden { required, actual });
            }
        }
        Ok(Preflight::Proceed { entity, confirmed })
    }

    async fn call_transport(
        &self,
        entity: &Entity,
        target: Status,
        payload: Option<&Payload>,
    ) -> Result<Option<Entity>, TransportError> {
        let call = self
            .transport
            .mutate(&self.ctx, entity.kind, &entity.id, target, payload);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => call.await,
        }
    }
}

enum Preflight {
    AlreadyThere(Entity),
    Proceed { entity: Entity, confirmed: Status },
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("ctx", &self.ctx)
            .field("timeout", &self.timeout)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
