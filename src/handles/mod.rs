//! Typed per-kind handles.
//!
//! Each listing gets a handle that only accepts statuses of its own kind:
//!
//! ```ignore
//! pitlane.appointments.cancel("a-1").await?;
//! pitlane.purchase_requests.reject("pr-9", "duplicate order").await?;
//! pitlane.service_tickets.search("51F").await?;
//! ```
//!
//! The generic operations live on [`Entities`]; each kind's module adds the
//! verbs of its workflow.

mod appointments;
mod payroll;
mod purchase_requests;
mod service_tickets;

use crate::error::Result;
use pitlane_concurrency::LivenessToken;
use pitlane_core::{
    AppointmentStatus, Entity, EntityChange, EntityId, EntityKind, LoadState, Payload,
    PayrollStatus, PurchaseRequestStatus, ServiceTicketStatus, Status, StatusSet,
};
use pitlane_engine::{Engine, Predicate, TransitionRequest};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Appointment handle
pub type Appointments = Entities<AppointmentStatus>;
/// Service ticket handle
pub type ServiceTickets = Entities<ServiceTicketStatus>;
/// Purchase request handle
pub type PurchaseRequests = Entities<PurchaseRequestStatus>;
/// Payroll handle
pub type Payroll = Entities<PayrollStatus>;

/// Operations on the entities of one kind.
///
/// Access via `pitlane.appointments`, `pitlane.service_tickets`,
/// `pitlane.purchase_requests` or `pitlane.payroll`.
pub struct Entities<S: StatusSet> {
    engine: Arc<Engine>,
    _status: PhantomData<fn() -> S>,
}

impl<S: StatusSet> Entities<S> {
    pub(crate) fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            _status: PhantomData,
        }
    }

    /// Kind handled.
    pub fn kind(&self) -> EntityKind {
        S::KIND
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load page `page` as the current window.
    pub async fn load_page(&self, page: usize) -> Result<Vec<Entity>> {
        Ok(self.engine.load_page(S::KIND, page).await?)
    }

    /// Load page `page`, discarding it if `token` dies first.
    pub async fn load_page_with(&self, page: usize, token: LivenessToken) -> Result<Vec<Entity>> {
        Ok(self.engine.load_page_with(S::KIND, page, token).await?)
    }

    /// Load every remaining page.
    pub async fn load_all(&self) -> Result<()> {
        Ok(self.engine.ensure_fully_loaded(S::KIND).await?)
    }

    /// Entities of the current window.
    pub fn window(&self) -> Vec<Entity> {
        self.engine.cache(S::KIND).window()
    }

    /// Forget loaded pages.
    pub fn refresh(&self) {
        self.engine.refresh(S::KIND)
    }

    /// Load state.
    pub fn load_state(&self) -> LoadState {
        self.engine.load_state(S::KIND)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Substring search over the kind's search fields.
    ///
    /// A blank needle returns the current window without loading anything.
    pub async fn search(&self, needle: &str) -> Result<Vec<Entity>> {
        self.query(&Predicate::text(needle)).await
    }

    /// Entities selected by `predicate`.
    pub async fn query(&self, predicate: &Predicate) -> Result<Vec<Entity>> {
        Ok(self.engine.query(S::KIND, predicate).await?)
    }

    /// Every entity currently in `status`, across the full corpus.
    pub async fn with_status(&self, status: S) -> Result<Vec<Entity>> {
        let wanted: Status = status.into();
        self.query(&Predicate::custom(move |e| e.status == wanted))
            .await
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Move `id` to `target`.
    pub async fn transition(&self, id: impl Into<EntityId>, target: S) -> Result<Entity> {
        Ok(self
            .engine
            .request_transition(S::KIND, id, target, None)
            .await?)
    }

    /// Move `id` to `target`, sending `payload` along.
    pub async fn transition_with(
        &self,
        id: impl Into<EntityId>,
        target: S,
        payload: Payload,
    ) -> Result<Entity> {
        Ok(self
            .engine
            .request_transition(S::KIND, id, target, Some(payload))
            .await?)
    }

    /// Run a fully specified request.
    pub async fn request(&self, request: TransitionRequest) -> Result<Entity> {
        Ok(self.engine.request_transition_with(S::KIND, request).await?)
    }

    /// Targets reachable from the confirmed status of `id`.
    pub fn allowed_targets(&self, id: &EntityId) -> Vec<S> {
        self.engine
            .available_transitions(S::KIND, id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(S::from_status)
            .collect()
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Create a record.
    pub async fn create(&self, fields: Payload) -> Result<Entity> {
        Ok(self.engine.create(S::KIND, fields).await?)
    }

    /// Cached entity.
    pub fn get(&self, id: &EntityId) -> Option<Entity> {
        self.engine.get(S::KIND, id)
    }

    /// Current status of a cached entity, optimistic while pending.
    pub fn status_of(&self, id: &EntityId) -> Option<S> {
        self.get(id).and_then(|e| S::from_status(e.status))
    }

    /// Check if a transition is in flight for `id`.
    pub fn is_busy(&self, id: &EntityId) -> bool {
        self.engine.is_busy(S::KIND, id)
    }

    /// Ids with a transition in flight.
    pub fn busy_ids(&self) -> BTreeSet<EntityId> {
        self.engine.busy_ids(S::KIND)
    }

    /// Change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityChange> {
        self.engine.subscribe(S::KIND)
    }
}

impl<S: StatusSet> Clone for Entities<S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.engine))
    }
}

impl<S: StatusSet> std::fmt::Debug for Entities<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities").field("kind", &S::KIND).finish()
    }
}
