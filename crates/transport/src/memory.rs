//! In-memory backend
//!
//! `InMemoryTransport` keeps records per kind in server order and serves
//! them in pages, either computed from the requested page size or from an
//! explicit layout. It records every call and can be told to fail or to
//! park calls at a [`Gate`] so tests can observe the engine mid-flight.
//!
//! ```text
//! seed ──► KindStore { order, records, page copies? }
//!                │
//! fetch_page ────┼── gate? ── failure? ── slice page
//! mutate ────────┴── gate? ── failure? ── apply status + payload
//! ```

use crate::context::SessionContext;
use crate::error::TransportError;
use crate::transport::{Page, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use pitlane_core::{Entity, EntityId, EntityKind, Payload, Status};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tracing::trace;

/// Parking point for transport calls
///
/// Calls arriving at a closed gate wait until a permit is released or the
/// gate is opened for good.
#[derive(Debug)]
pub struct Gate {
    permits: Semaphore,
    arrived: AtomicUsize,
    notify: Notify,
}

impl Gate {
    fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
            arrived: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    async fn pass(&self) {
        self.arrived.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
        // A closed semaphore means the gate was opened.
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Number of calls that reached the gate so far
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls reached the gate
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.arrived() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Wait until one call reached the gate
    pub async fn entered(&self) {
        self.wait_for(1).await;
    }

    /// Let exactly one parked call through
    pub fn release_one(&self) {
        self.permits.add_permits(1);
    }

    /// Let every current and future call through
    pub fn open(&self) {
        self.permits.close();
    }
}

#[derive(Debug, Default)]
struct KindStore {
    order: Vec<EntityId>,
    records: FxHashMap<EntityId, Entity>,
    /// Per-page copies; one id may appear on several pages
    layout: Option<Vec<Vec<Entity>>>,
}

impl KindStore {
    fn page(&self, page: usize, page_size: usize) -> Page {
        match &self.layout {
            Some(layout) => Page {
                items: layout.get(page).cloned().unwrap_or_default(),
                total_pages: layout.len(),
            },
            None => {
                let size = page_size.max(1);
                let start = page.saturating_mul(size).min(self.order.len());
                let end = start.saturating_add(size).min(self.order.len());
                Page {
                    items: self.order[start..end]
                        .iter()
                        .filter_map(|id| self.records.get(id).cloned())
                        .collect(),
                    total_pages: self.order.len().div_ceil(size).max(1),
                }
            }
        }
    }

    fn insert(&mut self, entity: Entity) {
        if !self.records.contains_key(&entity.id) {
            self.order.push(entity.id.clone());
            if let Some(last) = self.layout.as_mut().and_then(|l| l.last_mut()) {
                last.push(entity.clone());
            }
        }
        self.sync_layout(&entity);
        self.records.insert(entity.id.clone(), entity);
    }

    /// Overwrite every page copy of `entity` after a server-side write
    fn sync_layout(&mut self, entity: &Entity) {
        let copies = self.layout.iter_mut().flatten().flatten();
        for copy in copies.filter(|copy| copy.id == entity.id) {
            *copy = entity.clone();
        }
    }

    fn apply(&mut self, id: &EntityId, target: Status, payload: Option<&Payload>) -> Option<Entity> {
        let record = self.records.get_mut(id)?;
        record.status = target;
        if let Some(payload) = payload {
            for (key, value) in payload {
                record.fields.insert(key.clone(), value.clone());
            }
        }
        record.fields.insert(
            "updatedAt".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        let updated = record.clone();
        self.sync_layout(&updated);
        Some(updated)
    }
}

/// Backend living in process memory
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    stores: Mutex<FxHashMap<EntityKind, KindStore>>,
    fetch_log: Mutex<Vec<(EntityKind, usize)>>,
    mutations: AtomicUsize,
    creations: AtomicUsize,
    fetch_failure: Mutex<Option<TransportError>>,
    mutate_failure: Mutex<Option<TransportError>>,
    fetch_gate: Mutex<Option<Arc<Gate>>>,
    mutate_gate: Mutex<Option<Arc<Gate>>>,
    latency: Mutex<Option<Duration>>,
    silent: AtomicBool,
}

impl InMemoryTransport {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records in server order; pages are cut by the requested size
    pub fn seed(&self, entities: impl IntoIterator<Item = Entity>) {
        let mut stores = self.stores.lock();
        for entity in entities {
            stores.entry(entity.kind).or_default().insert(entity);
        }
    }

    /// Replace the records of `kind` with a fixed page layout
    ///
    /// Page `n` of the layout is served for page `n` regardless of the
    /// requested page size. An id listed on several pages is served with
    /// each page's own copy until the record is next written; the copy on
    /// the last page is the server record.
    pub fn seed_pages(&self, kind: EntityKind, pages: Vec<Vec<Entity>>) {
        let mut store = KindStore::default();
        for entity in pages.iter().flatten() {
            if !store.records.contains_key(&entity.id) {
                store.order.push(entity.id.clone());
            }
            store.records.insert(entity.id.clone(), entity.clone());
        }
        store.layout = Some(pages);
        self.stores.lock().insert(kind, store);
    }

    /// Insert or overwrite a record, as another client would
    pub fn upsert(&self, entity: Entity) {
        self.stores
            .lock()
            .entry(entity.kind)
            .or_default()
            .insert(entity);
    }

    /// Current server-side record
    pub fn record(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.stores
            .lock()
            .get(&kind)
            .and_then(|s| s.records.get(id).cloned())
    }

    /// Current server-side status
    pub fn status_of(&self, kind: EntityKind, id: &EntityId) -> Option<Status> {
        self.record(kind, id).map(|e| e.status)
    }

    /// Every `(kind, page)` fetched, in call order
    pub fn fetch_log(&self) -> Vec<(EntityKind, usize)> {
        self.fetch_log.lock().clone()
    }

    /// Number of page fetches
    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().len()
    }

    /// Number of mutation calls, failed ones included
    pub fn mutate_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Number of create calls
    pub fn create_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Zero all call counters
    pub fn reset_counters(&self) {
        self.fetch_log.lock().clear();
        self.mutations.store(0, Ordering::SeqCst);
        self.creations.store(0, Ordering::SeqCst);
    }

    /// Fail every mutation with `err` until cleared
    pub fn fail_mutations(&self, err: TransportError) {
        *self.mutate_failure.lock() = Some(err);
    }

    /// Fail every fetch with `err` until cleared
    pub fn fail_fetches(&self, err: TransportError) {
        *self.fetch_failure.lock() = Some(err);
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        *self.mutate_failure.lock() = None;
        *self.fetch_failure.lock() = None;
    }

    /// Answer mutations without a body
    pub fn set_silent_mutations(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Park subsequent mutations at a new gate
    pub fn pause_mutations(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        if let Some(old) = self.mutate_gate.lock().replace(Arc::clone(&gate)) {
            old.open();
        }
        gate
    }

    /// Park subsequent fetches at a new gate
    pub fn pause_fetches(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        if let Some(old) = self.fetch_gate.lock().replace(Arc::clone(&gate)) {
            old.open();
        }
        gate
    }

    /// Remove and open every gate
    pub fn resume(&self) {
        for slot in [&self.mutate_gate, &self.fetch_gate] {
            if let Some(gate) = slot.lock().take() {
                gate.open();
            }
        }
    }

    async fn delay(&self, gate: &Mutex<Option<Arc<Gate>>>) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let gate = gate.lock().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn fetch_page(
        &self,
        _ctx: &SessionContext,
        kind: EntityKind,
        page: usize,
        page_size: usize,
    ) -> Result<Page, TransportError> {
        self.fetch_log.lock().push((kind, page));
        self.delay(&self.fetch_gate).await;
        if let Some(err) = self.fetch_failure.lock().clone() {
            return Err(err);
        }
        let stores = self.stores.lock();
        let result = stores
            .get(&kind)
            .map(|s| s.page(page, page_size))
            .unwrap_or(Page {
                items: Vec::new(),
                total_pages: 1,
            });
        trace!(%kind, page, items = result.items.len(), "served page");
        Ok(result)
    }

    async fn mutate(
        &self,
        _ctx: &SessionContext,
        kind: EntityKind,
        id: &EntityId,
        target: Status,
        payload: Option<&Payload>,
    ) -> Result<Option<Entity>, TransportError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.delay(&self.mutate_gate).await;
        if let Some(err) = self.mutate_failure.lock().clone() {
            return Err(err);
        }
        let record = self
            .stores
            .lock()
            .get_mut(&kind)
            .and_then(|s| s.apply(id, target, payload))
            .ok_or_else(|| TransportError::http(404, format!("{} {} not found", kind, id)))?;
        trace!(%kind, %id, %target, "applied mutation");
        if self.silent.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn create(
        &self,
        _ctx: &SessionContext,
        kind: EntityKind,
        mut fields: Payload,
    ) -> Result<Entity, TransportError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        let id = match fields.remove("id") {
            Some(Value::String(s)) => EntityId::from(s),
            Some(Value::Number(n)) => EntityId::new(n.to_string()),
            _ => EntityId::generate(),
        };
        let status = fields
            .remove("status")
            .and_then(|v| v.as_str().and_then(|s| Status::parse(kind, s)))
            .unwrap_or_else(|| Status::initial(kind));
        let mut entity = Entity::new(id, status);
        entity.fields = fields;
        self.stores
            .lock()
            .entry(kind)
            .or_default()
            .insert(entity.clone());
        Ok(entity)
    }
}
