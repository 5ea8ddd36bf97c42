//! Windowed / full-corpus entity cache
//!
//! One `EntityCache` exists per entity kind. It normally holds the pages the
//! user has browsed, and expands to the whole corpus the first time a search
//! needs it.
//!
//! ## State
//!
//! ```text
//!                 load_page(n)                ensure_fully_loaded()
//!   Empty ───────────────────► PartiallyLoaded ─────────────────────► FullyLoaded
//!     ▲                              │                                     │
//!     └────────────── refresh() ─────┴─────────────────────────────────────┘
//! ```
//!
//! ## Records
//!
//! Each id maps to one slot: the entity as readers see it, the status last
//! confirmed by the server, and the position used to order full-corpus
//! results. Merges are last-write-wins by fetch completion, except that a
//! slot with a transition in flight keeps its optimistic status.
//!
//! Locks are only held for the synchronous section of an operation, never
//! across a transport call.

use crate::predicate::Predicate;
use parking_lot::RwLock;
use pitlane_concurrency::LivenessToken;
use pitlane_core::{ChangeCause, Entity, EntityChange, EntityId, EntityKind, LoadError, LoadState, Status};
use pitlane_transport::{Page, SessionContext, Transport, TransportError};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

/// Where an id was last seen; orders full-corpus results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Position {
    /// Index within a fetched page
    Paged { page: usize, index: usize },
    /// Creation order of entities that never came from a page
    Created(u64),
}

#[derive(Debug, Clone)]
struct Slot {
    entity: Entity,
    confirmed: Status,
    position: Position,
}

#[derive(Debug, Default)]
struct CacheState {
    by_id: FxHashMap<EntityId, Slot>,
    page_items: FxHashMap<usize, Vec<EntityId>>,
    current_page: Option<usize>,
    loaded_pages: BTreeSet<usize>,
    fully_loaded: bool,
    total_pages: Option<usize>,
    created: u64,
}

/// Per-kind cache of entities
pub struct EntityCache {
    kind: EntityKind,
    page_size: usize,
    timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
    ctx: Arc<SessionContext>,
    state: RwLock<CacheState>,
    changes: broadcast::Sender<EntityChange>,
    /// Serializes full loads
    full_load: Mutex<()>,
}

impl EntityCache {
    /// Create an empty cache for `kind`
    pub fn new(
        kind: EntityKind,
        page_size: usize,
        transport: Arc<dyn Transport>,
        ctx: Arc<SessionContext>,
    ) -> Self {
        let (changes, _) = broadcast::channel(crate::config::DEFAULT_CHANGE_CHANNEL_CAPACITY);
        Self {
            kind,
            page_size: page_size.max(1),
            timeout: None,
            transport,
            ctx,
            state: RwLock::new(CacheState::default()),
            changes,
            full_load: Mutex::new(()),
        }
    }

    /// Bound every page fetch by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a change channel of `capacity`
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        self.changes = changes;
        self
    }

    /// Kind of entity cached
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Page size requested from the transport
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch one page and make it the current window
    ///
    /// Returns the page's entities in server order, as now cached.
    pub async fn load_page(&self, page: usize) -> Result<Vec<Entity>, LoadError> {
        self.load_page_with(page, LivenessToken::detached()).await
    }

    /// [`load_page`](Self::load_page) that discards the page if `token`
    /// dies before the fetch settles
    pub async fn load_page_with(
        &self,
        page: usize,
        token: LivenessToken,
    ) -> Result<Vec<Entity>, LoadError> {
        let fetched = self.fetch(page).await?;
        if !token.is_live() {
            warn!(kind = %self.kind, page, "discarding page, caller went away");
            return Err(LoadError::Cancelled {
                kind: self.kind,
                page,
            });
        }
        Ok(self.merge_page(page, fetched, true))
    }

    /// Load every page not yet loaded
    ///
    /// No-op once fully loaded. Pages are fetched one after another in index
    /// order; the page count of the latest response bounds the loop.
    /// Concurrent callers are serialized and the later one observes the
    /// earlier one's result.
    pub async fn ensure_fully_loaded(&self) -> Result<(), LoadError> {
        self.ensure_fully_loaded_with(LivenessToken::detached())
            .await
    }

    /// [`ensure_fully_loaded`](Self::ensure_fully_loaded) that stops at the
    /// first page settling after `token` dies
    pub async fn ensure_fully_loaded_with(&self, token: LivenessToken) -> Result<(), LoadError> {
        if self.state.read().fully_loaded {
            return Ok(());
        }
        let _serial = self.full_load.lock().await;
        if self.state.read().fully_loaded {
            return Ok(());
        }

        let mut next = 0;
        while let Some(page) = self.next_unloaded(next) {
            let fetched = self.fetch(page).await?;
            if !token.is_live() {
                warn!(kind = %self.kind, page, "full load abandoned, caller went away");
                return Err(LoadError::Cancelled {
                    kind: self.kind,
                    page,
                });
            }
            self.merge_page(page, fetched, false);
            next = page + 1;
        }

        let mut state = self.state.write();
        state.fully_loaded = true;
        debug!(
            kind = %self.kind,
            pages = state.loaded_pages.len(),
            entities = state.by_id.len(),
            "fully loaded"
        );
        Ok(())
    }

    /// Entities selected by `predicate`
    ///
    /// An inactive predicate returns the current window. An active one
    /// loads the full corpus first and filters every cached entity, ordered
    /// by page position with created entities last.
    pub async fn query(&self, predicate: &Predicate) -> Result<Vec<Entity>, LoadError> {
        self.query_with(predicate, LivenessToken::detached()).await
    }

    /// [`query`](Self::query) with a liveness token for the full load
    pub async fn query_with(
        &self,
        predicate: &Predicate,
        token: LivenessToken,
    ) -> Result<Vec<Entity>, LoadError> {
        if !predicate.is_active() {
            return Ok(self.window());
        }
        self.ensure_fully_loaded_with(token).await?;

        let state = self.state.read();
        let mut hits: Vec<&Slot> = state
            .by_id
            .values()
            .filter(|slot| predicate.matches(&slot.entity))
            .collect();
        hits.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.entity.id.cmp(&b.entity.id))
        });
        Ok(hits.into_iter().map(|slot| slot.entity.clone()).collect())
    }

    /// Entities of the current window in server order
    pub fn window(&self) -> Vec<Entity> {
        let state = self.state.read();
        state
            .current_page
            .and_then(|page| state.page_items.get(&page))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.by_id.get(id))
                    .map(|slot| slot.entity.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cached entity by id
    pub fn get(&self, id: &EntityId) -> Option<Entity> {
        self.state.read().by_id.get(id).map(|slot| slot.entity.clone())
    }

    /// Number of cached entities
    pub fn len(&self) -> usize {
        self.state.read().by_id.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.state.read().by_id.is_empty()
    }

    /// Current load state
    pub fn load_state(&self) -> LoadState {
        let state = self.state.read();
        if state.fully_loaded {
            LoadState::FullyLoaded
        } else if state.loaded_pages.is_empty() {
            LoadState::Empty
        } else {
            LoadState::PartiallyLoaded
        }
    }

    /// Indices of loaded pages, ascending
    pub fn loaded_pages(&self) -> Vec<usize> {
        self.state.read().loaded_pages.iter().copied().collect()
    }

    /// Page count reported by the latest fetch
    pub fn total_pages(&self) -> Option<usize> {
        self.state.read().total_pages
    }

    /// Index of the current window
    pub fn current_page(&self) -> Option<usize> {
        self.state.read().current_page
    }

    /// Add the result of a creation call
    ///
    /// A new id is ordered after every paged entity. An id already cached
    /// is overwritten in place, keeping any optimistic status.
    pub fn insert_created(&self, entity: Entity) -> Entity {
        let stored = {
            let mut state = self.state.write();
            state.created += 1;
            let seq = state.created;
            let slot = state
                .by_id
                .entry(entity.id.clone())
                .and_modify(|slot| overwrite(slot, entity.clone(), None))
                .or_insert_with(|| Slot {
                    confirmed: entity.status,
                    position: Position::Created(seq),
                    entity,
                });
            slot.entity.clone()
        };
        debug!(kind = %self.kind, id = %stored.id, "inserted created entity");
        self.publish(&stored, ChangeCause::Created);
        stored
    }

    /// Forget loaded pages and every entity without a transition in flight
    pub fn refresh(&self) {
        let mut state = self.state.write();
        state.loaded_pages.clear();
        state.page_items.clear();
        state.current_page = None;
        state.fully_loaded = false;
        state.total_pages = None;
        state.by_id.retain(|_, slot| slot.entity.pending);
        debug!(kind = %self.kind, kept = state.by_id.len(), "cache refreshed");
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> broadcast::Receiver<EntityChange> {
        self.changes.subscribe()
    }

    /// Entity and its confirmed status
    pub(crate) fn snapshot(&self, id: &EntityId) -> Option<(Entity, Status)> {
        self.state
            .read()
            .by_id
            .get(id)
            .map(|slot| (slot.entity.clone(), slot.confirmed))
    }

    /// Write `target` optimistically and mark the entity pending
    pub(crate) fn begin_optimistic(&self, id: &EntityId, target: Status) -> Option<Entity> {
        let entity = {
            let mut state = self.state.write();
            let slot = state.by_id.get_mut(id)?;
            slot.entity.status = target;
            slot.entity.pending = true;
            slot.entity.clone()
        };
        self.publish(&entity, ChangeCause::Optimistic);
        Some(entity)
    }

    /// Settle a transition as confirmed
    ///
    /// Fields returned by the server are merged over the cached ones and its
    /// status wins over `target` when it belongs to this kind.
    pub(crate) fn commit_transition(
        &self,
        id: &EntityId,
        target: Status,
        server: Option<Entity>,
    ) -> Option<Entity> {
        let entity = {
            let mut state = self.state.write();
            let slot = state.by_id.get_mut(id)?;
            let mut status = target;
            if let Some(server) = server {
                if server.kind == self.kind {
                    status = server.status;
                }
                for (key, value) in server.fields {
                    slot.entity.fields.insert(key, value);
                }
            }
            slot.entity.status = status;
            slot.entity.pending = false;
            slot.confirmed = status;
            slot.entity.clone()
        };
        self.publish(&entity, ChangeCause::Committed);
        Some(entity)
    }

    /// Restore `previous` and clear the pending flag
    pub(crate) fn rollback_transition(&self, id: &EntityId, previous: Status) -> Option<Entity> {
        let entity = {
            let mut state = self.state.write();
            let slot = state.by_id.get_mut(id)?;
            slot.entity.status = previous;
            slot.entity.pending = false;
            slot.confirmed = previous;
            slot.entity.clone()
        };
        self.publish(&entity, ChangeCause::RolledBack);
        Some(entity)
    }

    async fn fetch(&self, page: usize) -> Result<Page, LoadError> {
        let call = self
            .transport
            .fetch_page(&self.ctx, self.kind, page, self.page_size);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => call.await,
        };
        result.map_err(|e| {
            warn!(kind = %self.kind, page, error = %e, "page fetch failed");
            LoadError::Remote {
                kind: self.kind,
                page,
                message: e.to_string(),
            }
        })
    }

    /// First page at or after `from` that still has to be fetched
    fn next_unloaded(&self, from: usize) -> Option<usize> {
        let state = self.state.read();
        match state.total_pages {
            None => Some(0),
            Some(total) => (from..total).find(|p| !state.loaded_pages.contains(p)),
        }
    }

    fn merge_page(&self, page: usize, fetched: Page, make_current: bool) -> Vec<Entity> {
        let merged = {
            let mut state = self.state.write();
            let mut ids = Vec::with_capacity(fetched.items.len());
            let mut seen = FxHashSet::default();
            for (index, item) in fetched.items.into_iter().enumerate() {
                if item.kind != self.kind {
                    warn!(kind = %self.kind, page, other = %item.kind, "skipping entity of another kind");
                    continue;
                }
                let id = item.id.clone();
                let position = Position::Paged { page, index };
                state
                    .by_id
                    .entry(id.clone())
                    .and_modify(|slot| overwrite(slot, item.clone(), Some(position)))
                    .or_insert_with(|| Slot {
                        confirmed: item.status,
                        position,
                        entity: item,
                    });
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }

            let entities: Vec<Entity> = ids
                .iter()
                .filter_map(|id| state.by_id.get(id))
                .map(|slot| slot.entity.clone())
                .collect();
            state.page_items.insert(page, ids);
            state.loaded_pages.insert(page);
            state.total_pages = Some(fetched.total_pages);
            if make_current {
                state.current_page = Some(page);
            }
            debug!(
                kind = %self.kind,
                page,
                items = entities.len(),
                total_pages = fetched.total_pages,
                "merged page"
            );
            entities
        };
        for entity in &merged {
            self.publish(entity, ChangeCause::Fetched);
        }
        merged
    }

    fn publish(&self, entity: &Entity, cause: ChangeCause) {
        // No receivers is not an error.
        let _ = self.changes.send(EntityChange::new(entity.clone(), cause));
    }
}

/// Last-write-wins merge that leaves an in-flight status alone
fn overwrite(slot: &mut Slot, incoming: Entity, position: Option<Position>) {
    if slot.entity.pending {
        slot.entity.fields = incoming.fields;
    } else {
        slot.confirmed = incoming.status;
        slot.entity = incoming;
    }
    if let Some(position) = position {
        slot.position = position;
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &self.kind)
            .field("page_size", &self.page_size)
            .field("load_state", &self.load_state())
            .field("len", &self.len())
            .finish()
    }
}
