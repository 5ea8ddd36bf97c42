//! The transport contract consumed by the cache and the coordinator

use crate::context::SessionContext;
use crate::error::TransportError;
use async_trait::async_trait;
use pitlane_core::{Entity, EntityId, EntityKind, Payload, Status};

/// One page of entities as delivered by the backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Entities in server order
    pub items: Vec<Entity>,
    /// Page count reported by the backend at fetch time
    pub total_pages: usize,
}

/// Backend access used by the engine
///
/// Implementations own the wire format: whether lists arrive bare or inside
/// an envelope is normalized before a [`Page`] is returned (see
/// [`crate::envelope`]). Every call receives the session context
/// explicitly.
///
/// # Implementation Notes
///
/// - `mutate` may return `None` when the backend accepted the change but
///   answered without a usable body; the engine then keeps the optimistic
///   status as confirmed. An error means the change was not applied.
/// - The trait requires `Send + Sync`; one transport is shared by every
///   per-kind cache.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch page `page` of `kind`
    async fn fetch_page(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        page: usize,
        page_size: usize,
    ) -> Result<Page, TransportError>;

    /// Ask the backend to move `id` to `target`
    async fn mutate(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        id: &EntityId,
        target: Status,
        payload: Option<&Payload>,
    ) -> Result<Option<Entity>, TransportError>;

    /// Create a new entity of `kind`
    async fn create(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        fields: Payload,
    ) -> Result<Entity, TransportError> {
        let _ = (ctx, kind, fields);
        Err(TransportError::Unsupported("create"))
    }
}
