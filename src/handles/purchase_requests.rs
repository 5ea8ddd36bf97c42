//! Purchase request approvals.

use super::PurchaseRequests;
use crate::error::Result;
use pitlane_core::{reason, Entity, EntityId, PurchaseRequestStatus};

impl PurchaseRequests {
    /// Approve a pending request.
    pub async fn approve(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, PurchaseRequestStatus::Approved).await
    }

    /// Reject a pending request; `why` must not be blank.
    pub async fn reject(&self, id: impl Into<EntityId>, why: impl Into<String>) -> Result<Entity> {
        self.transition_with(id, PurchaseRequestStatus::Rejected, reason(why))
            .await
    }

    /// Requests waiting for a decision.
    pub async fn pending(&self) -> Result<Vec<Entity>> {
        self.with_status(PurchaseRequestStatus::Pending).await
    }
}
