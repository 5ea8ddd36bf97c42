//! Payroll approvals.
//!
//! Only a session acting as `Manager` may approve or reject.

use super::Payroll;
use crate::error::Result;
use pitlane_core::{reason, Entity, EntityId, PayrollStatus};

impl Payroll {
    /// Approve a pending payroll record.
    pub async fn approve(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, PayrollStatus::Approved).await
    }

    /// Reject a pending payroll record; `why` must not be blank.
    pub async fn reject(&self, id: impl Into<EntityId>, why: impl Into<String>) -> Result<Entity> {
        self.transition_with(id, PayrollStatus::Rejected, reason(why))
            .await
    }

    /// Records waiting for a decision.
    pub async fn pending(&self) -> Result<Vec<Entity>> {
        self.with_status(PayrollStatus::Pending).await
    }
}
