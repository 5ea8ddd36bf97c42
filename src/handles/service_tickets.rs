//! Service ticket workflow.
//!
//! ```text
//! CREATED ─► WAITING_FOR_QUOTATION ─► WAITING_FOR_DELIVERY ─► COMPLETED
//!    └──────────────┴──────────────────────────┴─────────────► CANCELED
//! ```

use super::ServiceTickets;
use crate::error::Result;
use pitlane_core::{Entity, EntityId, ServiceTicketStatus};

impl ServiceTickets {
    /// Quotation sent to the customer.
    pub async fn send_quotation(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, ServiceTicketStatus::WaitingForQuotation)
            .await
    }

    /// Customer accepted the quotation.
    pub async fn accept_quotation(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, ServiceTicketStatus::WaitingForDelivery)
            .await
    }

    /// Vehicle delivered.
    pub async fn complete(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, ServiceTicketStatus::Completed).await
    }

    /// Cancel the ticket.
    pub async fn cancel(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, ServiceTicketStatus::Canceled).await
    }
}
