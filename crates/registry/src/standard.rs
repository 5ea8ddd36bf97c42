//! Standard transition matrices of the garage backend
//!
//! ```text
//! Appointment      CONFIRMED ─┬─> ARRIVED
//!                             ├─> OVERDUE
//!                             └─> CANCELLED
//!
//! ServiceTicket    CREATED ──> WAITING_FOR_QUOTATION ──> WAITING_FOR_DELIVERY ──> COMPLETED
//!                     └──────────────┴──────────────────────────┴──> CANCELED
//!
//! PurchaseRequest  PENDING ─┬─> APPROVED
//!                           └─> REJECTED   (reason required)
//!
//! PayrollRecord    PENDING ─┬─> APPROVED   (manager only)
//!                           └─> REJECTED   (manager only, reason required)
//! ```

use crate::rule::{PayloadSchema, TransitionRule};
use crate::table::Registry;
use once_cell::sync::Lazy;
use pitlane_core::{
    AppointmentStatus as A, PayrollStatus as P, PurchaseRequestStatus as R, Role,
    ServiceTicketStatus as T,
};
use std::sync::Arc;

static STANDARD: Lazy<Arc<Registry>> = Lazy::new(|| {
    let registry = Registry::builder()
        .rules(standard_rules())
        .build()
        .unwrap_or_else(|e| panic!("standard transition table is inconsistent: {}", e));
    Arc::new(registry)
});

/// Rules of the standard registry
pub fn standard_rules() -> Vec<TransitionRule> {
    vec![
        TransitionRule::new(A::Confirmed, A::Arrived),
        TransitionRule::new(A::Confirmed, A::Overdue),
        TransitionRule::new(A::Confirmed, A::Cancelled),
        TransitionRule::new(T::Created, T::WaitingForQuotation),
        TransitionRule::new(T::Created, T::Canceled),
        TransitionRule::new(T::WaitingForQuotation, T::WaitingForDelivery),
        TransitionRule::new(T::WaitingForQuotation, T::Canceled),
        TransitionRule::new(T::WaitingForDelivery, T::Completed),
        TransitionRule::new(T::WaitingForDelivery, T::Canceled),
        TransitionRule::new(R::Pending, R::Approved),
        TransitionRule::new(R::Pending, R::Rejected).requires(PayloadSchema::REASON),
        TransitionRule::new(P::Pending, P::Approved).actor(Role::Manager),
        TransitionRule::new(P::Pending, P::Rejected)
            .requires(PayloadSchema::REASON)
            .actor(Role::Manager),
    ]
}

impl Registry {
    /// The standard registry, built once per process
    pub fn standard() -> Arc<Registry> {
        Arc::clone(&STANDARD)
    }
}
