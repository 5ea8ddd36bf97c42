//! Status vocabularies, one tagged variant per entity kind
//!
//! Each entity kind owns a finite status set. The per-kind enums carry the
//! backend wire string and the human label shown in listings, so every
//! screen renders the same label for the same status.
//!
//! [`Status`] is the kind-tagged union used wherever the kind is only known
//! at runtime (the cache, the registry, the transport).
//!
//! ## Vocabularies
//!
//! | Kind | Wire strings |
//! |------|--------------|
//! | Appointment | CONFIRMED, ARRIVED, OVERDUE, CANCELLED |
//! | ServiceTicket | CREATED, WAITING_FOR_QUOTATION, WAITING_FOR_DELIVERY, COMPLETED, CANCELED |
//! | PurchaseRequest | PENDING, APPROVED, REJECTED |
//! | PayrollRecord | PENDING, APPROVED, REJECTED |
//!
//! Note the backend spells the cancelled ticket status `CANCELED` while
//! appointments use `CANCELLED`.

use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// A per-kind status enum
///
/// Implemented by the four status enums of this module. Typed handles use it
/// to accept statuses of the right kind at compile time.
pub trait StatusSet:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static + Into<Status>
{
    /// Entity kind this status set belongs to
    const KIND: EntityKind;

    /// Every status of the set, in lifecycle order
    const ALL: &'static [Self];

    /// Backend wire string
    fn as_str(&self) -> &'static str;

    /// Human label used by listings
    fn label(&self) -> &'static str;

    /// Narrow a kind-tagged status to this set
    fn from_status(status: Status) -> Option<Self>;

    /// Parse a wire string (case-insensitive)
    fn parse(wire: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(wire.trim()))
    }
}

/// Appointment lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    /// Booked and confirmed
    Confirmed,
    /// Customer showed up
    Arrived,
    /// Customer missed the slot
    Overdue,
    /// Cancelled; irreversible
    Cancelled,
}

impl StatusSet for AppointmentStatus {
    const KIND: EntityKind = EntityKind::Appointment;
    const ALL: &'static [Self] = &[
        AppointmentStatus::Confirmed,
        AppointmentStatus::Arrived,
        AppointmentStatus::Overdue,
        AppointmentStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Arrived => "ARRIVED",
            AppointmentStatus::Overdue => "OVERDUE",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Arrived => "Arrived",
            AppointmentStatus::Overdue => "Overdue",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::Appointment(s) => Some(s),
            _ => None,
        }
    }
}

/// Service ticket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTicketStatus {
    /// Ticket opened at reception
    Created,
    /// Waiting for the customer to accept a quotation
    WaitingForQuotation,
    /// Work accepted, waiting for delivery of the vehicle
    WaitingForDelivery,
    /// Vehicle delivered
    Completed,
    /// Ticket cancelled
    Canceled,
}

impl StatusSet for ServiceTicketStatus {
    const KIND: EntityKind = EntityKind::ServiceTicket;
    const ALL: &'static [Self] = &[
        ServiceTicketStatus::Created,
        ServiceTicketStatus::WaitingForQuotation,
        ServiceTicketStatus::WaitingForDelivery,
        ServiceTicketStatus::Completed,
        ServiceTicketStatus::Canceled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ServiceTicketStatus::Created => "CREATED",
            ServiceTicketStatus::WaitingForQuotation => "WAITING_FOR_QUOTATION",
            ServiceTicketStatus::WaitingForDelivery => "WAITING_FOR_DELIVERY",
            ServiceTicketStatus::Completed => "COMPLETED",
            ServiceTicketStatus::Canceled => "CANCELED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ServiceTicketStatus::Created => "Created",
            ServiceTicketStatus::WaitingForQuotation => "Waiting for quotation",
            ServiceTicketStatus::WaitingForDelivery => "Waiting for delivery",
            ServiceTicketStatus::Completed => "Completed",
            ServiceTicketStatus::Canceled => "Canceled",
        }
    }

    fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::ServiceTicket(s) => Some(s),
            _ => None,
        }
    }
}

/// Purchase request approval lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseRequestStatus {
    /// Awaiting a decision
    Pending,
    /// Approved
    Approved,
    /// Rejected with a reason
    Rejected,
}

impl StatusSet for PurchaseRequestStatus {
    const KIND: EntityKind = EntityKind::PurchaseRequest;
    const ALL: &'static [Self] = &[
        PurchaseRequestStatus::Pending,
        PurchaseRequestStatus::Approved,
        PurchaseRequestStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PurchaseRequestStatus::Pending => "PENDING",
            PurchaseRequestStatus::Approved => "APPROVED",
            PurchaseRequestStatus::Rejected => "REJECTED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PurchaseRequestStatus::Pending => "Pending approval",
            PurchaseRequestStatus::Approved => "Approved",
            PurchaseRequestStatus::Rejected => "Rejected",
        }
    }

    fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::PurchaseRequest(s) => Some(s),
            _ => None,
        }
    }
}

/// Payroll approval lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    /// Awaiting manager approval
    Pending,
    /// Approved by a manager
    Approved,
    /// Rejected by a manager
    Rejected,
}

impl StatusSet for PayrollStatus {
    const KIND: EntityKind = EntityKind::PayrollRecord;
    const ALL: &'static [Self] = &[
        PayrollStatus::Pending,
        PayrollStatus::Approved,
        PayrollStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Pending => "PENDING",
            PayrollStatus::Approved => "APPROVED",
            PayrollStatus::Rejected => "REJECTED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PayrollStatus::Pending => "Pending approval",
            PayrollStatus::Approved => "Approved",
            PayrollStatus::Rejected => "Rejected",
        }
    }

    fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::PayrollRecord(s) => Some(s),
            _ => None,
        }
    }
}

impl From<AppointmentStatus> for Status {
    fn from(s: AppointmentStatus) -> Self {
        Status::Appointment(s)
    }
}

impl From<ServiceTicketStatus> for Status {
    fn from(s: ServiceTicketStatus) -> Self {
        Status::ServiceTicket(s)
    }
}

impl From<PurchaseRequestStatus> for Status {
    fn from(s: PurchaseRequestStatus) -> Self {
        Status::PurchaseRequest(s)
    }
}

impl From<PayrollStatus> for Status {
    fn from(s: PayrollStatus) -> Self {
        Status::PayrollRecord(s)
    }
}

/// Kind-tagged status
///
/// Serializes adjacently tagged: `{"kind": "Appointment", "status": "CONFIRMED"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status")]
pub enum Status {
    /// Appointment status
    Appointment(AppointmentStatus),
    /// Service ticket status
    ServiceTicket(ServiceTicketStatus),
    /// Purchase request status
    PurchaseRequest(PurchaseRequestStatus),
    /// Payroll record status
    PayrollRecord(PayrollStatus),
}

impl Status {
    /// Entity kind this status belongs to
    pub fn kind(&self) -> EntityKind {
        match self {
            Status::Appointment(_) => EntityKind::Appointment,
            Status::ServiceTicket(_) => EntityKind::ServiceTicket,
            Status::PurchaseRequest(_) => EntityKind::PurchaseRequest,
            Status::PayrollRecord(_) => EntityKind::PayrollRecord,
        }
    }

    /// Backend wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Appointment(s) => s.as_str(),
            Status::ServiceTicket(s) => s.as_str(),
            Status::PurchaseRequest(s) => s.as_str(),
            Status::PayrollRecord(s) => s.as_str(),
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            Status::Appointment(s) => s.label(),
            Status::ServiceTicket(s) => s.label(),
            Status::PurchaseRequest(s) => s.label(),
            Status::PayrollRecord(s) => s.label(),
        }
    }

    /// Parse the wire string of a status of `kind`
    pub fn parse(kind: EntityKind, wire: &str) -> Option<Status> {
        match kind {
            EntityKind::Appointment => AppointmentStatus::parse(wire).map(Status::from),
            EntityKind::ServiceTicket => ServiceTicketStatus::parse(wire).map(Status::from),
            EntityKind::PurchaseRequest => PurchaseRequestStatus::parse(wire).map(Status::from),
            EntityKind::PayrollRecord => PayrollStatus::parse(wire).map(Status::from),
        }
    }

    /// Every status of `kind`
    pub fn all(kind: EntityKind) -> Vec<Status> {
        fn collect<S: StatusSet>() -> Vec<Status> {
            S::ALL.iter().copied().map(Into::into).collect()
        }
        match kind {
            EntityKind::Appointment => collect::<AppointmentStatus>(),
            EntityKind::ServiceTicket => collect::<ServiceTicketStatus>(),
            EntityKind::PurchaseRequest => collect::<PurchaseRequestStatus>(),
            EntityKind::PayrollRecord => collect::<PayrollStatus>(),
        }
    }

    /// Status a freshly created entity of `kind` starts in
    pub fn initial(kind: EntityKind) -> Status {
        match kind {
            EntityKind::Appointment => AppointmentStatus::Confirmed.into(),
            EntityKind::ServiceTicket => ServiceTicketStatus::Created.into(),
            EntityKind::PurchaseRequest => PurchaseRequestStatus::Pending.into(),
            EntityKind::PayrollRecord => PayrollStatus::Pending.into(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
