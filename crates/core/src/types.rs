//! Core identity types for the transition engine
//!
//! This module defines the fundamental types used throughout the system:
//! - [`EntityId`]: Backend identifier of a business record
//! - [`EntityKind`]: The kind of record (appointment, service ticket, ...)
//! - [`EntityKey`]: `(kind, id)` pair; ids are only unique within a kind
//! - [`Role`]: Acting role of the dashboard session

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend identifier of an entity
///
/// The garage API hands out numeric ids for some resources and string codes
/// for others, so ids are kept as opaque strings. Integer ids are rendered
/// in decimal.
///
/// # Examples
///
/// ```
/// use pitlane_core::types::EntityId;
///
/// let a = EntityId::from(42u64);
/// let b = EntityId::new("42");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    /// Create a new random id (UUID v4)
    ///
    /// Used by in-process backends that have to mint ids for created records.
    pub fn generate() -> Self {
        EntityId(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId(id.to_string())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of business record managed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Customer appointment at the garage
    Appointment,
    /// Repair/service ticket
    ServiceTicket,
    /// Parts purchase request awaiting approval
    PurchaseRequest,
    /// Monthly payroll record awaiting approval
    PayrollRecord,
}

impl EntityKind {
    /// Every kind, in declaration order
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Appointment,
        EntityKind::ServiceTicket,
        EntityKind::PurchaseRequest,
        EntityKind::PayrollRecord,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Appointment => "Appointment",
            EntityKind::ServiceTicket => "ServiceTicket",
            EntityKind::PurchaseRequest => "PurchaseRequest",
            EntityKind::PayrollRecord => "PayrollRecord",
        }
    }

    /// Fields searched by a plain-text query when no field list is given
    pub fn default_search_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Appointment => &["customerName", "licensePlate", "phoneNumber"],
            EntityKind::ServiceTicket => &["customerName", "licensePlate", "code"],
            EntityKind::PurchaseRequest => &["code", "requesterName", "reason"],
            EntityKind::PayrollRecord => &["employeeName", "period"],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    /// Accepts `ServiceTicket`, `serviceticket` and `service_ticket`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&compact))
            .ok_or_else(|| format!("unknown entity kind '{}'", s))
    }
}

/// Fully qualified entity reference
///
/// Guard entries and change events are keyed by `EntityKey` because an
/// appointment and a service ticket may share the same backend id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Kind of the entity
    pub kind: EntityKind,
    /// Backend id within that kind
    pub id: EntityId,
}

impl EntityKey {
    /// Create a new key
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    /// Display key in the format: kind/id
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Acting role of a dashboard session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Garage manager; required for payroll approval
    Manager,
    /// Front-desk staff
    #[default]
    Receptionist,
    /// Workshop mechanic
    Mechanic,
    /// Accounting staff
    Accountant,
}

impl Role {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Receptionist => "RECEPTIONIST",
            Role::Mechanic => "MECHANIC",
            Role::Accountant => "ACCOUNTANT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
