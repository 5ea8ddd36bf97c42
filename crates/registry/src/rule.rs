//! Transition rules and payload schemas

use pitlane_core::{EntityKind, Payload, Role, Status, TransitionError};
use serde_json::Value;
use thiserror::Error;

/// One legal edge of a kind's status graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRule {
    /// Kind both statuses belong to
    pub kind: EntityKind,
    /// Source status
    pub from: Status,
    /// Target status
    pub to: Status,
    /// Payload the caller must supply, if any
    pub requires_payload: Option<PayloadSchema>,
    /// Role the acting session must have, if any
    pub actor: Option<Role>,
}

impl TransitionRule {
    /// Create an unconstrained rule `from -> to`
    ///
    /// The kind is taken from `from`. Rules whose `to` belongs to another
    /// kind are rejected when the registry is built.
    pub fn new(from: impl Into<Status>, to: impl Into<Status>) -> Self {
        let from = from.into();
        Self {
            kind: from.kind(),
            from,
            to: to.into(),
            requires_payload: None,
            actor: None,
        }
    }

    /// Require a payload matching `schema`
    pub fn requires(mut self, schema: PayloadSchema) -> Self {
        self.requires_payload = Some(schema);
        self
    }

    /// Restrict the rule to sessions acting as `role`
    pub fn actor(mut self, role: Role) -> Self {
        self.actor = Some(role);
        self
    }
}

/// Shape a transition payload must have
///
/// Every listed field must be present, be a JSON string, and be non-blank
/// after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSchema {
    required_text: &'static [&'static str],
}

impl PayloadSchema {
    /// A non-blank `reason` string
    pub const REASON: PayloadSchema = PayloadSchema::required_text(&["reason"]);

    /// Schema requiring the given text fields
    pub const fn required_text(fields: &'static [&'static str]) -> Self {
        Self {
            required_text: fields,
        }
    }

    /// Required text fields
    pub fn fields(&self) -> &'static [&'static str] {
        self.required_text
    }

    /// Check a payload against the schema
    ///
    /// Reports the first offending field in declaration order.
    pub fn validate(&self, payload: Option<&Payload>) -> Result<(), PayloadViolation> {
        for field in self.required_text {
            let problem = match payload.and_then(|p| p.get(*field)) {
                None | Some(Value::Null) => Some(ViolationKind::Missing),
                Some(Value::String(text)) if text.trim().is_empty() => Some(ViolationKind::Blank),
                Some(Value::String(_)) => None,
                Some(_) => Some(ViolationKind::NotText),
            };
            if let Some(problem) = problem {
                return Err(PayloadViolation {
                    field: (*field).to_string(),
                    problem,
                });
            }
        }
        Ok(())
    }
}

/// What is wrong with a payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Field absent or null
    Missing,
    /// Field is whitespace only
    Blank,
    /// Field is not a string
    NotText,
}

impl ViolationKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Missing => "is required",
            ViolationKind::Blank => "must not be blank",
            ViolationKind::NotText => "must be text",
        }
    }
}

/// A payload field failing its schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload field '{field}' {}", .problem.as_str())]
pub struct PayloadViolation {
    /// Offending field
    pub field: String,
    /// What is wrong with it
    pub problem: ViolationKind,
}

impl From<PayloadViolation> for TransitionError {
    fn from(v: PayloadViolation) -> Self {
        TransitionError::Validation {
            field: v.field,
            problem: v.problem.as_str().to_string(),
        }
    }
}
