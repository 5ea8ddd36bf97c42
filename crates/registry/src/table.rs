//! Transition tables and the registry
//!
//! A [`TransitionTable`] is the directed status graph of one entity kind.
//! The [`Registry`] holds one table per kind and answers every legality
//! question the coordinator asks. Lookups are pure: no side effects, no
//! errors. Only building a registry can fail.

use crate::rule::{PayloadSchema, TransitionRule};
use pitlane_core::{EntityKind, Role, Status};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use thiserror::Error;

/// Problems detected while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Rule from a status to itself
    #[error("self-loop rule on {kind} status {status}")]
    SelfLoop {
        /// Kind of the status
        kind: EntityKind,
        /// Offending status
        status: Status,
    },

    /// Rule connecting statuses of different kinds
    #[error("rule {from} -> {to} crosses kinds ({from_kind} -> {to_kind})")]
    KindMismatch {
        /// Source status
        from: Status,
        /// Kind of the source status
        from_kind: EntityKind,
        /// Target status
        to: Status,
        /// Kind of the target status
        to_kind: EntityKind,
    },

    /// The same edge declared twice
    #[error("duplicate rule on {kind}: {from} -> {to}")]
    DuplicateEdge {
        /// Kind of the edge
        kind: EntityKind,
        /// Source status
        from: Status,
        /// Target status
        to: Status,
    },
}

/// Status graph of one entity kind
#[derive(Debug, Clone)]
pub struct TransitionTable {
    kind: EntityKind,
    rules: Vec<TransitionRule>,
    /// Source status -> indexes into `rules`
    edges: FxHashMap<Status, SmallVec<[usize; 4]>>,
}

impl TransitionTable {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            edges: FxHashMap::default(),
        }
    }

    fn insert(&mut self, rule: TransitionRule) -> Result<(), RegistryError> {
        if self.rule(rule.from, rule.to).is_some() {
            return Err(RegistryError::DuplicateEdge {
                kind: self.kind,
                from: rule.from,
                to: rule.to,
            });
        }
        let index = self.rules.len();
        self.edges.entry(rule.from).or_default().push(index);
        self.rules.push(rule);
        Ok(())
    }

    /// Kind this table describes
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// All rules, in insertion order
    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    /// Rule for the edge `from -> to`
    pub fn rule(&self, from: Status, to: Status) -> Option<&TransitionRule> {
        self.edges
            .get(&from)?
            .iter()
            .map(|&i| &self.rules[i])
            .find(|rule| rule.to == to)
    }

    /// Statuses reachable in one step from `from`
    pub fn allowed_targets(&self, from: Status) -> BTreeSet<Status> {
        self.edges
            .get(&from)
            .map(|indexes| indexes.iter().map(|&i| self.rules[i].to).collect())
            .unwrap_or_default()
    }

    /// Check if `status` has no outgoing rule
    pub fn is_terminal(&self, status: Status) -> bool {
        self.edges.get(&status).map_or(true, |indexes| indexes.is_empty())
    }

    /// Every terminal status of the kind, in lifecycle order
    pub fn terminal_states(&self) -> Vec<Status> {
        Status::all(self.kind)
            .into_iter()
            .filter(|s| self.is_terminal(*s))
            .collect()
    }
}

/// Legal status edges for every entity kind
///
/// # Example
///
/// ```
/// use pitlane_core::{EntityKind, ServiceTicketStatus};
/// use pitlane_registry::Registry;
///
/// let registry = Registry::standard();
/// assert!(registry.is_allowed(
///     EntityKind::ServiceTicket,
///     ServiceTicketStatus::Created.into(),
///     ServiceTicketStatus::Canceled.into(),
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    tables: FxHashMap<EntityKind, TransitionTable>,
}

impl Registry {
    /// Start building a custom registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Table of `kind`
    pub fn table(&self, kind: EntityKind) -> &TransitionTable {
        // Every kind gets a table at build time.
        &self.tables[&kind]
    }

    /// Rule for `from -> to` within `kind`
    ///
    /// Statuses of another kind never match.
    pub fn rule(&self, kind: EntityKind, from: Status, to: Status) -> Option<&TransitionRule> {
        if from.kind() != kind || to.kind() != kind {
            return None;
        }
        self.table(kind).rule(from, to)
    }

    /// Statuses `kind` may move to from `from`
    pub fn allowed_targets(&self, kind: EntityKind, from: Status) -> BTreeSet<Status> {
        if from.kind() != kind {
            return BTreeSet::new();
        }
        self.table(kind).allowed_targets(from)
    }

    /// Check if `from -> to` is a legal edge of `kind`
    pub fn is_allowed(&self, kind: EntityKind, from: Status, to: Status) -> bool {
        self.rule(kind, from, to).is_some()
    }

    /// Payload schema the edge requires, if any
    pub fn payload_schema_for(
        &self,
        kind: EntityKind,
        from: Status,
        to: Status,
    ) -> Option<PayloadSchema> {
        self.rule(kind, from, to)?.requires_payload
    }

    /// Role the edge requires, if any
    pub fn actor_for(&self, kind: EntityKind, from: Status, to: Status) -> Option<Role> {
        self.rule(kind, from, to)?.actor
    }

    /// Check if `status` is terminal within its own kind
    pub fn is_terminal(&self, status: Status) -> bool {
        self.table(status.kind()).is_terminal(status)
    }

    /// Terminal statuses of `kind`
    pub fn terminal_states(&self, kind: EntityKind) -> Vec<Status> {
        self.table(kind).terminal_states()
    }
}

/// Builder for [`Registry`]
///
/// Kinds without any rule get an empty table, so all their statuses are
/// terminal.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    rules: Vec<TransitionRule>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one rule
    pub fn rule(mut self, rule: TransitionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add several rules
    pub fn rules(mut self, rules: impl IntoIterator<Item = TransitionRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut tables: FxHashMap<EntityKind, TransitionTable> = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, TransitionTable::new(kind)))
            .collect();

        for rule in self.rules {
            let (from_kind, to_kind) = (rule.from.kind(), rule.to.kind());
            if from_kind != to_kind || rule.kind != from_kind {
                return Err(RegistryError::KindMismatch {
                    from: rule.from,
                    from_kind,
                    to: rule.to,
                    to_kind,
                });
            }
            if rule.from == rule.to {
                return Err(RegistryError::SelfLoop {
                    kind: rule.kind,
                    status: rule.from,
                });
            }
            if let Some(table) = tables.get_mut(&rule.kind) {
                table.insert(rule)?;
            }
        }

        Ok(Registry { tables })
    }
}
