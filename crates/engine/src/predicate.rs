//! Search predicates over cached entities

use pitlane_core::Entity;
use std::sync::Arc;

/// Filter applied by [`crate::EntityCache::query`]
///
/// An inactive predicate (`None`, or text that is blank after trimming)
/// selects the current window. An active one selects from the full corpus.
#[derive(Clone, Default)]
pub enum Predicate {
    /// No filter
    #[default]
    None,
    /// Case-insensitive substring match over string fields
    Text {
        /// Text to look for
        needle: String,
        /// Fields to search; the kind's default search fields when `None`
        fields: Option<Vec<String>>,
    },
    /// Arbitrary filter
    Custom(Arc<dyn Fn(&Entity) -> bool + Send + Sync>),
}

impl Predicate {
    /// Substring search over the kind's default fields
    pub fn text(needle: impl Into<String>) -> Self {
        Predicate::Text {
            needle: needle.into(),
            fields: None,
        }
    }

    /// Substring search over the named fields
    pub fn text_in<I, S>(needle: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::Text {
            needle: needle.into(),
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Filter with a closure
    pub fn custom(f: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Custom(Arc::new(f))
    }

    /// Check if this predicate filters anything
    pub fn is_active(&self) -> bool {
        match self {
            Predicate::None => false,
            Predicate::Text { needle, .. } => !needle.trim().is_empty(),
            Predicate::Custom(_) => true,
        }
    }

    /// Check if `entity` passes
    ///
    /// Inactive predicates match everything.
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Predicate::None => true,
            Predicate::Text { needle, fields } => {
                let needle = needle.trim().to_lowercase();
                if needle.is_empty() {
                    return true;
                }
                let hit = |name: &str| {
                    entity
                        .text(name)
                        .is_some_and(|value| value.to_lowercase().contains(&needle))
                };
                match fields {
                    Some(fields) => fields.iter().any(|f| hit(f)),
                    None => entity.kind.default_search_fields().iter().any(|f| hit(f)),
                }
            }
            Predicate::Custom(f) => f(entity),
        }
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::None => write!(f, "None"),
            Predicate::Text { needle, fields } => f
                .debug_struct("Text")
                .field("needle", needle)
                .field("fields", fields)
                .finish(),
            Predicate::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

impl From<&str> for Predicate {
    fn from(needle: &str) -> Self {
        Predicate::text(needle)
    }
}

impl From<String> for Predicate {
    fn from(needle: String) -> Self {
        Predicate::text(needle)
    }
}
