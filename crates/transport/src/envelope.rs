//! List and entity envelope normalization
//!
//! The garage API is inconsistent about response shapes. List endpoints
//! answer with any of:
//!
//! ```json
//! [ {...}, {...} ]
//! { "content": [ ... ], "totalPages": 3, "totalElements": 18 }
//! { "result": { "content": [ ... ], "totalPages": 3 } }
//! { "data": [ ... ] }
//! ```
//!
//! and single-entity endpoints with a bare object, `{ "result": {...} }`,
//! `{ "data": {...} }` or no body at all. All of that is resolved here so
//! nothing above the transport branches on response shape.

use crate::error::DecodeError;
use pitlane_core::{Entity, EntityId, EntityKind, Payload, Status};
use serde_json::Value;

/// Envelope keys that wrap the real payload
const WRAPPER_KEYS: [&str; 2] = ["result", "data"];

/// A list response with its envelope removed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListPayload {
    /// Raw entity objects in server order
    pub items: Vec<Value>,
    /// `totalPages`, when the envelope carries it
    pub total_pages: Option<usize>,
    /// `totalElements`, when the envelope carries it
    pub total_elements: Option<usize>,
}

impl ListPayload {
    /// Page count, derived when the envelope does not state it
    ///
    /// Falls back to `totalElements / page_size` (rounded up), and to a
    /// single page for bare arrays.
    pub fn total_pages(&self, page_size: usize) -> usize {
        if let Some(pages) = self.total_pages {
            return pages;
        }
        match self.total_elements {
            Some(total) if page_size > 0 => total.div_ceil(page_size),
            _ => 1,
        }
    }
}

/// Strip the envelope of a list response
pub fn unwrap_list_payload(body: Value) -> Result<ListPayload, DecodeError> {
    match body {
        Value::Null => Ok(ListPayload::default()),
        Value::Array(items) => Ok(ListPayload {
            items,
            ..ListPayload::default()
        }),
        Value::Object(mut map) => {
            if let Some(content) = map.remove("content") {
                let Value::Array(items) = content else {
                    return Err(DecodeError::UnexpectedShape(
                        "'content' is not an array".to_string(),
                    ));
                };
                return Ok(ListPayload {
                    items,
                    total_pages: count(map.get("totalPages")),
                    total_elements: count(map.get("totalElements")),
                });
            }
            for key in WRAPPER_KEYS {
                if let Some(inner) = map.remove(key) {
                    return unwrap_list_payload(inner);
                }
            }
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            Err(DecodeError::UnexpectedShape(format!(
                "object without list content (keys: {})",
                keys.join(", ")
            )))
        }
        other => Err(DecodeError::UnexpectedShape(format!(
            "expected list, got {}",
            type_name(&other)
        ))),
    }
}

/// Strip the envelope of a single-entity response
///
/// Returns `None` when the body carries no entity (empty, a status message,
/// or a scalar).
pub fn unwrap_entity_payload(body: Value) -> Option<Value> {
    match body {
        Value::Object(mut map) => {
            if map.contains_key("id") {
                return Some(Value::Object(map));
            }
            WRAPPER_KEYS
                .into_iter()
                .find_map(|key| map.remove(key))
                .and_then(unwrap_entity_payload)
        }
        _ => None,
    }
}

/// Decode one entity object of `kind`
///
/// `id` may be a string or a non-negative integer; `status` must be a wire
/// string of the kind. Every other key becomes a field.
pub fn entity_from_json(kind: EntityKind, value: Value) -> Result<Entity, DecodeError> {
    let Value::Object(mut map) = value else {
        return Err(DecodeError::UnexpectedShape(format!(
            "expected entity object, got {}",
            type_name(&value)
        )));
    };

    let id = match map.remove("id") {
        Some(Value::String(s)) if !s.is_empty() => EntityId::from(s),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(EntityId::from)
            .ok_or_else(|| DecodeError::InvalidId(n.to_string()))?,
        Some(other) => return Err(DecodeError::InvalidId(other.to_string())),
        None => return Err(DecodeError::MissingField("id")),
    };

    let status = match map.remove("status") {
        Some(Value::String(wire)) => {
            Status::parse(kind, &wire).ok_or(DecodeError::UnknownStatus { kind, status: wire })?
        }
        Some(other) => {
            return Err(DecodeError::UnknownStatus {
                kind,
                status: other.to_string(),
            })
        }
        None => return Err(DecodeError::MissingField("status")),
    };

    let mut entity = Entity::new(id, status);
    entity.fields = map;
    Ok(entity)
}

/// Encode an entity the way the backend shapes it
pub fn entity_to_json(entity: &Entity) -> Value {
    let mut map = Payload::new();
    map.insert("id".to_string(), Value::String(entity.id.to_string()));
    map.insert(
        "status".to_string(),
        Value::String(entity.status.as_str().to_string()),
    );
    for (key, value) in &entity.fields {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

fn count(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
