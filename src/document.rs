//! Schema-free document model shared by all backends
//!
//! The storage layer is intentionally agnostic to document shape: a document
//! is a string-keyed JSON object whose only engine-level requirement is a
//! string `id` field unique within its collection. Validation of everything
//! else belongs to the caller.

use serde_json::{Map, Value};

/// A single schema-free record
pub type Document = Map<String, Value>;

/// Name of the identifier field every stored document carries
pub const ID_FIELD: &str = "id";

/// Get a document's `id` field, if present and a string
pub fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Set a document's `id` field
pub fn set_doc_id(doc: &mut Document, id: impl Into<String>) {
    doc.insert(ID_FIELD.to_string(), Value::String(id.into()));
}

/// Shallow-merge `fields` into `target`.
///
/// Existing keys are overwritten, all other keys are left untouched. Nested
/// objects are replaced wholesale, not merged recursively — `update` is a
/// field-level merge, never a deep one.
pub fn merge_fields(target: &mut Document, fields: &Document) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}

/// Convert a JSON value into a [`Document`], if it is an object
pub fn from_value(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
