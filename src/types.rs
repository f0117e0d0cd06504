//! Document model: field names and navigation over RAML-derived JSON trees.
//!
//! Documents are plain `serde_json::Value` trees. Nothing here assumes a fixed
//! schema for arbitrary subtrees; helpers only look for the field names that
//! the expansion pipeline cares about.

use serde_json::Value;

/// Content type whose `schema` is compiled and projected.
pub const APPLICATION_JSON: &str = "application/json";

/// Content type carrying legacy `formParameters`.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Field holding the presentation-only projection of a body schema.
pub const SCHEMA_HASH: &str = "schema_hash";

/// Fields a security scheme's `describedBy` may contribute to a method.
pub const SECURITY_FIELDS: &[&str] = &["headers", "queryParameters", "responses"];

/// Form parameter keywords that are not valid JSON Schema keywords.
pub const RAML_ONLY_KEYWORDS: &[&str] = &["repeat", "displayName"];

/// Default `$schema` URI for synthesized schemas.
pub const DEFAULT_SCHEMA_URI: &str = "http://json-schema.org/draft-04/schema#";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Child resources of a resource (or of the document root).
pub fn resources(node: &Value) -> &[Value] {
    node.get("resources")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The `relativeUri` of a resource, or an empty string.
pub fn relative_uri(resource: &Value) -> &str {
    resource
        .get("relativeUri")
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// The verb of a method, or an empty string.
pub fn verb(method: &Value) -> &str {
    method.get("method").and_then(Value::as_str).unwrap_or("")
}

/// One entry of a method's `is` or `securedBy` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// A bare name, or the key of a single-entry mapping of name to
    /// parameters.
    Name(String),
    /// `null`, which in `securedBy` marks the method as also reachable
    /// without authentication.
    Null,
    /// An entry that names nothing: a number, a boolean, a nested list, or a
    /// mapping without exactly one key.
    Invalid(Value),
}

/// Entries of a method's `is` or `securedBy` list, in order.
pub fn references(method: &Value, field: &str) -> Vec<Reference> {
    let Some(entries) = method.get(field).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(name) => Reference::Name(name.clone()),
            Value::Object(map) if map.len() == 1 => map
                .keys()
                .next()
                .cloned()
                .map_or_else(|| Reference::Invalid(entry.clone()), Reference::Name),
            Value::Null => Reference::Null,
            other => Reference::Invalid(other.clone()),
        })
        .collect()
}
