//! The parsed API document and its name-keyed trait and security tables.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::loader::load_json;
use crate::types::{json_type_name, resources};

/// A raw API document, read once and never mutated.
///
/// Expansion and export each work on their own clones of the parts they need,
/// so neither can observe the other's changes.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    raw: Value,
    traits: Map<String, Value>,
    security_schemes: Map<String, Value>,
    base_dir: PathBuf,
}

impl ApiDocument {
    /// Load a document from a JSON file. `$ref` paths in embedded schemas are
    /// resolved relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        let raw = load_json(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_value(raw, base_dir)
    }

    /// Build a document from an already parsed tree.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidDocument` if the root is not a mapping or
    /// if `traits` / `securitySchemes` have an unexpected shape.
    pub fn from_value(raw: Value, base_dir: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        if !raw.is_object() {
            return Err(ResolveError::InvalidDocument {
                message: format!("expected object at root, got {}", json_type_name(&raw)),
            });
        }

        let traits = flatten_named(raw.get("traits"), "traits")?;
        let mut security_schemes = flatten_named(raw.get("securitySchemes"), "securitySchemes")?;
        for (name, scheme) in security_schemes.iter_mut() {
            annotate_scheme(name, scheme);
        }

        Ok(Self {
            raw,
            traits,
            security_schemes,
            base_dir: base_dir.into(),
        })
    }

    /// The document exactly as it was read.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Directory that embedded `$ref` paths are relative to.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Top-level resources.
    pub fn resources(&self) -> &[Value] {
        resources(&self.raw)
    }

    /// Documentation items (`title` + `content`).
    pub fn documentation(&self) -> &[Value] {
        self.raw
            .get("documentation")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn traits(&self) -> &Map<String, Value> {
        &self.traits
    }

    /// Security schemes, each with a `title` equal to its name and a
    /// `displayName` on every described header and query parameter.
    pub fn security_schemes(&self) -> &Map<String, Value> {
        &self.security_schemes
    }
}

/// Flatten a sequence of single-entry mappings into one name-keyed mapping.
///
/// A plain mapping is accepted as is. Later duplicates replace earlier ones.
fn flatten_named(value: Option<&Value>, field: &str) -> Result<Map<String, Value>, ResolveError> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::Array(entries)) => {
            let mut table = Map::new();
            for (i, entry) in entries.iter().enumerate() {
                let Value::Object(named) = entry else {
                    return Err(ResolveError::InvalidDocument {
                        message: format!(
                            "{}/{}: expected object, got {}",
                            field,
                            i,
                            json_type_name(entry)
                        ),
                    });
                };
                for (name, fragment) in named {
                    table.insert(name.clone(), fragment.clone());
                }
            }
            Ok(table)
        }
        Some(other) => Err(ResolveError::InvalidDocument {
            message: format!(
                "{}: expected array or object, got {}",
                field,
                json_type_name(other)
            ),
        }),
    }
}

fn annotate_scheme(name: &str, scheme: &mut Value) {
    let Value::Object(scheme) = scheme else {
        return;
    };

    if let Some(Value::Object(described_by)) = scheme.get_mut("describedBy") {
        for field in ["headers", "queryParameters"] {
            if let Some(Value::Object(params)) = described_by.get_mut(field) {
                for (param_name, param) in params.iter_mut() {
                    if let Value::Object(param) = param {
                        param.insert("displayName".into(), Value::String(param_name.clone()));
                    }
                }
            }
        }
    }

    scheme.insert("title".into(), Value::String(name.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_single_entry_sequences() {
        let raw = json!({
            "traits": [
                { "paged": { "queryParameters": { "page": { "type": "integer" } } } },
                { "teapot": { "description": "Short and stout" } }
            ]
        });
        let doc = ApiDocument::from_value(raw, ".").unwrap();
        assert_eq!(doc.traits().len(), 2);
        assert_eq!(doc.traits()["teapot"]["description"], "Short and stout");
    }

    #[test]
    fn accepts_mapping_shape() {
        let raw = json!({ "traits": { "paged": {} } });
        let doc = ApiDocument::from_value(raw, ".").unwrap();
        assert!(doc.traits().contains_key("paged"));
    }

    #[test]
    fn annotates_security_schemes_without_touching_raw() {
        let raw = json!({
            "securitySchemes": [{
                "super_secure": {
                    "describedBy": {
                        "headers": { "X-SUPER-SECURE": { "type": "string" } },
                        "queryParameters": { "auth": null }
                    }
                }
            }]
        });
        let doc = ApiDocument::from_value(raw.clone(), ".").unwrap();
        let scheme = &doc.security_schemes()["super_secure"];
        assert_eq!(scheme["title"], "super_secure");
        assert_eq!(
            scheme["describedBy"]["headers"]["X-SUPER-SECURE"]["displayName"],
            "X-SUPER-SECURE"
        );
        assert!(scheme["describedBy"]["queryParameters"]["auth"].is_null());
        assert_eq!(doc.raw(), &raw);
    }

    #[test]
    fn rejects_non_object_root() {
        let result = ApiDocument::from_value(json!([]), ".");
        assert!(matches!(result, Err(ResolveError::InvalidDocument { .. })));
    }

    #[test]
    fn rejects_scalar_trait_entries() {
        let result = ApiDocument::from_value(json!({ "traits": ["paged"] }), ".");
        assert!(matches!(
            result,
            Err(ResolveError::InvalidDocument { message }) if message.contains("traits/0")
        ));
    }
}
