//! Downloadable descriptor export.
//!
//! The exporter works on its own clone of the raw document, never on page
//! data, and turns the sequence-based tree back into the keyed-by-name shape
//! of a RAML file: resources keyed by `relativeUri`, methods keyed by verb.

use serde_json::Value;

use crate::document::ApiDocument;
use crate::error::ExportError;
use crate::types::{relative_uri, verb, SCHEMA_HASH};

/// Header line of the RAML rendition, in place of the YAML document marker.
pub const RAML_HEADER: &str = "#%RAML 0.8";

/// A publishable descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    document: Value,
}

impl Descriptor {
    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }

    /// The descriptor as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// The descriptor as RAML (YAML with a `#%RAML 0.8` header).
    pub fn to_raml(&self) -> Result<String, ExportError> {
        let yaml = serde_yaml::to_string(&self.document)?;
        let body = yaml.strip_prefix("---\n").unwrap_or(&yaml);
        Ok(format!("{}\n{}", RAML_HEADER, body))
    }
}

/// Build the downloadable descriptor of `document`.
pub fn export(document: &ApiDocument) -> Descriptor {
    let root = strip_scheme_titles(document.raw().clone());
    Descriptor {
        document: fix_resources(root),
    }
}

/// Replace `resources` and `methods` sequences with entries keyed by
/// `relativeUri` and verb, recursively, and drop fields that only exist for
/// page rendering.
pub fn fix_resources(node: Value) -> Value {
    let mut map = match node {
        Value::Object(map) => map,
        other => return other,
    };

    let children = map.shift_remove("resources");
    let methods = map.shift_remove("methods");
    map.shift_remove("relativeUriPathSegments");
    map.shift_remove(SCHEMA_HASH);

    if let Some(Value::Array(children)) = children {
        for child in children {
            let key = relative_uri(&child).to_string();
            let child = match child {
                Value::Object(mut child) => {
                    child.shift_remove("relativeUri");
                    Value::Object(child)
                }
                other => other,
            };
            map.insert(key, fix_resources(child));
        }
    }

    if let Some(Value::Array(methods)) = methods {
        for method in methods {
            let key = verb(&method).to_string();
            let method = match method {
                Value::Object(mut method) => {
                    method.shift_remove("method");
                    Value::Object(method)
                }
                other => other,
            };
            map.insert(key, fix_body(method));
        }
    }

    Value::Object(map)
}

/// Remove `schema_hash` from every body definition of a method, recursing
/// into its responses.
pub fn fix_body(method: Value) -> Value {
    let mut map = match method {
        Value::Object(map) => map,
        other => return other,
    };

    if let Some(Value::Object(body)) = map.get_mut("body") {
        for definition in body.values_mut() {
            if let Value::Object(definition) = definition {
                definition.shift_remove(SCHEMA_HASH);
            }
        }
    }

    if let Some(Value::Object(responses)) = map.get_mut("responses") {
        for response in responses.values_mut() {
            if !response.is_null() {
                *response = fix_body(std::mem::take(response));
            }
        }
    }

    Value::Object(map)
}

/// Security schemes are given a `title` for their pages; it is not part of
/// the descriptor.
fn strip_scheme_titles(mut root: Value) -> Value {
    if let Some(schemes) = root.get_mut("securitySchemes") {
        let named: Vec<&mut Value> = match schemes {
            Value::Array(entries) => entries
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .flat_map(|entry| entry.values_mut())
                .collect(),
            Value::Object(table) => table.values_mut().collect(),
            _ => Vec::new(),
        };
        for scheme in named {
            if let Value::Object(scheme) = scheme {
                scheme.shift_remove("title");
            }
        }
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn has_key_anywhere(value: &Value, key: &str) -> bool {
        match value {
            Value::Object(map) => {
                map.contains_key(key) || map.values().any(|v| has_key_anywhere(v, key))
            }
            Value::Array(items) => items.iter().any(|v| has_key_anywhere(v, key)),
            _ => false,
        }
    }

    #[test]
    fn resources_and_methods_become_keyed_entries() {
        let tree = json!({
            "title": "Test!",
            "resources": [{
                "relativeUri": "/r",
                "relativeUriPathSegments": ["r"],
                "methods": [{ "method": "post", "description": "Create" }],
                "resources": [{
                    "relativeUri": "/{id}",
                    "methods": [{ "method": "get" }, { "method": "delete" }]
                }]
            }]
        });

        let fixed = fix_resources(tree);
        assert_eq!(fixed["title"], "Test!");
        assert_eq!(fixed["/r"]["post"]["description"], "Create");
        assert!(fixed["/r"]["/{id}"].get("get").is_some());
        assert!(fixed["/r"]["/{id}"].get("delete").is_some());
        for key in ["relativeUri", "method", "methods", "resources", "relativeUriPathSegments"] {
            assert!(!has_key_anywhere(&fixed, key), "{} left in export", key);
        }
    }

    #[test]
    fn schema_hash_removed_from_bodies_and_responses() {
        let method = json!({
            "body": { "application/json": { "schema": "{}", "schema_hash": {} } },
            "responses": {
                "200": { "body": { "application/json": { "schema": "{}", "schema_hash": {} } } },
                "204": null
            }
        });

        let fixed = fix_body(method);
        assert!(!has_key_anywhere(&fixed, SCHEMA_HASH));
        assert_eq!(fixed["body"]["application/json"]["schema"], "{}");
        assert!(fixed["responses"]["204"].is_null());
    }

    #[test]
    fn scheme_titles_are_removed() {
        let root = json!({
            "securitySchemes": [{ "basic": { "title": "basic", "type": "Basic Authentication" } }]
        });
        let stripped = strip_scheme_titles(root);
        assert_eq!(
            stripped["securitySchemes"][0]["basic"],
            json!({ "type": "Basic Authentication" })
        );
    }

    #[test]
    fn raml_rendition_starts_with_header() {
        let raw = json!({
            "title": "Test!",
            "resources": [{ "relativeUri": "/r", "methods": [{ "method": "get" }] }]
        });
        let doc = ApiDocument::from_value(raw, ".").unwrap();
        let descriptor = export(&doc);

        let raml = descriptor.to_raml().unwrap();
        assert!(raml.starts_with("#%RAML 0.8\n"));
        assert!(!raml.contains("---"));
        let reparsed: Value = serde_yaml::from_str(raml.trim_start_matches(RAML_HEADER)).unwrap();
        assert_eq!(&reparsed, descriptor.as_value());

        let json: Value = serde_json::from_str(&descriptor.to_json().unwrap()).unwrap();
        assert_eq!(&json, descriptor.as_value());
    }

    #[test]
    fn export_does_not_touch_the_document() {
        let raw = json!({ "resources": [{ "relativeUri": "/r", "methods": [] }] });
        let doc = ApiDocument::from_value(raw.clone(), ".").unwrap();
        let _ = export(&doc);
        assert_eq!(doc.raw(), &raw);
    }
}
