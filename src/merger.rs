//! Trait and security-scheme merging into methods.

use serde_json::{Map, Value};

use crate::error::ExpandError;
use crate::merge::{merge_maps, Precedence};
use crate::types::{references, Reference, SECURITY_FIELDS};

/// Merge a trait fragment into a method.
///
/// Mappings merge recursively with the trait's leaf values winning. The
/// top-level `description` is the exception: when both sides have one, the
/// result is the method's description, a blank line, then the trait's.
pub fn merge_trait(method: Value, fragment: &Value) -> Value {
    // Nothing to merge from a null or scalar trait body
    let Value::Object(fragment) = fragment else {
        return method;
    };
    let method = match method {
        Value::Object(method) => method,
        other => return other,
    };

    let own = method
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let added = fragment.get("description").and_then(Value::as_str);

    let mut merged = merge_maps(method, fragment, Precedence::Overlay);
    if let (Some(own), Some(added)) = (own, added) {
        merged.insert(
            "description".into(),
            Value::String(format!("{}\n\n{}", own, added)),
        );
    }

    Value::Object(merged)
}

/// Merge a security scheme's `describedBy` fragments into a method.
///
/// Each of `headers`, `queryParameters` and `responses` present in the scheme
/// is shallow-merged into the method's field of the same name, creating it if
/// needed. Scheme entries replace same-named method entries.
pub fn merge_security(method: Value, scheme: &Value) -> Value {
    let mut method = match method {
        Value::Object(method) => method,
        other => return other,
    };
    let Some(described_by) = scheme.get("describedBy") else {
        return Value::Object(method);
    };

    for field in SECURITY_FIELDS {
        let Some(Value::Object(entries)) = described_by.get(*field) else {
            continue;
        };

        let target = method
            .entry(*field)
            .or_insert_with(|| Value::Object(Map::new()));
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(target) = target {
            for (name, entry) in entries {
                target.insert(name.clone(), entry.clone());
            }
        }
    }

    Value::Object(method)
}

/// Apply every security scheme in `securedBy`, then every trait in `is`.
///
/// Fields contributed by a security scheme are ordinary method fields by the
/// time traits are applied, so a trait may override them. A `null` entry in
/// `securedBy` applies nothing.
///
/// # Errors
///
/// Returns `ExpandError::UnknownSecurityScheme` or `ExpandError::UnknownTrait`
/// when an entry does not name a defined scheme or trait, including entries
/// that are not names at all. `location` names the method in the error
/// message.
pub fn merge_references(
    method: Value,
    traits: &Map<String, Value>,
    schemes: &Map<String, Value>,
    location: &str,
) -> Result<Value, ExpandError> {
    let secured = references(&method, "securedBy")
        .into_iter()
        .try_fold(method, |method, reference| -> Result<Value, ExpandError> {
            let unknown = |name: String| ExpandError::UnknownSecurityScheme {
                location: location.to_string(),
                name,
            };
            let name = match reference {
                Reference::Name(name) => name,
                Reference::Null => return Ok(method),
                Reference::Invalid(entry) => return Err(unknown(entry.to_string())),
            };
            let scheme = schemes.get(&name).ok_or_else(|| unknown(name.clone()))?;
            tracing::debug!(location, scheme = %name, "applying security scheme");
            Ok(merge_security(method, scheme))
        })?;

    references(&secured, "is")
        .into_iter()
        .try_fold(secured, |method, reference| -> Result<Value, ExpandError> {
            let unknown = |name: String| ExpandError::UnknownTrait {
                location: location.to_string(),
                name,
            };
            let name = match reference {
                Reference::Name(name) => name,
                Reference::Null => return Err(unknown("null".to_string())),
                Reference::Invalid(entry) => return Err(unknown(entry.to_string())),
            };
            let fragment = traits.get(&name).ok_or_else(|| unknown(name.clone()))?;
            tracing::debug!(location, trait_name = %name, "applying trait");
            Ok(merge_trait(method, fragment))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> (Map<String, Value>, Map<String, Value>) {
        let traits = json!({
            "teapot": {
                "description": "Short and stout",
                "responses": {
                    "418": { "body": { "application/json": { "example": "I'm a teapot" } } }
                }
            },
            "unauthorized_override": {
                "responses": { "401": { "description": "Overridden by trait" } }
            }
        });
        let schemes = json!({
            "super_secure": {
                "title": "super_secure",
                "describedBy": {
                    "headers": {
                        "X-SUPER-SECURE": { "type": "string", "required": true }
                    },
                    "queryParameters": { "auth": { "type": "string" } },
                    "responses": {
                        "401": { "body": { "application/json": { "example": "Whatcha doin' here?" } } }
                    }
                }
            }
        });
        (
            traits.as_object().unwrap().clone(),
            schemes.as_object().unwrap().clone(),
        )
    }

    #[test]
    fn trait_precedence() {
        let method = json!({ "description": "M", "headers": { "X": 0, "Y": 2 } });
        let fragment = json!({ "description": "T", "headers": { "X": 1 } });

        let merged = merge_trait(method, &fragment);
        assert_eq!(merged["description"], "M\n\nT");
        assert_eq!(merged["headers"], json!({ "X": 1, "Y": 2 }));
    }

    #[test]
    fn trait_description_used_when_method_has_none() {
        let merged = merge_trait(json!({ "method": "get" }), &json!({ "description": "T" }));
        assert_eq!(merged["description"], "T");

        let merged = merge_trait(json!({ "description": "M" }), &json!({ "headers": {} }));
        assert_eq!(merged["description"], "M");
    }

    #[test]
    fn nested_descriptions_are_overwritten() {
        let method = json!({ "headers": { "X": { "description": "own" } } });
        let fragment = json!({ "headers": { "X": { "description": "trait" } } });

        let merged = merge_trait(method, &fragment);
        assert_eq!(merged["headers"]["X"]["description"], "trait");
    }

    #[test]
    fn null_trait_body_is_noop() {
        let method = json!({ "method": "get" });
        assert_eq!(merge_trait(method.clone(), &Value::Null), method);
    }

    #[test]
    fn security_fields_are_created_and_overwritten() {
        let (_, schemes) = tables();
        let method = json!({
            "method": "post",
            "headers": { "X-SUPER-SECURE": { "type": "integer" }, "Accept": {} }
        });

        let merged = merge_security(method, &schemes["super_secure"]);
        assert_eq!(merged["headers"]["X-SUPER-SECURE"]["type"], "string");
        assert!(merged["headers"].get("Accept").is_some());
        assert_eq!(merged["queryParameters"]["auth"]["type"], "string");
        assert!(merged["responses"].get("401").is_some());
        assert!(merged.get("title").is_none());
    }

    #[test]
    fn security_without_described_by_is_noop() {
        let method = json!({ "method": "get" });
        let scheme = json!({ "type": "Basic" });
        assert_eq!(merge_security(method.clone(), &scheme), method);
    }

    #[test]
    fn references_apply_security_then_traits() {
        let (traits, schemes) = tables();
        let method = json!({
            "method": "post",
            "is": ["teapot", "unauthorized_override"],
            "securedBy": [null, "super_secure"]
        });

        let merged = merge_references(method, &traits, &schemes, "/test_resource post").unwrap();
        assert!(merged["responses"].get("418").is_some());
        assert_eq!(
            merged["responses"]["401"]["description"],
            "Overridden by trait"
        );
        assert_eq!(
            merged["responses"]["401"]["body"]["application/json"]["example"],
            "Whatcha doin' here?"
        );
        assert_eq!(merged["description"], "Short and stout");
    }

    #[test]
    fn unsecured_method_gets_no_security_fields() {
        let (traits, schemes) = tables();
        let method = json!({ "method": "get" });

        let merged = merge_references(method.clone(), &traits, &schemes, "/other get").unwrap();
        assert_eq!(merged, method);
    }

    #[test]
    fn unknown_trait_is_a_lookup_error() {
        let (traits, schemes) = tables();
        let method = json!({ "method": "get", "is": ["nonexistent"] });

        let result = merge_references(method, &traits, &schemes, "/r get");
        assert!(matches!(
            result,
            Err(ExpandError::UnknownTrait { name, .. }) if name == "nonexistent"
        ));
    }

    #[test]
    fn unknown_scheme_is_a_lookup_error() {
        let (traits, schemes) = tables();
        let method = json!({ "method": "get", "securedBy": ["oauth_2_0"] });

        let result = merge_references(method, &traits, &schemes, "/r get");
        assert!(matches!(
            result,
            Err(ExpandError::UnknownSecurityScheme { name, .. }) if name == "oauth_2_0"
        ));
    }

    #[test]
    fn non_name_trait_entries_are_lookup_errors() {
        let (traits, schemes) = tables();

        for entry in [json!(42), json!({}), json!(null)] {
            let method = json!({ "method": "get", "is": [entry.clone()] });
            let result = merge_references(method, &traits, &schemes, "/r get");
            assert!(
                matches!(
                    &result,
                    Err(ExpandError::UnknownTrait { name, location })
                        if *name == entry.to_string() && location == "/r get"
                ),
                "{} was not rejected: {:?}",
                entry,
                result
            );
        }
    }

    #[test]
    fn non_name_scheme_entries_are_lookup_errors() {
        let (traits, schemes) = tables();
        let method = json!({ "method": "get", "securedBy": [true] });

        let result = merge_references(method, &traits, &schemes, "/r get");
        assert!(matches!(
            result,
            Err(ExpandError::UnknownSecurityScheme { name, .. }) if name == "true"
        ));
    }

    #[test]
    fn null_scheme_entry_applies_nothing() {
        let (traits, schemes) = tables();
        let method = json!({ "method": "get", "securedBy": [null] });

        let merged = merge_references(method.clone(), &traits, &schemes, "/r get").unwrap();
        assert_eq!(merged, method);
    }
}
