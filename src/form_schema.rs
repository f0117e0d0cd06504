//! JSON Schema synthesis from legacy form parameters.
//!
//! A method whose form-encoded body declares `formParameters` but whose
//! `application/json` body has no `schema` gets one generated from those
//! parameters. An authored `application/json` schema is never replaced.

use serde_json::{Map, Value};

use crate::error::ExpandError;
use crate::types::{verb, APPLICATION_JSON, FORM_URLENCODED, RAML_ONLY_KEYWORDS};

/// Settings for synthesized schemas.
#[derive(Debug, Clone)]
pub struct SchemaSettings {
    /// Value of the `$schema` keyword.
    pub schema_uri: String,
    /// Optional `title` keyword, usually the resource title.
    pub title: Option<String>,
}

impl SchemaSettings {
    pub fn new(schema_uri: impl Into<String>) -> Self {
        Self {
            schema_uri: schema_uri.into(),
            title: None,
        }
    }

    /// Set the title of synthesized schemas.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Whether a schema should be synthesized for `method`.
///
/// True only when the form-encoded body has `formParameters` and the
/// `application/json` body is absent, null, or has no `schema`.
pub fn should_synthesize(method: &Value) -> bool {
    let Some(body) = method.get("body") else {
        return false;
    };

    if form_parameters(method).is_none() {
        return false;
    }

    match body.get(APPLICATION_JSON) {
        None | Some(Value::Null) => true,
        Some(json_body) => json_body.get("schema").is_none(),
    }
}

/// Generate a JSON Schema document, as pretty-printed text, from the form
/// parameters of `method`.
///
/// # Errors
///
/// Returns `ExpandError::MalformedMethod` if `method` has no
/// `body/application/x-www-form-urlencoded/formParameters` mapping.
pub fn generate(method: &Value, settings: &SchemaSettings) -> Result<String, ExpandError> {
    let params = form_parameters(method).ok_or_else(|| ExpandError::MalformedMethod {
        message: format!("missing body/{}/formParameters", FORM_URLENCODED),
    })?;

    let mut schema = Map::new();
    schema.insert("$schema".into(), Value::String(settings.schema_uri.clone()));
    if let Some(title) = &settings.title {
        schema.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = method.get("description").and_then(Value::as_str) {
        schema.insert(
            "description".into(),
            Value::String(normalize_newlines(description)),
        );
    }
    schema.insert("type".into(), Value::String("object".into()));

    let mut required = Vec::new();
    let mut properties = Map::new();
    for (name, param) in params {
        let property = match param {
            Value::Object(param) => {
                let mut property = param.clone();
                if property.shift_remove("required") == Some(Value::Bool(true)) {
                    required.push(Value::String(name.clone()));
                }
                for keyword in RAML_ONLY_KEYWORDS {
                    property.shift_remove(*keyword);
                }
                if let Some(Value::String(description)) = property.get_mut("description") {
                    *description = normalize_newlines(description);
                }
                Value::Object(property)
            }
            other => other.clone(),
        };
        properties.insert(name.clone(), property);
    }
    schema.insert("properties".into(), Value::Object(properties));

    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }

    serde_json::to_string_pretty(&Value::Object(schema)).map_err(|source| {
        ExpandError::InvalidSchema {
            location: "formParameters".into(),
            source,
        }
    })
}

/// Write `schema` into `body["application/json"].schema` of `method`.
///
/// The `application/json` entry is created when absent or null.
///
/// # Errors
///
/// Returns `ExpandError::MalformedMethod` if `method` is not a mapping with a
/// mapping `body`.
pub fn insert_into(method: Value, schema: String) -> Result<Value, ExpandError> {
    let mut method = match method {
        Value::Object(method) => method,
        _ => {
            return Err(ExpandError::MalformedMethod {
                message: "expected method object".into(),
            })
        }
    };

    let Some(Value::Object(body)) = method.get_mut("body") else {
        return Err(ExpandError::MalformedMethod {
            message: "missing body".into(),
        });
    };

    let json_body = body
        .entry(APPLICATION_JSON)
        .or_insert_with(|| Value::Object(Map::new()));
    if !json_body.is_object() {
        *json_body = Value::Object(Map::new());
    }
    if let Value::Object(json_body) = json_body {
        json_body.insert("schema".into(), Value::String(schema));
    }

    Ok(Value::Object(method))
}

/// Synthesize schemas for every mapping with a qualifying `body` in `tree`.
pub fn insert_schemas(tree: Value, settings: &SchemaSettings) -> Result<Value, ExpandError> {
    match tree {
        Value::Array(items) => items
            .into_iter()
            .map(|item| insert_schemas(item, settings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = Map::with_capacity(map.len());
            for (key, value) in map {
                result.insert(key, insert_schemas(value, settings)?);
            }

            let node = Value::Object(result);
            if should_synthesize(&node) {
                let method = verb(&node);
                tracing::debug!(method, "synthesizing schema from formParameters");
                let schema = generate(&node, settings)?;
                insert_into(node, schema)
            } else {
                Ok(node)
            }
        }
        other => Ok(other),
    }
}

/// Collapse single newlines between two non-newline characters into a space.
///
/// Blank-line paragraph breaks are kept, so Markdown renders the same
/// paragraphs. The result is trimmed.
pub fn normalize_newlines(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        let joins_lines = c == '\n'
            && i > 0
            && chars[i - 1] != '\n'
            && chars.get(i + 1).is_some_and(|&next| next != '\n');
        out.push(if joins_lines { ' ' } else { c });
    }

    out.trim().to_string()
}

fn form_parameters(method: &Value) -> Option<&Map<String, Value>> {
    method
        .get("body")?
        .get(FORM_URLENCODED)?
        .get("formParameters")?
        .as_object()
}
