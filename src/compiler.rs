//! JSON Schema compilation: `$ref` file inlining and `allOf` flattening.
//!
//! Only schemas that sit under an `application/json` key are compiled. Each
//! schema node is processed bottom-up:
//!
//! 1. a `$ref` naming a local file is replaced by that file's (compiled)
//!    content, referenced fields winning over the node's own fields;
//! 2. every child value is compiled;
//! 3. the fragments of an `allOf` are merged into the node in order, later
//!    fragments winning, and `allOf` is removed.
//!
//! A schema without `$ref` or `allOf` passes through untouched, so compiling
//! compiled output is a no-op. Document-local references (`#/...`) are not
//! file references and are left in place.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{ExpandError, ResolveError};
use crate::loader::load_referenced_schema;
use crate::merge::{merge_maps, Precedence};
use crate::types::{json_type_name, APPLICATION_JSON};

/// Compiles embedded JSON Schemas against a base directory.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    base_dir: PathBuf,
}

impl SchemaCompiler {
    /// Create a compiler that resolves `$ref` paths relative to `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Compile every `application/json` schema found anywhere in `tree`.
    ///
    /// # Errors
    ///
    /// Returns `ExpandError::InvalidSchema` for embedded schema text that is
    /// not JSON, and `ExpandError::Resolve` for unreadable or invalid `$ref`
    /// targets.
    pub fn compile_tree(&self, tree: Value) -> Result<Value, ExpandError> {
        self.compile_tree_inner(tree, None, "")
    }

    /// Compile serialized schema text.
    ///
    /// Returns the input unchanged, byte for byte, when there was nothing to
    /// compile. Otherwise returns pretty-printed JSON.
    pub fn compile_text(&self, text: &str, location: &str) -> Result<String, ExpandError> {
        let parsed: Value =
            serde_json::from_str(text).map_err(|source| ExpandError::InvalidSchema {
                location: location.to_string(),
                source,
            })?;

        let compiled = self.compile_schema(parsed.clone())?;
        if compiled == parsed {
            return Ok(text.to_string());
        }

        serde_json::to_string_pretty(&compiled).map_err(|source| ExpandError::InvalidSchema {
            location: location.to_string(),
            source,
        })
    }

    /// Compile a parsed schema.
    pub fn compile_schema(&self, schema: Value) -> Result<Value, ResolveError> {
        compile_node(schema, &self.base_dir)
    }

    fn compile_tree_inner(
        &self,
        node: Value,
        key: Option<&str>,
        path: &str,
    ) -> Result<Value, ExpandError> {
        match node {
            Value::Object(map) => {
                let mut result = Map::with_capacity(map.len());
                for (child_key, child) in map {
                    let child_path = format!("{}/{}", path, child_key);
                    let compiled = if key == Some(APPLICATION_JSON) && child_key == "schema" {
                        self.compile_embedded(child, &child_path)?
                    } else {
                        self.compile_tree_inner(child, Some(&child_key), &child_path)?
                    };
                    result.insert(child_key, compiled);
                }
                Ok(Value::Object(result))
            }
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.compile_tree_inner(item, None, &format!("{}/{}", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn compile_embedded(&self, schema: Value, location: &str) -> Result<Value, ExpandError> {
        match schema {
            Value::String(text) => Ok(Value::String(self.compile_text(&text, location)?)),
            Value::Object(_) => Ok(self.compile_schema(schema)?),
            other => Ok(other),
        }
    }
}

fn compile_node(node: Value, base_dir: &Path) -> Result<Value, ResolveError> {
    match node {
        Value::Object(map) => compile_object(map, base_dir).map(Value::Object),
        Value::Array(items) => items
            .into_iter()
            .map(|item| compile_node(item, base_dir))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

fn compile_object(
    mut map: Map<String, Value>,
    base_dir: &Path,
) -> Result<Map<String, Value>, ResolveError> {
    let file_reference = map
        .get("$ref")
        .and_then(Value::as_str)
        .filter(|reference| !reference.starts_with('#'))
        .map(str::to_owned);

    if let Some(reference) = file_reference {
        map.shift_remove("$ref");
        let (referenced, ref_dir) = load_referenced_schema(&reference, base_dir)?;
        let referenced = match compile_node(referenced, &ref_dir)? {
            Value::Object(referenced) => referenced,
            other => {
                return Err(ResolveError::InvalidDocument {
                    message: format!(
                        "$ref \"{}\" must point to an object, got {}",
                        reference,
                        json_type_name(&other)
                    ),
                })
            }
        };
        map = merge_maps(map, &referenced, Precedence::Overlay);
    }

    let mut compiled = Map::with_capacity(map.len());
    for (key, value) in map {
        compiled.insert(key, compile_node(value, base_dir)?);
    }

    match compiled.shift_remove("allOf") {
        Some(Value::Array(fragments)) => {
            for fragment in &fragments {
                // Boolean schemas carry no fields to merge
                if let Value::Object(fragment) = fragment {
                    compiled = merge_maps(compiled, fragment, Precedence::Overlay);
                }
            }
        }
        Some(other) => {
            compiled.insert("allOf".into(), other);
        }
        None => {}
    }

    Ok(compiled)
}
