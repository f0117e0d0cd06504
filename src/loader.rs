//! Loading API documents and schema files from the local filesystem.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ResolveError;

/// Load and parse a JSON file.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// `ResolveError::ReadError` if it can't be read,
/// or `ResolveError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ResolveError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema file referenced by `$ref`, relative to `base_dir`.
///
/// Returns the parsed schema and the directory that nested references inside
/// it are resolved against.
///
/// A `file.json#/pointer` reference selects the subtree at that JSON Pointer.
pub fn load_referenced_schema(
    reference: &str,
    base_dir: &Path,
) -> Result<(Value, PathBuf), ResolveError> {
    let (file_part, fragment) = match reference.find('#') {
        Some(idx) => (&reference[..idx], Some(&reference[idx..])),
        None => (reference, None),
    };

    let path = base_dir.join(file_part);
    tracing::debug!(reference, path = %path.display(), "loading referenced schema");
    let loaded = load_json(&path)?;
    let schema = match fragment {
        Some(fragment) => navigate_fragment(&loaded, fragment).ok_or_else(|| {
            ResolveError::InvalidDocument {
                message: format!("fragment not found: {}", reference),
            }
        })?,
        None => loaded,
    };

    let dir = path.parent().unwrap_or(base_dir).to_path_buf();
    Ok((schema, dir))
}

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/foo").
pub fn navigate_fragment(schema: &Value, fragment: &str) -> Option<Value> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Some(schema.clone());
    }

    let mut current = schema;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            other => other.get(&key)?,
        };
    }
    Some(current.clone())
}
