//! Recursive merge of JSON trees.
//!
//! Trait application and `allOf` / `$ref` composition all merge trees with the
//! same rule: mappings merge field by field at every depth, and everything
//! else is decided by a [`Precedence`].

use serde_json::{Map, Value};

/// Which side wins when both trees hold a non-mapping value for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// The overlay's value replaces the base value.
    #[default]
    Overlay,
    /// The base value is kept; the overlay only fills gaps.
    Base,
}

/// Merge `overlay` into `base`, returning the merged tree.
///
/// When both sides are mappings they are merged recursively. Fields only
/// present in the overlay are copied in. On any other conflict the side named
/// by `precedence` wins.
pub fn deep_merge(base: Value, overlay: &Value, precedence: Precedence) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            Value::Object(merge_maps(base, overlay, precedence))
        }
        (base, overlay) => match precedence {
            Precedence::Overlay => overlay.clone(),
            Precedence::Base => base,
        },
    }
}

/// Merge two mappings with [`deep_merge`] semantics.
pub fn merge_maps(
    mut base: Map<String, Value>,
    overlay: &Map<String, Value>,
    precedence: Precedence,
) -> Map<String, Value> {
    for (key, incoming) in overlay {
        match base.get_mut(key) {
            Some(existing) => {
                let current = std::mem::take(existing);
                *existing = deep_merge(current, incoming, precedence);
            }
            None => {
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
    base
}
