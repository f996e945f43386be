//! Instruction merging
//!
//! Supports layering several instruction sets. Later layers override earlier
//! ones:
//! - mappings are merged key by key, recursively
//! - any other value (including arrays) is replaced by the later layer
//! - a `null` in a later layer removes the key, so an overlay can drop a
//!   check declared by the base

use checkup_core::{Error, Result};
use serde_json::Value;

/// Merge instruction layers in order
pub fn merge_instructions(layers: Vec<Value>) -> Result<Value> {
    let mut layers = layers.into_iter();
    let mut result = layers
        .next()
        .ok_or_else(|| Error::Config("No instructions to merge".to_string()))?;

    for layer in layers {
        merge_value(&mut result, layer);
    }

    Ok(result)
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    base.remove(&key);
                    continue;
                }
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
