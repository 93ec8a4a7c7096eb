//! Merge-write semantics shared by every store backend.
//!
//! Objects merge recursively, so writing `{"texts": {"a": "x"}}` leaves the
//! other keys of `texts` in place and writing `{"zones": {"z": {"hidden":
//! true}}}` keeps `z.position`. Arrays and scalars replace whatever was there.

use crate::error::{StoreError, StoreResult};
use serde_json::{Map, Value};

/// Merge `patch` into `target`. `patch` must be an object.
pub fn merge_patch(target: &mut Value, patch: &Value) -> StoreResult<()> {
    let patch = patch.as_object().ok_or(StoreError::PatchNotObject)?;

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        deep_merge(target, patch);
    }
    Ok(())
}

fn deep_merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, incoming) in patch {
        if let (Some(Value::Object(existing)), Value::Object(nested)) =
            (target.get_mut(key), incoming)
        {
            deep_merge(existing, nested);
            continue;
        }
        target.insert(key.clone(), incoming.clone());
    }
}
