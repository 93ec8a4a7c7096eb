//! # Document Decoder
//!
//! Turns a raw stored document into the canonical `BookState`.
//!
//! Two encodings exist in stored documents:
//!
//! - **v1 (legacy)**: nested members written as dot-path top-level keys, e.g.
//!   `"texts.page-1a": "…"` or `"zones.img-1a.hidden": true`
//! - **v2 (current)**: real nested objects, e.g. `"texts": { "page-1a": "…" }`
//!
//! A document may contain both. Both are folded into one `BookState`; when the
//! same logical field appears in both, the nested (v2) value wins. Decoding
//! takes the raw document by reference and never rewrites it, and decoding an
//! already-canonical document yields the same state again.

use crate::error::{ModelError, ModelResult};
use crate::state::{BookState, DynamicSpreadDescriptor, PageSide, ZonePosition, ZoneState};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

const TEXTS: &str = "texts";
const IMAGES: &str = "images";
const ZONES: &str = "zones";
const EDITABLES: &str = "editables";

/// Decode a raw stored document into canonical form.
///
/// Only a non-object root is an error; malformed members are skipped.
pub fn decode_document(raw: &Value) -> ModelResult<BookState> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ModelError::NotAnObject(json_kind(raw)))?;

    let mut state = BookState::default();

    decode_scalars(obj, &mut state);
    decode_legacy_keys(obj, &mut state);
    decode_nested(obj, &mut state);

    Ok(state)
}

fn decode_scalars(obj: &Map<String, Value>, state: &mut BookState) {
    let current = obj
        .get("currentSpread")
        .or_else(|| obj.get("currentSpreadIndex"));
    if let Some(value) = current {
        match value.as_u64() {
            Some(index) => state.current_spread_index = index as usize,
            None => debug!(?value, "Skipping non-integer currentSpread"),
        }
    }

    if let Some(value) = obj.get("mobilePageSide") {
        match serde_json::from_value::<PageSide>(value.clone()) {
            Ok(side) => state.mobile_page_side = side,
            Err(err) => debug!(error = %err, "Skipping malformed mobilePageSide"),
        }
    }

    if let Some(value) = obj.get("dynamicSpreads") {
        state.dynamic_spreads = decode_descriptors(value);
    }
}

fn decode_descriptors(value: &Value) -> Vec<DynamicSpreadDescriptor> {
    let Some(items) = value.as_array() else {
        debug!("Skipping dynamicSpreads: not an array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                debug!(error = %err, "Skipping malformed dynamic spread descriptor");
                None
            }
        })
        .collect()
}

/// v1: `"texts.<id>"`, `"images.<id>"`, `"editables.<id>"`, `"zones.<id>.<member>"`
fn decode_legacy_keys(obj: &Map<String, Value>, state: &mut BookState) {
    for (key, value) in obj {
        let Some((root, rest)) = key.split_once('.') else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        match root {
            TEXTS => insert_string(&mut state.texts, rest, value),
            IMAGES => insert_string(&mut state.images, rest, value),
            EDITABLES => insert_string(&mut state.editables, rest, value),
            ZONES => {
                let Some((zone_id, member)) = rest.split_once('.') else {
                    debug!(key = %key, "Skipping legacy zone key without member");
                    continue;
                };
                if zone_id.is_empty() {
                    continue;
                }
                let zone = state.zones.entry(zone_id.to_string()).or_default();
                apply_zone_member(zone, member, value);
            }
            _ => {}
        }
    }

    // Legacy keys may name a zone but carry no usable member
    state.zones.retain(|_, zone| !zone.is_empty());
}

/// v2: nested objects. Runs after the legacy pass so nested values win.
fn decode_nested(obj: &Map<String, Value>, state: &mut BookState) {
    for (field, target) in [
        (TEXTS, &mut state.texts),
        (IMAGES, &mut state.images),
        (EDITABLES, &mut state.editables),
    ] {
        if let Some(map) = obj.get(field).and_then(Value::as_object) {
            for (id, value) in map {
                insert_string(target, id, value);
            }
        }
    }

    if let Some(zones) = obj.get(ZONES).and_then(Value::as_object) {
        for (zone_id, members) in zones {
            let Some(members) = members.as_object() else {
                debug!(zone = %zone_id, "Skipping zone entry: not an object");
                continue;
            };
            let mut decoded = ZoneState::default();
            for (member, value) in members {
                apply_zone_member(&mut decoded, member, value);
            }
            if !decoded.is_empty() {
                state.zones.entry(zone_id.clone()).or_default().merge(&decoded);
            }
        }
    }
}

fn insert_string(target: &mut BTreeMap<String, String>, id: &str, value: &Value) {
    match value.as_str() {
        Some(s) => {
            target.insert(id.to_string(), s.to_string());
        }
        None => debug!(id = %id, "Skipping non-string field value"),
    }
}

fn apply_zone_member(zone: &mut ZoneState, member: &str, value: &Value) {
    match member {
        "hidden" => match value.as_bool() {
            Some(hidden) => zone.hidden = Some(hidden),
            None => debug!(?value, "Skipping non-boolean zone.hidden"),
        },
        "position" => match value.as_str().map(str::parse::<ZonePosition>) {
            Some(Ok(position)) => zone.position = Some(position),
            _ => debug!(?value, "Skipping unknown zone.position"),
        },
        other => debug!(member = %other, "Ignoring unknown zone member"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_legacy_flat_keys() {
        let raw = json!({
            "currentSpread": 2,
            "texts.page-1a": "legacy text",
            "images.img-1a": "data:image/png;base64,AAA",
            "editables.title": "<b>Title</b>",
            "zones.img-1a.hidden": true,
            "zones.img-1b.position": "bottom"
        });

        let state = decode_document(&raw).unwrap();

        assert_eq!(state.current_spread_index, 2);
        assert_eq!(state.texts["page-1a"], "legacy text");
        assert_eq!(state.images["img-1a"], "data:image/png;base64,AAA");
        assert_eq!(state.editables["title"], "<b>Title</b>");
        assert_eq!(state.zones["img-1a"].hidden, Some(true));
        assert_eq!(state.zones["img-1b"].position, Some(ZonePosition::Bottom));
    }

    #[test]
    fn test_nested_values_win_over_legacy_keys() {
        let raw = json!({
            "texts.page-1a": "old",
            "texts.page-1b": "only legacy",
            "texts": { "page-1a": "new" },
            "zones.img-1a.hidden": true,
            "zones.img-1a.position": "bottom",
            "zones": { "img-1a": { "hidden": false } }
        });

        let state = decode_document(&raw).unwrap();

        assert_eq!(state.texts["page-1a"], "new");
        assert_eq!(state.texts["page-1b"], "only legacy");
        assert_eq!(state.zones["img-1a"].hidden, Some(false));
        // Member only present in legacy form survives
        assert_eq!(state.zones["img-1a"].position, Some(ZonePosition::Bottom));
    }

    #[test]
    fn test_decode_is_idempotent_and_non_mutating() {
        let raw = json!({
            "texts.a": "x",
            "texts": { "b": "y" },
            "zones.z.hidden": true,
            "dynamicSpreads": []
        });
        let before = raw.clone();

        let once = decode_document(&raw).unwrap();
        let twice = decode_document(&once.to_value().unwrap()).unwrap();

        assert_eq!(raw, before);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_malformed_members_are_skipped() {
        let raw = json!({
            "currentSpread": "three",
            "mobilePageSide": "middle",
            "texts": { "a": 42, "b": "ok" },
            "zones": { "z": "hidden", "y": { "position": "left" } },
            "dynamicSpreads": [ { "id": "broken" } ]
        });

        let state = decode_document(&raw).unwrap();

        assert_eq!(state.current_spread_index, 0);
        assert_eq!(state.mobile_page_side, PageSide::Left);
        assert_eq!(state.texts.len(), 1);
        assert!(state.zones.is_empty());
        assert!(state.dynamic_spreads.is_empty());
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let err = decode_document(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ModelError::NotAnObject("array")));
    }
}
