//! # Partial Book Patches
//!
//! A `BookPatch` carries only the fields a single edit writes. Nested maps
//! hold just the keys being written and zone entries just the members being
//! written, so a store applying the patch with deep-merge semantics never
//! erases sibling keys.

use crate::state::{BookState, DynamicSpreadDescriptor, PageSide, ZonePosition, ZoneState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field-level partial write of a `BookState`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(rename = "currentSpread", default, skip_serializing_if = "Option::is_none")]
    pub current_spread_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_page_side: Option<PageSide>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub texts: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<String, ZoneState>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub editables: BTreeMap<String, String>,

    /// The whole sequence is rewritten on every structural change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_spreads: Option<Vec<DynamicSpreadDescriptor>>,
}

impl BookPatch {
    pub fn current_spread(index: usize) -> Self {
        Self {
            current_spread_index: Some(index),
            ..Default::default()
        }
    }

    pub fn mobile_page_side(side: PageSide) -> Self {
        Self {
            mobile_page_side: Some(side),
            ..Default::default()
        }
    }

    pub fn text(id: impl Into<String>, value: impl Into<String>) -> Self {
        let mut patch = Self::default();
        patch.texts.insert(id.into(), value.into());
        patch
    }

    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        let mut patch = Self::default();
        patch.images.insert(id.into(), src.into());
        patch
    }

    pub fn zone_hidden(zone_id: impl Into<String>, hidden: bool) -> Self {
        let mut patch = Self::default();
        patch.zones.insert(zone_id.into(), ZoneState::hidden(hidden));
        patch
    }

    pub fn zone_position(zone_id: impl Into<String>, position: ZonePosition) -> Self {
        let mut patch = Self::default();
        patch.zones.insert(zone_id.into(), ZoneState::positioned(position));
        patch
    }

    pub fn editable(id: impl Into<String>, html: impl Into<String>) -> Self {
        let mut patch = Self::default();
        patch.editables.insert(id.into(), html.into());
        patch
    }

    pub fn dynamic_spreads(list: Vec<DynamicSpreadDescriptor>) -> Self {
        Self {
            dynamic_spreads: Some(list),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_spread_index.is_none()
            && self.mobile_page_side.is_none()
            && self.texts.is_empty()
            && self.images.is_empty()
            && self.zones.is_empty()
            && self.editables.is_empty()
            && self.dynamic_spreads.is_none()
    }

    /// Fold a later patch into this one (later writes win per field)
    pub fn extend(&mut self, later: BookPatch) {
        if later.current_spread_index.is_some() {
            self.current_spread_index = later.current_spread_index;
        }
        if later.mobile_page_side.is_some() {
            self.mobile_page_side = later.mobile_page_side;
        }
        self.texts.extend(later.texts);
        self.images.extend(later.images);
        for (id, zone) in later.zones {
            self.zones.entry(id).or_default().merge(&zone);
        }
        self.editables.extend(later.editables);
        if later.dynamic_spreads.is_some() {
            self.dynamic_spreads = later.dynamic_spreads;
        }
    }

    /// Encode as the nested JSON object sent to the store
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl BookState {
    /// Apply a patch with store semantics: top-level members replace,
    /// nested maps merge per key, zones merge per member.
    pub fn apply_patch(&mut self, patch: &BookPatch) {
        if let Some(index) = patch.current_spread_index {
            self.current_spread_index = index;
        }
        if let Some(side) = patch.mobile_page_side {
            self.mobile_page_side = side;
        }
        for (id, value) in &patch.texts {
            self.texts.insert(id.clone(), value.clone());
        }
        for (id, value) in &patch.images {
            self.images.insert(id.clone(), value.clone());
        }
        for (id, zone) in &patch.zones {
            self.zones.entry(id.clone()).or_default().merge(zone);
        }
        for (id, value) in &patch.editables {
            self.editables.insert(id.clone(), value.clone());
        }
        if let Some(list) = &patch.dynamic_spreads {
            self.dynamic_spreads = list.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_patch_encodes_nested() {
        let value = BookPatch::text("page-1a", "hello").to_value().unwrap();
        assert_eq!(value, serde_json::json!({ "texts": { "page-1a": "hello" } }));
    }

    #[test]
    fn test_zone_patch_only_carries_written_member() {
        let value = BookPatch::zone_hidden("img-1a", true).to_value().unwrap();
        assert_eq!(value, serde_json::json!({ "zones": { "img-1a": { "hidden": true } } }));
    }

    #[test]
    fn test_apply_patch_preserves_siblings() {
        let mut state = BookState::default();
        state.texts.insert("a".to_string(), "one".to_string());
        state.zones.insert("z".to_string(), ZoneState::positioned(ZonePosition::Bottom));

        state.apply_patch(&BookPatch::text("b", "two"));
        state.apply_patch(&BookPatch::zone_hidden("z", true));

        assert_eq!(state.texts.len(), 2);
        assert_eq!(state.texts["a"], "one");
        assert_eq!(state.zones["z"].position, Some(ZonePosition::Bottom));
        assert_eq!(state.zones["z"].hidden, Some(true));
    }

    #[test]
    fn test_extend_folds_later_writes() {
        let mut patch = BookPatch::text("a", "first");
        patch.extend(BookPatch::text("a", "second"));
        patch.extend(BookPatch::current_spread(3));

        assert_eq!(patch.texts["a"], "second");
        assert_eq!(patch.current_spread_index, Some(3));
        assert!(!patch.is_empty());
        assert!(BookPatch::default().is_empty());
    }
}
