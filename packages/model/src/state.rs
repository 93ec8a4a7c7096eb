//! # Book State
//!
//! Canonical shape of a persisted book. One `BookState` exists per document
//! id; it is created lazily (as `BookState::default()`) the first time an
//! unseen id is loaded and only ever mutated through field-level patches.
//!
//! Page numbers and spread positions are never stored here: they are derived
//! from the live projection. Only the last viewed position is persisted.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Identifier of a text or image field (e.g. `page-1a`, `dyn-…-tl`)
pub type FieldId = String;

/// Identifier of an image zone; zones share their id with the image field
pub type ZoneId = String;

/// Identifier of a rich-text editable (titles, chapter headings)
pub type EditableId = String;

/// Which half of a spread is shown on narrow viewports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    #[default]
    Left,
    Right,
}

impl PageSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSide::Left => "left",
            PageSide::Right => "right",
        }
    }
}

/// Where an image zone sits relative to its sibling text region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZonePosition {
    #[default]
    Top,
    Bottom,
}

impl ZonePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZonePosition::Top => "top",
            ZonePosition::Bottom => "bottom",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            ZonePosition::Top => ZonePosition::Bottom,
            ZonePosition::Bottom => ZonePosition::Top,
        }
    }
}

impl std::str::FromStr for ZonePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(ZonePosition::Top),
            "bottom" => Ok(ZonePosition::Bottom),
            other => Err(format!("unknown zone position '{}'", other)),
        }
    }
}

/// Persisted state of one image zone. Both members are independently settable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ZonePosition>,
}

impl ZoneState {
    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            position: None,
        }
    }

    pub fn positioned(position: ZonePosition) -> Self {
        Self {
            hidden: None,
            position: Some(position),
        }
    }

    /// Overwrite the members that `other` sets, keep the rest
    pub fn merge(&mut self, other: &ZoneState) {
        if other.hidden.is_some() {
            self.hidden = other.hidden;
        }
        if other.position.is_some() {
            self.position = other.position;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_none() && self.position.is_none()
    }
}

/// Field identifiers owned by one page of a dynamic spread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFieldSet {
    pub text_id: FieldId,
    pub img_id: FieldId,
    #[serde(default)]
    pub img_position: ZonePosition,
    #[serde(default)]
    pub img_hidden: bool,
}

/// Field sets for both pages of a dynamic spread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadPages {
    pub left: PageFieldSet,
    pub right: PageFieldSet,
}

impl SpreadPages {
    pub fn side(&self, side: PageSide) -> &PageFieldSet {
        match side {
            PageSide::Left => &self.left,
            PageSide::Right => &self.right,
        }
    }
}

/// Persisted description of a spread inserted at runtime.
///
/// The effective anchor is `after_dynamic_id` when it resolves, otherwise
/// `after_static_spread`; when neither resolves the spread is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSpreadDescriptor {
    pub id: String,

    #[serde(default)]
    pub chapter: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub after_dynamic_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_index")]
    pub after_static_spread: Option<usize>,

    pub pages: SpreadPages,
}

impl DynamicSpreadDescriptor {
    /// All text field ids, left page first
    pub fn text_ids(&self) -> [&str; 2] {
        [&self.pages.left.text_id, &self.pages.right.text_id]
    }

    /// All image (and zone) ids, left page first
    pub fn image_ids(&self) -> [&str; 2] {
        [&self.pages.left.img_id, &self.pages.right.img_id]
    }
}

/// Accepts `3`, `"3"` or `null`. Older writers stored the static anchor as a
/// string; anything unparseable is treated as "no static anchor".
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(serde_json::Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    })
}

/// Root persisted entity, one per book identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookState {
    /// Last viewed spread position
    #[serde(rename = "currentSpread", alias = "currentSpreadIndex")]
    pub current_spread_index: usize,

    pub mobile_page_side: PageSide,

    pub texts: BTreeMap<FieldId, String>,

    pub images: BTreeMap<FieldId, String>,

    pub zones: BTreeMap<ZoneId, ZoneState>,

    pub editables: BTreeMap<EditableId, String>,

    pub dynamic_spreads: Vec<DynamicSpreadDescriptor>,
}

impl BookState {
    /// Find a dynamic spread descriptor by id
    pub fn dynamic_spread(&self, id: &str) -> Option<&DynamicSpreadDescriptor> {
        self.dynamic_spreads.iter().find(|d| d.id == id)
    }

    /// Encode into the canonical nested JSON document
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
