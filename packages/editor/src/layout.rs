//! # Book Layout
//!
//! The authored, static part of a book: its spreads in reading order, the
//! rich-text editables it exposes, and the template dynamic spreads are
//! materialized from. Static spreads are tagged by their position in
//! `spreads`; that tag is what descriptors anchor to and it never changes.

use crate::errors::EditorError;
use folio_model::{FieldId, ZonePosition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chapter tag of the front cover; never numbered
pub const COVER_CHAPTER: &str = "cover";

/// Chapter tag of the back cover; never numbered
pub const END_CHAPTER: &str = "end";

/// True for chapters excluded from page numbering
pub fn is_terminal_chapter(chapter: &str) -> bool {
    chapter == COVER_CHAPTER || chapter == END_CHAPTER
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookLayout {
    pub spreads: Vec<StaticSpread>,

    #[serde(default)]
    pub editables: Vec<String>,

    #[serde(default)]
    pub template: SpreadTemplate,
}

/// One authored spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSpread {
    pub chapter: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub left: PageSlots,

    #[serde(default)]
    pub right: PageSlots,
}

/// Fields authored on one page. An image field always comes with a zone of
/// the same id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlots {
    #[serde(default)]
    pub text: Option<FieldId>,

    #[serde(default)]
    pub image: Option<FieldId>,

    #[serde(default)]
    pub image_position: ZonePosition,
}

/// Shape every dynamic spread is cloned from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadTemplate {
    #[serde(default)]
    pub left: TemplateSlot,

    #[serde(default)]
    pub right: TemplateSlot,
}

/// Which fields a template page carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSlot {
    #[serde(default = "default_true")]
    pub text: bool,

    #[serde(default = "default_true")]
    pub image: bool,
}

impl Default for TemplateSlot {
    fn default() -> Self {
        Self {
            text: true,
            image: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl BookLayout {
    /// Read a layout from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path)?;
        let layout: BookLayout = serde_json::from_str(&content)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Reject layouts the projection cannot represent
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.spreads.is_empty() {
            return Err(EditorError::Layout("a book needs at least one spread".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        let field_ids = self
            .spreads
            .iter()
            .flat_map(|s| [&s.left, &s.right])
            .flat_map(|p| p.text.iter().chain(p.image.iter()));
        for id in field_ids {
            if !seen.insert(id.as_str()) {
                return Err(EditorError::Layout(format!("duplicate field id '{}'", id)));
            }
        }
        Ok(())
    }

    /// Built-in book: cover, three chapters, back cover
    pub fn standard() -> Self {
        let chapter = |n: usize, title: &str| StaticSpread {
            chapter: format!("ch{}", n),
            label: title.to_string(),
            left: PageSlots {
                text: Some(format!("page-{}a", n)),
                image: Some(format!("img-{}a", n)),
                image_position: ZonePosition::Top,
            },
            right: PageSlots {
                text: Some(format!("page-{}b", n)),
                image: Some(format!("img-{}b", n)),
                image_position: ZonePosition::Bottom,
            },
        };

        Self {
            spreads: vec![
                StaticSpread {
                    chapter: COVER_CHAPTER.to_string(),
                    label: "Cover".to_string(),
                    left: PageSlots::default(),
                    right: PageSlots::default(),
                },
                chapter(1, "Chapter 1"),
                chapter(2, "Chapter 2"),
                chapter(3, "Chapter 3"),
                StaticSpread {
                    chapter: END_CHAPTER.to_string(),
                    label: "The End".to_string(),
                    left: PageSlots::default(),
                    right: PageSlots::default(),
                },
            ],
            editables: vec![
                "title".to_string(),
                "subtitle".to_string(),
                "ch1-title".to_string(),
                "ch2-title".to_string(),
                "ch3-title".to_string(),
            ],
            template: SpreadTemplate::default(),
        }
    }
}

impl Default for BookLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_is_valid() {
        let layout = BookLayout::standard();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.spreads.first().unwrap().chapter, COVER_CHAPTER);
        assert_eq!(layout.spreads.last().unwrap().chapter, END_CHAPTER);
    }

    #[test]
    fn test_parse_layout_json() {
        let json = r#"{
            "spreads": [
                { "chapter": "cover" },
                { "chapter": "ch1", "label": "One",
                  "left":  { "text": "t1", "image": "i1" },
                  "right": { "text": "t2", "image": "i2", "imagePosition": "bottom" } }
            ],
            "template": { "right": { "image": false } }
        }"#;

        let layout: BookLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.spreads.len(), 2);
        assert_eq!(layout.spreads[1].right.image_position, ZonePosition::Bottom);
        assert!(layout.template.left.image);
        assert!(layout.template.right.text);
        assert!(!layout.template.right.image);
    }

    #[test]
    fn test_duplicate_field_ids_rejected() {
        let mut layout = BookLayout::standard();
        layout.spreads[2].left.text = Some("page-1a".to_string());
        assert!(matches!(layout.validate(), Err(EditorError::Layout(_))));
    }
}
