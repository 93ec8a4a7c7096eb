//! # Local Edits
//!
//! Field-level operations the user performs on an open book. Each edit is
//! written into the projection through the same setters remote values use,
//! and yields the `BookPatch` that persists it.
//!
//! All edits are last-write-wins per field; there is no merging of
//! concurrent values.

use crate::errors::EditorError;
use crate::projection::Projection;
use crate::projector::Projector;
use folio_model::{BookPatch, ZonePosition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Edit {
    /// Replace the content of a text field
    SetText { field_id: String, value: String },

    /// Replace the image shown in a zone
    SetImage { field_id: String, src: String },

    HideZone { zone_id: String },

    ShowZone { zone_id: String },

    /// Put the image above or below the text
    MoveZone {
        zone_id: String,
        position: ZonePosition,
    },

    /// Replace the rich content of an editable
    SetEditable { editable_id: String, html: String },
}

impl Edit {
    /// Id of the field the edit writes
    pub fn field_id(&self) -> &str {
        match self {
            Edit::SetText { field_id, .. } | Edit::SetImage { field_id, .. } => field_id,
            Edit::HideZone { zone_id }
            | Edit::ShowZone { zone_id }
            | Edit::MoveZone { zone_id, .. } => zone_id,
            Edit::SetEditable { editable_id, .. } => editable_id,
        }
    }

    /// Patch persisting this edit
    pub fn to_patch(&self) -> BookPatch {
        match self {
            Edit::SetText { field_id, value } => BookPatch::text(field_id, value),
            Edit::SetImage { field_id, src } => BookPatch::image(field_id, src),
            Edit::HideZone { zone_id } => BookPatch::zone_hidden(zone_id, true),
            Edit::ShowZone { zone_id } => BookPatch::zone_hidden(zone_id, false),
            Edit::MoveZone { zone_id, position } => BookPatch::zone_position(zone_id, *position),
            Edit::SetEditable { editable_id, html } => BookPatch::editable(editable_id, html),
        }
    }

    /// Write the edit into the projection
    pub fn apply(&self, projection: &mut Projection) -> Result<BookPatch, EditorError> {
        let bound = match self {
            Edit::SetText { field_id, value } => Projector::set_text(projection, field_id, value),
            Edit::SetImage { field_id, src } => Projector::set_image(projection, field_id, src),
            Edit::HideZone { zone_id } => Projector::set_zone_hidden(projection, zone_id, true),
            Edit::ShowZone { zone_id } => Projector::set_zone_hidden(projection, zone_id, false),
            Edit::MoveZone { zone_id, position } => {
                Projector::set_zone_position(projection, zone_id, *position)
            }
            Edit::SetEditable { editable_id, html } => {
                Projector::set_editable(projection, editable_id, html)
            }
        };

        if !bound {
            return Err(EditorError::FieldNotFound(self.field_id().to_string()));
        }
        Ok(self.to_patch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BookLayout;

    #[test]
    fn test_hide_zone_patch() {
        let mut projection = Projection::from_layout(&BookLayout::standard());
        let edit = Edit::HideZone {
            zone_id: "img-1a".to_string(),
        };

        let patch = edit.apply(&mut projection).unwrap();

        assert!(projection.zone("img-1a").unwrap().hidden);
        assert_eq!(patch.zones["img-1a"].hidden, Some(true));
        assert_eq!(patch.zones["img-1a"].position, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut projection = Projection::from_layout(&BookLayout::standard());
        let edit = Edit::SetText {
            field_id: "missing".to_string(),
            value: "x".to_string(),
        };

        assert!(matches!(
            edit.apply(&mut projection),
            Err(EditorError::FieldNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_edit_json_shape() {
        let edit: Edit = serde_json::from_str(
            r#"{ "type": "moveZone", "zoneId": "img-2a", "position": "bottom" }"#,
        )
        .unwrap();
        assert_eq!(
            edit,
            Edit::MoveZone {
                zone_id: "img-2a".to_string(),
                position: ZonePosition::Bottom,
            }
        );
    }
}
