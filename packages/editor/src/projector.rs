//! # Content Projector
//!
//! Writes field values from a `BookState` snapshot into the live projection.
//! Every write goes through one of the single-field setters below, which
//! local edits and the remote merge filter share. A setter returns `false`
//! when no field with that id is bound in the projection.

use crate::projection::Projection;
use folio_model::{BookState, ZonePosition, ZoneState};
use tracing::debug;

/// How much of the snapshot to project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionScope {
    /// Every text, image, zone and editable in the snapshot
    #[default]
    Full,
}

pub struct Projector;

impl Projector {
    /// Project `snapshot` onto `projection`. Applying the same snapshot twice
    /// leaves the projection unchanged.
    pub fn apply(projection: &mut Projection, snapshot: &BookState, scope: ProjectionScope) {
        match scope {
            ProjectionScope::Full => {
                let mut unbound = 0usize;

                for (id, value) in &snapshot.texts {
                    if !Self::set_text(projection, id, value) {
                        unbound += 1;
                    }
                }
                for (id, src) in &snapshot.images {
                    if !Self::set_image(projection, id, src) {
                        unbound += 1;
                    }
                }
                for (id, zone) in &snapshot.zones {
                    if !Self::set_zone(projection, id, zone) {
                        unbound += 1;
                    }
                }
                for (id, html) in &snapshot.editables {
                    if !Self::set_editable(projection, id, html) {
                        unbound += 1;
                    }
                }

                if unbound > 0 {
                    debug!(unbound, "Snapshot values without a bound field");
                }
            }
        }
    }

    /// Set a text field and queue it for size fitting
    pub fn set_text(projection: &mut Projection, id: &str, value: &str) -> bool {
        projection.field_writes += 1;
        let Some(field) = projection
            .page_with(|p| p.text.as_ref().is_some_and(|t| t.id == id))
            .and_then(|p| p.text.as_mut())
        else {
            return false;
        };

        field.content = value.to_string();
        if !projection.fit_requests.iter().any(|f| f == id) {
            projection.fit_requests.push(id.to_string());
        }
        true
    }

    /// Set an image and mark its zone populated
    pub fn set_image(projection: &mut Projection, id: &str, src: &str) -> bool {
        projection.field_writes += 1;
        let Some(page) = projection.page_with(|p| p.image.as_ref().is_some_and(|i| i.id == id)) else {
            return false;
        };

        if let Some(image) = page.image.as_mut() {
            image.src = Some(src.to_string());
        }
        if let Some(zone) = page.zone.as_mut().filter(|z| z.id == id) {
            zone.populated = true;
        }
        true
    }

    pub fn set_zone_hidden(projection: &mut Projection, id: &str, hidden: bool) -> bool {
        projection.field_writes += 1;
        match projection
            .page_with(|p| p.zone.as_ref().is_some_and(|z| z.id == id))
            .and_then(|p| p.zone.as_mut())
        {
            Some(zone) => {
                zone.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn set_zone_position(projection: &mut Projection, id: &str, position: ZonePosition) -> bool {
        projection.field_writes += 1;
        match projection
            .page_with(|p| p.zone.as_ref().is_some_and(|z| z.id == id))
            .and_then(|p| p.zone.as_mut())
        {
            Some(zone) => {
                zone.position = position;
                true
            }
            None => false,
        }
    }

    /// Apply whichever zone members are set
    pub fn set_zone(projection: &mut Projection, id: &str, zone: &ZoneState) -> bool {
        let mut bound = true;
        if let Some(hidden) = zone.hidden {
            bound &= Self::set_zone_hidden(projection, id, hidden);
        }
        if let Some(position) = zone.position {
            bound &= Self::set_zone_position(projection, id, position);
        }
        bound
    }

    pub fn set_editable(projection: &mut Projection, id: &str, html: &str) -> bool {
        projection.field_writes += 1;
        match projection.editables.get_mut(id) {
            Some(content) => {
                *content = html.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BookLayout;
    use crate::projection::Region;

    fn projection() -> Projection {
        Projection::from_layout(&BookLayout::standard())
    }

    #[test]
    fn test_set_text_queues_one_fit_request() {
        let mut projection = projection();
        assert!(Projector::set_text(&mut projection, "page-1a", "Once"));
        assert!(Projector::set_text(&mut projection, "page-1a", "Once upon"));

        assert_eq!(projection.text("page-1a").unwrap().content, "Once upon");
        assert_eq!(projection.pending_fit_requests(), ["page-1a".to_string()]);
        assert_eq!(projection.field_writes(), 2);

        assert_eq!(projection.take_fit_requests(), ["page-1a".to_string()]);
        assert!(projection.pending_fit_requests().is_empty());
        assert!(Projector::set_text(&mut projection, "page-1a", "Once upon a time"));
        assert_eq!(projection.pending_fit_requests(), ["page-1a".to_string()]);
    }

    #[test]
    fn test_unknown_field_is_unbound() {
        let mut projection = projection();
        assert!(!Projector::set_text(&mut projection, "nope", "x"));
        assert!(!Projector::set_editable(&mut projection, "nope", "x"));
        assert!(!Projector::set_zone_hidden(&mut projection, "nope", true));
    }

    #[test]
    fn test_image_populates_zone() {
        let mut projection = projection();
        assert!(Projector::set_image(&mut projection, "img-2b", "data:image/png;base64,AA"));

        assert_eq!(
            projection.image("img-2b").unwrap().src.as_deref(),
            Some("data:image/png;base64,AA")
        );
        assert!(projection.zone("img-2b").unwrap().populated);
        assert!(!projection.zone("img-2a").unwrap().populated);
    }

    #[test]
    fn test_zone_members_apply_independently() {
        let mut projection = projection();
        Projector::set_zone(&mut projection, "img-1a", &ZoneState::hidden(true));

        let zone = projection.zone("img-1a").unwrap();
        assert!(zone.hidden);
        assert!(zone.add_image_visible());
        assert_eq!(zone.position, ZonePosition::Top);

        Projector::set_zone(&mut projection, "img-1a", &ZoneState::positioned(ZonePosition::Bottom));
        let zone = projection.zone("img-1a").unwrap();
        assert!(zone.hidden);
        assert_eq!(zone.reading_order(), [Region::Text, Region::Image]);
    }

    #[test]
    fn test_apply_full_snapshot() {
        let mut snapshot = BookState::default();
        snapshot.texts.insert("page-3b".to_string(), "fin".to_string());
        snapshot.editables.insert("title".to_string(), "<b>Book</b>".to_string());
        snapshot
            .zones
            .insert("img-3b".to_string(), ZoneState::positioned(ZonePosition::Top));

        let mut projection = projection();
        Projector::apply(&mut projection, &snapshot, ProjectionScope::Full);

        assert_eq!(projection.text("page-3b").unwrap().content, "fin");
        assert_eq!(projection.editable("title"), Some("<b>Book</b>"));
        assert_eq!(projection.zone("img-3b").unwrap().position, ZonePosition::Top);
    }
}
