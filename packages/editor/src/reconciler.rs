//! # Structural Reconciler
//!
//! Turns the persisted list of dynamic spread descriptors into spreads of the
//! live projection, and keeps that list in step when pages are added or
//! removed at runtime.
//!
//! Anchor resolution for each descriptor, in list order:
//! 1. `after_dynamic_id` among dynamic spreads already materialized
//! 2. `after_static_spread` among static spreads, by tag
//! 3. otherwise append at the end
//!
//! Chains of dynamic spreads therefore rebuild in order as long as each
//! descriptor appears after the one it is anchored to.

use crate::errors::EditorError;
use crate::layout::{SpreadTemplate, TemplateSlot};
use crate::projection::{ImageField, Page, Projection, Spread, SpreadKey, SpreadKind, TextField, Zone};
use folio_model::{
    generate_spread_id, DynamicSpreadDescriptor, PageFieldSet, PageSide, SpreadPages, ZonePosition,
};
use tracing::{debug, info, instrument, warn};

/// Owns the persisted dynamic list and the template new spreads are cloned from
#[derive(Debug, Clone)]
pub struct Reconciler {
    template: SpreadTemplate,
    descriptors: Vec<DynamicSpreadDescriptor>,
}

impl Reconciler {
    pub fn new(template: SpreadTemplate) -> Self {
        Self {
            template,
            descriptors: Vec::new(),
        }
    }

    /// Persisted dynamic list, in insertion order
    pub fn persisted(&self) -> &[DynamicSpreadDescriptor] {
        &self.descriptors
    }

    /// Materialize every descriptor not yet present in the projection
    #[instrument(skip_all, fields(count = descriptors.len()))]
    pub fn rebuild(&mut self, projection: &mut Projection, descriptors: &[DynamicSpreadDescriptor]) {
        for descriptor in descriptors {
            if !self.descriptors.iter().any(|d| d.id == descriptor.id) {
                self.descriptors.push(descriptor.clone());
            }

            if projection.find_dynamic(&descriptor.id).is_some() {
                debug!(id = %descriptor.id, "Dynamic spread already materialized");
                continue;
            }

            let anchor = resolve_anchor(projection, descriptor);
            if anchor.is_none() {
                warn!(
                    id = %descriptor.id,
                    after_dynamic_id = ?descriptor.after_dynamic_id,
                    after_static_spread = ?descriptor.after_static_spread,
                    "Anchor not found, appending spread at the end"
                );
            }

            let spread = self.materialize(projection, descriptor);
            projection.insert_after(anchor, spread);
        }

        projection.reindex();
        projection.renumber_pages();
        info!(spreads = projection.len(), "Rebuilt projection");
    }

    /// Insert a fresh dynamic spread right after `node` and record it.
    ///
    /// Returns the key of the new spread.
    pub fn insert_after(
        &mut self,
        projection: &mut Projection,
        node: SpreadKey,
    ) -> Result<SpreadKey, EditorError> {
        let anchor = projection
            .get(node)
            .ok_or(EditorError::SpreadNotFound(node))?;

        let id = generate_spread_id();
        let descriptor = DynamicSpreadDescriptor {
            chapter: anchor.chapter.clone(),
            label: format!("{} cont.", anchor.label),
            after_dynamic_id: anchor.dynamic_id().map(str::to_string),
            after_static_spread: anchor.static_tag(),
            pages: SpreadPages {
                left: fresh_field_set(&id, PageSide::Left),
                right: fresh_field_set(&id, PageSide::Right),
            },
            id,
        };

        let spread = self.materialize(projection, &descriptor);
        let key = projection.insert_after(Some(node), spread);
        projection.reindex();
        projection.renumber_pages();

        info!(id = %descriptor.id, after = %node, "Inserted dynamic spread");
        self.descriptors.push(descriptor);
        Ok(key)
    }

    /// Detach a dynamic spread and drop its descriptor.
    ///
    /// The persisted list is rewritten from the live projection, so a reload
    /// rebuilds the surviving spreads in the order they are shown now.
    pub fn remove(
        &mut self,
        projection: &mut Projection,
        node: SpreadKey,
    ) -> Result<DynamicSpreadDescriptor, EditorError> {
        let spread = projection
            .get(node)
            .ok_or(EditorError::SpreadNotFound(node))?;
        let Some(id) = spread.dynamic_id().map(str::to_string) else {
            return Err(EditorError::NotDynamic(node));
        };

        let detached = projection.detach(node);

        let removed = match self.descriptors.iter().position(|d| d.id == id) {
            Some(pos) => self.descriptors.remove(pos),
            None => {
                warn!(id = %id, "Removed spread had no persisted descriptor");
                let fields = match detached.map(|s| s.kind) {
                    Some(SpreadKind::Dynamic { fields, .. }) => fields,
                    _ => SpreadPages {
                        left: fresh_field_set(&id, PageSide::Left),
                        right: fresh_field_set(&id, PageSide::Right),
                    },
                };
                DynamicSpreadDescriptor {
                    id,
                    chapter: String::new(),
                    label: String::new(),
                    after_dynamic_id: None,
                    after_static_spread: None,
                    pages: fields,
                }
            }
        };

        projection.reindex();
        projection.renumber_pages();

        // Every survivor is re-anchored on its live predecessor, in reading order
        self.descriptors = projection.dynamic_descriptors();
        debug!(survivors = self.descriptors.len(), "Re-anchored dynamic spreads");

        info!(id = %removed.id, "Removed dynamic spread");
        Ok(removed)
    }

    /// Serialize the live projection back into descriptors
    pub fn descriptors(&self, projection: &Projection) -> Vec<DynamicSpreadDescriptor> {
        projection.dynamic_descriptors()
    }

    fn materialize(&self, projection: &mut Projection, descriptor: &DynamicSpreadDescriptor) -> Spread {
        let key = projection.allocate_key();
        Spread {
            key,
            kind: SpreadKind::Dynamic {
                id: descriptor.id.clone(),
                fields: descriptor.pages.clone(),
            },
            chapter: descriptor.chapter.clone(),
            label: descriptor.label.clone(),
            index: 0,
            left: template_page(
                &descriptor.id,
                PageSide::Left,
                &self.template.left,
                &descriptor.pages.left,
            ),
            right: template_page(
                &descriptor.id,
                PageSide::Right,
                &self.template.right,
                &descriptor.pages.right,
            ),
        }
    }
}

fn resolve_anchor(projection: &Projection, descriptor: &DynamicSpreadDescriptor) -> Option<SpreadKey> {
    descriptor
        .after_dynamic_id
        .as_deref()
        .and_then(|id| projection.find_dynamic(id))
        .or_else(|| {
            descriptor
                .after_static_spread
                .and_then(|tag| projection.find_static(tag))
        })
}

/// Clone one template page and bind the descriptor's field ids to it
fn template_page(spread_id: &str, side: PageSide, slot: &TemplateSlot, fields: &PageFieldSet) -> Page {
    let mut page = Page::empty(side);

    if slot.text {
        page.text = Some(TextField::new(fields.text_id.clone()));
    } else {
        debug!(spread = spread_id, side = side.as_str(), field = %fields.text_id, "Template has no text slot");
    }

    if slot.image {
        page.image = Some(ImageField::new(fields.img_id.clone()));
        page.zone = Some(Zone::new(
            fields.img_id.clone(),
            fields.img_position,
            fields.img_hidden,
        ));
    } else {
        debug!(spread = spread_id, side = side.as_str(), field = %fields.img_id, "Template has no image slot");
    }

    page
}

fn fresh_field_set(id: &str, side: PageSide) -> PageFieldSet {
    let (suffix, position) = match side {
        PageSide::Left => ('l', ZonePosition::Top),
        PageSide::Right => ('r', ZonePosition::Bottom),
    };
    PageFieldSet {
        text_id: format!("{}-t{}", id, suffix),
        img_id: format!("{}-i{}", id, suffix),
        img_position: position,
        img_hidden: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BookLayout;

    fn descriptor(id: &str, after_dynamic: Option<&str>, after_static: Option<usize>) -> DynamicSpreadDescriptor {
        DynamicSpreadDescriptor {
            id: id.to_string(),
            chapter: "ch1".to_string(),
            label: "Chapter 1 cont.".to_string(),
            after_dynamic_id: after_dynamic.map(str::to_string),
            after_static_spread: after_static,
            pages: SpreadPages {
                left: fresh_field_set(id, PageSide::Left),
                right: fresh_field_set(id, PageSide::Right),
            },
        }
    }

    fn setup() -> (Reconciler, Projection) {
        let layout = BookLayout::standard();
        (
            Reconciler::new(layout.template.clone()),
            Projection::from_layout(&layout),
        )
    }

    fn order(projection: &Projection) -> Vec<String> {
        projection
            .spreads()
            .map(|s| match &s.kind {
                SpreadKind::Static { tag } => format!("s{}", tag),
                SpreadKind::Dynamic { id, .. } => id.clone(),
            })
            .collect()
    }

    #[test]
    fn test_fresh_field_ids() {
        let fields = fresh_field_set("dyn-1", PageSide::Left);
        assert_eq!(fields.text_id, "dyn-1-tl");
        assert_eq!(fields.img_id, "dyn-1-il");
        assert_eq!(fields.img_position, ZonePosition::Top);

        let fields = fresh_field_set("dyn-1", PageSide::Right);
        assert_eq!(fields.text_id, "dyn-1-tr");
        assert_eq!(fields.img_id, "dyn-1-ir");
        assert_eq!(fields.img_position, ZonePosition::Bottom);
    }

    #[test]
    fn test_rebuild_places_after_static_anchor() {
        let (mut reconciler, mut projection) = setup();
        reconciler.rebuild(&mut projection, &[descriptor("dyn-a", None, Some(1))]);

        assert_eq!(order(&projection), ["s0", "s1", "dyn-a", "s2", "s3", "s4"]);
        assert_eq!(projection.at(2).map(|s| s.index), Some(2));
    }

    #[test]
    fn test_rebuild_twice_does_not_duplicate() {
        let (mut reconciler, mut projection) = setup();
        let list = [descriptor("dyn-a", None, Some(1))];
        reconciler.rebuild(&mut projection, &list);
        reconciler.rebuild(&mut projection, &list);

        assert_eq!(projection.len(), 6);
        assert_eq!(reconciler.persisted().len(), 1);
    }

    #[test]
    fn test_insert_after_dynamic_anchors_dynamically() {
        let (mut reconciler, mut projection) = setup();
        reconciler.rebuild(&mut projection, &[descriptor("dyn-a", None, Some(2))]);
        let node = projection.find_dynamic("dyn-a").unwrap();

        let key = reconciler.insert_after(&mut projection, node).unwrap();
        let added = reconciler.persisted().last().unwrap();

        assert_eq!(added.after_dynamic_id.as_deref(), Some("dyn-a"));
        assert_eq!(added.after_static_spread, None);
        assert_eq!(added.label, "Chapter 1 cont. cont.");
        assert_eq!(projection.position(key), Some(4));
    }

    #[test]
    fn test_remove_static_is_refused() {
        let (mut reconciler, mut projection) = setup();
        let cover = projection.find_static(0).unwrap();
        assert!(matches!(
            reconciler.remove(&mut projection, cover),
            Err(EditorError::NotDynamic(_))
        ));
        assert_eq!(projection.len(), 5);
    }

    #[test]
    fn test_remove_reanchors_dependents() {
        let (mut reconciler, mut projection) = setup();
        reconciler.rebuild(
            &mut projection,
            &[
                descriptor("dyn-a", None, Some(1)),
                descriptor("dyn-b", Some("dyn-a"), None),
            ],
        );
        let a = projection.find_dynamic("dyn-a").unwrap();
        reconciler.remove(&mut projection, a).unwrap();

        let b = &reconciler.persisted()[0];
        assert_eq!(b.id, "dyn-b");
        assert_eq!(b.after_dynamic_id, None);
        assert_eq!(b.after_static_spread, Some(1));
        assert_eq!(order(&projection), ["s0", "s1", "dyn-b", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_remove_keeps_reload_order() {
        let (mut reconciler, mut projection) = setup();
        reconciler.rebuild(
            &mut projection,
            &[
                descriptor("dyn-a", None, Some(1)),
                descriptor("dyn-b", None, Some(1)),
                descriptor("dyn-c", Some("dyn-a"), None),
            ],
        );
        assert_eq!(
            order(&projection),
            ["s0", "s1", "dyn-b", "dyn-a", "dyn-c", "s2", "s3", "s4"]
        );

        let a = projection.find_dynamic("dyn-a").unwrap();
        reconciler.remove(&mut projection, a).unwrap();
        assert_eq!(order(&projection), ["s0", "s1", "dyn-b", "dyn-c", "s2", "s3", "s4"]);

        let (mut reloaded, mut fresh) = setup();
        let persisted = reconciler.persisted().to_vec();
        reloaded.rebuild(&mut fresh, &persisted);
        assert_eq!(order(&fresh), order(&projection));
    }

    #[test]
    fn test_missing_template_slot_skips_field() {
        let mut layout = BookLayout::standard();
        layout.template.right.image = false;
        let mut reconciler = Reconciler::new(layout.template.clone());
        let mut projection = Projection::from_layout(&layout);

        reconciler.rebuild(&mut projection, &[descriptor("dyn-a", None, Some(1))]);

        let spread = projection.get(projection.find_dynamic("dyn-a").unwrap()).unwrap();
        assert!(spread.left.image.is_some());
        assert!(spread.right.image.is_none());
        assert!(spread.right.zone.is_none());
        assert!(spread.right.text.is_some());
    }
}
