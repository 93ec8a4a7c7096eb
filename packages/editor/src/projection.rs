//! # Live Projection
//!
//! In-memory model of the book as it is being shown: an arena of spread
//! records addressed by stable `SpreadKey`s plus the reading order over them.
//! "Insert after" is an insertion into the order; rendering is a pure
//! function of this state.
//!
//! ```text
//! order:  [k0, k1, k5, k2, k3, k4]        (k5 is dynamic)
//! arena:  k0 → Spread { Static(0), "cover", index 0, … }
//!         k5 → Spread { Dynamic("dyn-…"), "ch1", index 2, … }
//! ```
//!
//! `Spread::index` and `Page::number` are derived and only valid after
//! `reindex`/`renumber_pages` (the reconciler runs both after every change).

use crate::layout::{is_terminal_chapter, BookLayout, PageSlots};
use folio_model::{DynamicSpreadDescriptor, FieldId, PageSide, SpreadPages, ZonePosition};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Stable arena key of a spread. Never reused within a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpreadKey(u32);

impl fmt::Display for SpreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpreadKind {
    /// Authored spread with its fixed sequential tag
    Static { tag: usize },

    /// Spread materialized from a descriptor; keeps the descriptor's field ids
    Dynamic { id: String, fields: SpreadPages },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spread {
    pub key: SpreadKey,
    pub kind: SpreadKind,
    pub chapter: String,
    pub label: String,
    /// Dense 0-based position in reading order
    pub index: usize,
    pub left: Page,
    pub right: Page,
}

impl Spread {
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, SpreadKind::Dynamic { .. })
    }

    pub fn dynamic_id(&self) -> Option<&str> {
        match &self.kind {
            SpreadKind::Dynamic { id, .. } => Some(id),
            SpreadKind::Static { .. } => None,
        }
    }

    pub fn static_tag(&self) -> Option<usize> {
        match self.kind {
            SpreadKind::Static { tag } => Some(tag),
            SpreadKind::Dynamic { .. } => None,
        }
    }

    /// Cover and back cover carry no page numbers
    pub fn is_terminal(&self) -> bool {
        is_terminal_chapter(&self.chapter)
    }

    pub fn page(&self, side: PageSide) -> &Page {
        match side {
            PageSide::Left => &self.left,
            PageSide::Right => &self.right,
        }
    }

    pub fn page_mut(&mut self, side: PageSide) -> &mut Page {
        match side {
            PageSide::Left => &mut self.left,
            PageSide::Right => &mut self.right,
        }
    }

    pub fn pages(&self) -> [&Page; 2] {
        [&self.left, &self.right]
    }

    pub fn pages_mut(&mut self) -> [&mut Page; 2] {
        [&mut self.left, &mut self.right]
    }
}

/// One half of a spread
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub side: PageSide,
    /// Displayed page number; `None` on cover/end spreads
    pub number: Option<u32>,
    pub text: Option<TextField>,
    pub image: Option<ImageField>,
    pub zone: Option<Zone>,
}

impl Page {
    pub fn empty(side: PageSide) -> Self {
        Self {
            side,
            number: None,
            text: None,
            image: None,
            zone: None,
        }
    }

    pub(crate) fn from_slots(side: PageSide, slots: &PageSlots) -> Self {
        let mut page = Self::empty(side);
        page.text = slots.text.as_ref().map(|id| TextField::new(id.clone()));
        if let Some(id) = &slots.image {
            page.image = Some(ImageField::new(id.clone()));
            page.zone = Some(Zone::new(id.clone(), slots.image_position, false));
        }
        page
    }

    /// Regions in reading order; a page without a zone only has text
    pub fn reading_order(&self) -> Vec<Region> {
        match &self.zone {
            Some(zone) => zone.reading_order().to_vec(),
            None => vec![Region::Text],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub id: FieldId,
    pub content: String,
}

impl TextField {
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            content: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageField {
    pub id: FieldId,
    pub src: Option<String>,
}

impl ImageField {
    pub fn new(id: FieldId) -> Self {
        Self { id, src: None }
    }
}

/// The two regions of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Image,
    Text,
}

/// Image region of a page: visibility and placement relative to the text
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: FieldId,
    pub hidden: bool,
    pub position: ZonePosition,
    /// An image has been loaded into the zone
    pub populated: bool,
}

impl Zone {
    pub fn new(id: FieldId, position: ZonePosition, hidden: bool) -> Self {
        Self {
            id,
            hidden,
            position,
            populated: false,
        }
    }

    /// The "add image" affordance shows exactly when the zone is hidden
    pub fn add_image_visible(&self) -> bool {
        self.hidden
    }

    /// Position controls are only offered for a visible zone
    pub fn controls_visible(&self) -> bool {
        !self.hidden
    }

    /// Position control currently marked active
    pub fn active_control(&self) -> ZonePosition {
        self.position
    }

    pub fn reading_order(&self) -> [Region; 2] {
        match self.position {
            ZonePosition::Top => [Region::Image, Region::Text],
            ZonePosition::Bottom => [Region::Text, Region::Image],
        }
    }

    /// Exclusive top/bottom marker carried by `region`
    pub fn marker(&self, region: Region) -> ZonePosition {
        match region {
            Region::Image => self.position,
            Region::Text => self.position.opposite(),
        }
    }
}

/// Arena of spreads plus reading order
#[derive(Debug, Clone)]
pub struct Projection {
    spreads: HashMap<SpreadKey, Spread>,
    order: Vec<SpreadKey>,
    next_key: u32,
    pub(crate) editables: BTreeMap<String, String>,
    pub(crate) fit_requests: Vec<FieldId>,
    pub(crate) field_writes: u64,
}

impl Projection {
    /// Empty projection (no spreads, no editables)
    pub fn new() -> Self {
        Self {
            spreads: HashMap::new(),
            order: Vec::new(),
            next_key: 0,
            editables: BTreeMap::new(),
            fit_requests: Vec::new(),
            field_writes: 0,
        }
    }

    /// Projection of the authored book, before any dynamic spread exists
    pub fn from_layout(layout: &BookLayout) -> Self {
        let mut projection = Self::new();

        for (tag, authored) in layout.spreads.iter().enumerate() {
            let key = projection.allocate_key();
            let spread = Spread {
                key,
                kind: SpreadKind::Static { tag },
                chapter: authored.chapter.clone(),
                label: authored.label.clone(),
                index: tag,
                left: Page::from_slots(PageSide::Left, &authored.left),
                right: Page::from_slots(PageSide::Right, &authored.right),
            };
            projection.spreads.insert(key, spread);
            projection.order.push(key);
        }

        projection.editables = layout
            .editables
            .iter()
            .map(|id| (id.clone(), String::new()))
            .collect();

        projection.reindex();
        projection.renumber_pages();
        projection
    }

    pub(crate) fn allocate_key(&mut self) -> SpreadKey {
        let key = SpreadKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Spreads in reading order
    pub fn spreads(&self) -> impl Iterator<Item = &Spread> + '_ {
        self.order.iter().filter_map(|key| self.spreads.get(key))
    }

    pub fn keys(&self) -> &[SpreadKey] {
        &self.order
    }

    pub fn get(&self, key: SpreadKey) -> Option<&Spread> {
        self.spreads.get(&key)
    }

    pub fn get_mut(&mut self, key: SpreadKey) -> Option<&mut Spread> {
        self.spreads.get_mut(&key)
    }

    /// Spread at a reading-order position
    pub fn at(&self, index: usize) -> Option<&Spread> {
        self.order.get(index).and_then(|key| self.spreads.get(key))
    }

    pub fn position(&self, key: SpreadKey) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }

    pub fn find_dynamic(&self, id: &str) -> Option<SpreadKey> {
        self.spreads()
            .find(|s| s.dynamic_id() == Some(id))
            .map(|s| s.key)
    }

    pub fn find_static(&self, tag: usize) -> Option<SpreadKey> {
        self.spreads()
            .find(|s| s.static_tag() == Some(tag))
            .map(|s| s.key)
    }

    /// Place `spread` right after `anchor`, or at the end when there is none
    pub(crate) fn insert_after(&mut self, anchor: Option<SpreadKey>, spread: Spread) -> SpreadKey {
        let key = spread.key;
        let at = anchor
            .and_then(|anchor| self.position(anchor))
            .map(|pos| pos + 1)
            .unwrap_or(self.order.len());
        self.order.insert(at, key);
        self.spreads.insert(key, spread);
        key
    }

    /// Remove a spread from the order and the arena
    pub(crate) fn detach(&mut self, key: SpreadKey) -> Option<Spread> {
        let pos = self.position(key)?;
        self.order.remove(pos);
        self.spreads.remove(&key)
    }

    /// Assign dense 0-based positions in reading order
    pub fn reindex(&mut self) {
        for (index, key) in self.order.iter().enumerate() {
            if let Some(spread) = self.spreads.get_mut(key) {
                spread.index = index;
            }
        }
    }

    /// Assign dense 1-based page numbers, skipping cover and end spreads
    pub fn renumber_pages(&mut self) {
        let mut number = 1u32;
        for key in &self.order {
            let Some(spread) = self.spreads.get_mut(key) else {
                continue;
            };
            let terminal = spread.is_terminal();
            for page in spread.pages_mut() {
                if terminal {
                    page.number = None;
                } else {
                    page.number = Some(number);
                    number += 1;
                }
            }
        }
    }

    /// Serialize the dynamic spreads back into descriptors.
    ///
    /// Anchors are normalized to each spread's live predecessor: a dynamic
    /// predecessor becomes `after_dynamic_id`, a static one
    /// `after_static_spread`.
    pub fn dynamic_descriptors(&self) -> Vec<DynamicSpreadDescriptor> {
        let mut descriptors = Vec::new();
        let mut previous: Option<&Spread> = None;

        for spread in self.spreads() {
            if let SpreadKind::Dynamic { id, fields } = &spread.kind {
                let (after_dynamic_id, after_static_spread) = match previous {
                    Some(prev) => (prev.dynamic_id().map(str::to_string), prev.static_tag()),
                    None => (None, None),
                };
                descriptors.push(DynamicSpreadDescriptor {
                    id: id.clone(),
                    chapter: spread.chapter.clone(),
                    label: spread.label.clone(),
                    after_dynamic_id,
                    after_static_spread,
                    pages: fields.clone(),
                });
            }
            previous = Some(spread);
        }

        descriptors
    }

    pub fn text(&self, id: &str) -> Option<&TextField> {
        self.spreads()
            .flat_map(|s| s.pages())
            .filter_map(|p| p.text.as_ref())
            .find(|t| t.id == id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageField> {
        self.spreads()
            .flat_map(|s| s.pages())
            .filter_map(|p| p.image.as_ref())
            .find(|i| i.id == id)
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.spreads()
            .flat_map(|s| s.pages())
            .filter_map(|p| p.zone.as_ref())
            .find(|z| z.id == id)
    }

    pub fn editable(&self, id: &str) -> Option<&str> {
        self.editables.get(id).map(String::as_str)
    }

    pub fn editables(&self) -> &BTreeMap<String, String> {
        &self.editables
    }

    pub(crate) fn page_with<F>(&mut self, mut matches: F) -> Option<&mut Page>
    where
        F: FnMut(&Page) -> bool,
    {
        self.spreads
            .values_mut()
            .flat_map(|s| s.pages_mut())
            .find(|p| matches(&**p))
    }

    /// Number of single-field setter invocations so far
    pub fn field_writes(&self) -> u64 {
        self.field_writes
    }

    /// Text fields whose size must be re-fitted by the renderer
    pub fn take_fit_requests(&mut self) -> Vec<FieldId> {
        std::mem::take(&mut self.fit_requests)
    }

    pub fn pending_fit_requests(&self) -> &[FieldId] {
        &self.fit_requests
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{StaticSpread, COVER_CHAPTER, END_CHAPTER};

    fn three_spread_layout() -> BookLayout {
        let interior = PageSlots {
            text: Some("t".to_string()),
            image: None,
            image_position: ZonePosition::Top,
        };
        BookLayout {
            spreads: vec![
                StaticSpread {
                    chapter: COVER_CHAPTER.to_string(),
                    label: "Cover".to_string(),
                    left: PageSlots::default(),
                    right: PageSlots::default(),
                },
                StaticSpread {
                    chapter: "ch1".to_string(),
                    label: "One".to_string(),
                    left: interior.clone(),
                    right: PageSlots::default(),
                },
                StaticSpread {
                    chapter: END_CHAPTER.to_string(),
                    label: "End".to_string(),
                    left: PageSlots::default(),
                    right: PageSlots::default(),
                },
            ],
            editables: vec!["title".to_string()],
            template: Default::default(),
        }
    }

    #[test]
    fn test_numbering_skips_cover_and_end() {
        let projection = Projection::from_layout(&three_spread_layout());

        let numbers: Vec<Vec<Option<u32>>> = projection
            .spreads()
            .map(|s| s.pages().iter().map(|p| p.number).collect())
            .collect();

        assert_eq!(
            numbers,
            vec![vec![None, None], vec![Some(1), Some(2)], vec![None, None]]
        );
    }

    #[test]
    fn test_static_spreads_keep_their_tags() {
        let projection = Projection::from_layout(&three_spread_layout());
        let tags: Vec<_> = projection.spreads().map(|s| s.static_tag()).collect();
        assert_eq!(tags, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(projection.editable("title"), Some(""));
    }

    #[test]
    fn test_zone_layout_follows_position() {
        let mut zone = Zone::new("img".to_string(), ZonePosition::Top, false);
        assert_eq!(zone.reading_order(), [Region::Image, Region::Text]);
        assert_eq!(zone.marker(Region::Text), ZonePosition::Bottom);

        zone.position = ZonePosition::Bottom;
        zone.hidden = true;
        assert_eq!(zone.reading_order(), [Region::Text, Region::Image]);
        assert_eq!(zone.marker(Region::Image), ZonePosition::Bottom);
        assert_eq!(zone.marker(Region::Text), ZonePosition::Top);
        assert!(zone.add_image_visible());
        assert!(!zone.controls_visible());
    }
}
