//! # Book Session
//!
//! One open book: the live projection plus everything that keeps it in step
//! with the store. A session is plain data mutated through `&mut self`;
//! remote snapshots are fed to `apply_remote` between local events.
//!
//! Local changes are sent through the session's `PatchSink` as field-level
//! patches and never wait for the store.

use crate::edits::Edit;
use crate::errors::EditorError;
use crate::layout::BookLayout;
use crate::lease::EditLeases;
use crate::merge::{MergeFilter, MergeReport};
use crate::navigation::{Direction, NavChange, Navigator};
use crate::projection::{Projection, Spread, SpreadKey};
use crate::projector::{ProjectionScope, Projector};
use crate::reconciler::Reconciler;
use folio_model::{BookPatch, BookState, DynamicSpreadDescriptor, PageSide, ZonePosition};
use folio_store::{BookStore, PatchSink};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BookSession {
    layout: BookLayout,
    projection: Projection,
    reconciler: Reconciler,
    filter: MergeFilter,
    leases: EditLeases,
    navigator: Navigator,
    sink: Arc<dyn PatchSink>,
}

impl BookSession {
    /// Load the book from `store` and build its projection. Local edits are
    /// persisted back to the same store.
    pub async fn open(store: &BookStore, layout: BookLayout, mobile: bool) -> Self {
        let snapshot = store.load().await;
        Self::from_snapshot(layout, snapshot, Arc::new(store.clone()), mobile)
    }

    /// Build a session from an already loaded snapshot
    pub fn from_snapshot(
        layout: BookLayout,
        snapshot: BookState,
        sink: Arc<dyn PatchSink>,
        mobile: bool,
    ) -> Self {
        let mut projection = Projection::from_layout(&layout);
        let mut reconciler = Reconciler::new(layout.template.clone());

        reconciler.rebuild(&mut projection, &snapshot.dynamic_spreads);
        Projector::apply(&mut projection, &snapshot, ProjectionScope::Full);

        let mut navigator = Navigator::new(mobile);
        navigator.restore(
            &projection,
            snapshot.current_spread_index,
            snapshot.mobile_page_side,
        );

        info!(
            spreads = projection.len(),
            dynamic = reconciler.persisted().len(),
            current = navigator.current(),
            "Opened book session"
        );

        Self {
            layout,
            projection,
            reconciler,
            filter: MergeFilter::new(snapshot),
            leases: EditLeases::new(),
            navigator,
            sink,
        }
    }

    pub fn layout(&self) -> &BookLayout {
        &self.layout
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn leases(&self) -> &EditLeases {
        &self.leases
    }

    /// Persisted dynamic spread list
    pub fn dynamic_spreads(&self) -> &[DynamicSpreadDescriptor] {
        self.reconciler.persisted()
    }

    /// Last remote snapshot merged
    pub fn last_snapshot(&self) -> &BookState {
        self.filter.previous()
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    pub fn current_spread(&self) -> Option<&Spread> {
        self.projection.at(self.navigator.current())
    }

    pub fn nav_label(&self) -> String {
        self.navigator.nav_label(&self.projection)
    }

    // ------------------------------------------------------------------
    // Local edits
    // ------------------------------------------------------------------

    /// Write an edit into the projection and persist it
    pub fn apply_edit(&mut self, edit: Edit) -> Result<(), EditorError> {
        let patch = edit.apply(&mut self.projection)?;
        debug!(field = edit.field_id(), "Local edit");
        self.sink.send(patch);
        Ok(())
    }

    pub fn edit_text(&mut self, field_id: &str, value: &str) -> Result<(), EditorError> {
        self.apply_edit(Edit::SetText {
            field_id: field_id.to_string(),
            value: value.to_string(),
        })
    }

    pub fn edit_image(&mut self, field_id: &str, src: &str) -> Result<(), EditorError> {
        self.apply_edit(Edit::SetImage {
            field_id: field_id.to_string(),
            src: src.to_string(),
        })
    }

    pub fn hide_zone(&mut self, zone_id: &str) -> Result<(), EditorError> {
        self.apply_edit(Edit::HideZone {
            zone_id: zone_id.to_string(),
        })
    }

    pub fn show_zone(&mut self, zone_id: &str) -> Result<(), EditorError> {
        self.apply_edit(Edit::ShowZone {
            zone_id: zone_id.to_string(),
        })
    }

    pub fn move_zone(&mut self, zone_id: &str, position: ZonePosition) -> Result<(), EditorError> {
        self.apply_edit(Edit::MoveZone {
            zone_id: zone_id.to_string(),
            position,
        })
    }

    pub fn edit_editable(&mut self, editable_id: &str, html: &str) -> Result<(), EditorError> {
        self.apply_edit(Edit::SetEditable {
            editable_id: editable_id.to_string(),
            html: html.to_string(),
        })
    }

    /// The input layer focused a field; remote values for it are held back
    pub fn begin_edit(&mut self, field_id: &str) {
        self.leases.begin(field_id);
    }

    /// The field lost focus or was committed
    pub fn end_edit(&mut self, field_id: &str) {
        self.leases.end(field_id);
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Add a page after the current spread and navigate to it
    pub fn add_page(&mut self) -> Result<SpreadKey, EditorError> {
        let index = self.navigator.current();
        let key = self
            .projection
            .keys()
            .get(index)
            .copied()
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.projection.len(),
            })?;
        self.add_page_after(key)
    }

    /// Add a page after `node` and navigate to it
    pub fn add_page_after(&mut self, node: SpreadKey) -> Result<SpreadKey, EditorError> {
        let key = self.reconciler.insert_after(&mut self.projection, node)?;
        self.persist_dynamic_spreads();

        if let Some(index) = self.projection.position(key) {
            let change = self.navigator.enter(&self.projection, index, Direction::Next);
            self.persist_position(change);
        }
        Ok(key)
    }

    /// Remove the current spread. Only dynamic spreads can be removed.
    pub fn remove_current_page(&mut self) -> Result<DynamicSpreadDescriptor, EditorError> {
        let index = self.navigator.current();
        let key = self
            .projection
            .keys()
            .get(index)
            .copied()
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.projection.len(),
            })?;
        self.remove_page(key)
    }

    /// Remove a dynamic spread; the position is clamped to the shorter book
    pub fn remove_page(&mut self, node: SpreadKey) -> Result<DynamicSpreadDescriptor, EditorError> {
        let removed = self.reconciler.remove(&mut self.projection, node)?;
        self.persist_dynamic_spreads();

        if self.navigator.clamp_to(&self.projection) {
            self.persist_position(Some(NavChange {
                spread_changed: true,
                side_changed: false,
            }));
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Returns false when there is nowhere to go
    pub fn turn_page(&mut self, direction: Direction) -> bool {
        let change = self.navigator.turn_page(&self.projection, direction);
        let moved = change.is_some();
        self.persist_position(change);
        moved
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), EditorError> {
        let change = self
            .navigator
            .jump_to(&self.projection, index)
            .ok_or(EditorError::IndexOutOfRange {
                index,
                len: self.projection.len(),
            })?;
        self.persist_position(Some(change));
        Ok(())
    }

    pub fn set_mobile(&mut self, mobile: bool) {
        self.navigator.set_mobile(mobile);
    }

    // ------------------------------------------------------------------
    // Remote
    // ------------------------------------------------------------------

    /// Merge a snapshot delivered by the store subscription
    pub fn apply_remote(&mut self, snapshot: BookState) -> MergeReport {
        debug!(leased = self.leases.len(), "Merging remote snapshot");
        self.filter
            .merge(&mut self.projection, &self.leases, snapshot)
    }

    fn persist_dynamic_spreads(&self) {
        self.sink
            .send(BookPatch::dynamic_spreads(self.reconciler.persisted().to_vec()));
    }

    fn persist_position(&self, change: Option<NavChange>) {
        let Some(change) = change else {
            return;
        };
        let mut patch = BookPatch::default();
        if change.spread_changed {
            patch.current_spread_index = Some(self.navigator.current());
        }
        if change.side_changed {
            patch.mobile_page_side = Some(self.navigator.side());
        }
        if !patch.is_empty() {
            self.sink.send(patch);
        }
    }

    /// Side of the current spread shown on mobile
    pub fn mobile_page_side(&self) -> PageSide {
        self.navigator.side()
    }
}
