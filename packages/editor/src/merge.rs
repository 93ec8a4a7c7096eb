//! # Remote Merge Filter
//!
//! Applies remote snapshots field by field, skipping what did not change
//! since the last snapshot and what the local user is editing right now.
//! The filter is the only owner of the last-known snapshot.

use crate::lease::EditLeases;
use crate::projection::Projection;
use crate::projector::Projector;
use folio_model::BookState;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome of one merge, counted per key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Written through a setter
    pub applied: usize,
    /// Equal to the previous snapshot
    pub unchanged: usize,
    /// Skipped because the field is being edited locally
    pub leased: usize,
    /// Applied, but no field with that id exists in the projection
    pub unbound: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.applied == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeFilter {
    previous: BookState,
}

impl MergeFilter {
    pub fn new(previous: BookState) -> Self {
        Self { previous }
    }

    /// Last snapshot seen
    pub fn previous(&self) -> &BookState {
        &self.previous
    }

    /// Apply the keys of `incoming` that changed and are not leased, then
    /// remember `incoming` as the previous snapshot.
    pub fn merge(
        &mut self,
        projection: &mut Projection,
        leases: &EditLeases,
        incoming: BookState,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        merge_map(
            &mut report,
            leases,
            &self.previous.texts,
            &incoming.texts,
            |id, value| Projector::set_text(projection, id, value),
        );
        merge_map(
            &mut report,
            leases,
            &self.previous.images,
            &incoming.images,
            |id, src| Projector::set_image(projection, id, src),
        );
        merge_map(
            &mut report,
            leases,
            &self.previous.editables,
            &incoming.editables,
            |id, html| Projector::set_editable(projection, id, html),
        );

        // Zones are toggled with a single click and never leased
        merge_map(
            &mut report,
            &EditLeases::default(),
            &self.previous.zones,
            &incoming.zones,
            |id, zone| Projector::set_zone(projection, id, zone),
        );

        if report.is_noop() {
            debug!(?report, "Remote snapshot changed nothing");
        } else {
            info!(
                applied = report.applied,
                leased = report.leased,
                unbound = report.unbound,
                "Merged remote snapshot"
            );
        }

        self.previous = incoming;
        report
    }
}

fn merge_map<V, F>(
    report: &mut MergeReport,
    leases: &EditLeases,
    previous: &BTreeMap<String, V>,
    incoming: &BTreeMap<String, V>,
    mut apply: F,
) where
    V: PartialEq,
    F: FnMut(&str, &V) -> bool,
{
    for (id, value) in incoming {
        if previous.get(id) == Some(value) {
            report.unchanged += 1;
            continue;
        }
        if leases.is_leased(id) {
            debug!(field = %id, "Skipping remote value for field being edited");
            report.leased += 1;
            continue;
        }
        report.applied += 1;
        if !apply(id, value) {
            report.unbound += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BookLayout;
    use folio_model::{ZonePosition, ZoneState};

    fn snapshot(text: &str) -> BookState {
        let mut state = BookState::default();
        state.texts.insert("page-1a".to_string(), text.to_string());
        state.editables.insert("title".to_string(), "Title".to_string());
        state
    }

    #[test]
    fn test_identical_snapshot_writes_nothing() {
        let mut projection = Projection::from_layout(&BookLayout::standard());
        let state = snapshot("a");
        let mut filter = MergeFilter::new(state.clone());

        let report = filter.merge(&mut projection, &EditLeases::new(), state);

        assert!(report.is_noop());
        assert_eq!(report.unchanged, 2);
        assert_eq!(projection.field_writes(), 0);
    }

    #[test]
    fn test_leased_field_skipped_but_previous_advances() {
        let mut projection = Projection::from_layout(&BookLayout::standard());
        let mut filter = MergeFilter::new(snapshot("a"));
        let mut leases = EditLeases::new();
        leases.begin("page-1a");

        let report = filter.merge(&mut projection, &leases, snapshot("b"));

        assert_eq!(report.leased, 1);
        assert_eq!(projection.text("page-1a").unwrap().content, "");
        assert_eq!(filter.previous().texts["page-1a"], "b");
    }

    #[test]
    fn test_changed_zone_applies() {
        let mut projection = Projection::from_layout(&BookLayout::standard());
        let mut filter = MergeFilter::default();
        let mut incoming = BookState::default();
        incoming
            .zones
            .insert("img-1a".to_string(), ZoneState::positioned(ZonePosition::Bottom));
        incoming.texts.insert("ghost".to_string(), "x".to_string());

        let report = filter.merge(&mut projection, &EditLeases::new(), incoming);

        assert_eq!(report.applied, 2);
        assert_eq!(report.unbound, 1);
        assert_eq!(projection.zone("img-1a").unwrap().position, ZonePosition::Bottom);
    }
}
