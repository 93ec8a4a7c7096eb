//! # Navigation
//!
//! Current position in the book. On narrow viewports one page is shown at a
//! time, so turning first steps between the two halves of an interior spread
//! before moving to the next spread.

use crate::projection::Projection;
use folio_model::PageSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Position change produced by a navigation call; the caller persists it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavChange {
    pub spread_changed: bool,
    pub side_changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: usize,
    side: PageSide,
    mobile: bool,
}

impl Navigator {
    pub fn new(mobile: bool) -> Self {
        Self {
            current: 0,
            side: PageSide::Left,
            mobile,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn side(&self) -> PageSide {
        self.side
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn set_mobile(&mut self, mobile: bool) {
        self.mobile = mobile;
    }

    /// Restore a persisted position, clamped to the book
    pub fn restore(&mut self, projection: &Projection, index: usize, side: PageSide) {
        self.current = clamp(index, projection.len());
        self.side = side;
    }

    pub fn can_go_prev(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_next(&self, projection: &Projection) -> bool {
        self.current + 1 < projection.len()
    }

    pub fn turn_page(&mut self, projection: &Projection, direction: Direction) -> Option<NavChange> {
        if self.mobile && self.on_interior(projection) {
            let target = match direction {
                Direction::Next => PageSide::Right,
                Direction::Prev => PageSide::Left,
            };
            if self.side != target {
                self.side = target;
                return Some(NavChange {
                    spread_changed: false,
                    side_changed: true,
                });
            }
        }

        let next = match direction {
            Direction::Next if self.can_go_next(projection) => self.current + 1,
            Direction::Prev if self.can_go_prev() => self.current - 1,
            _ => return None,
        };

        self.enter(projection, next, direction)
    }

    /// Make `index` the current spread as if turned to in `direction`.
    /// Entering forward shows the left half, backward the right half.
    pub fn enter(
        &mut self,
        projection: &Projection,
        index: usize,
        direction: Direction,
    ) -> Option<NavChange> {
        if index >= projection.len() {
            return None;
        }
        let side = match direction {
            Direction::Next => PageSide::Left,
            Direction::Prev => PageSide::Right,
        };
        let change = NavChange {
            spread_changed: index != self.current,
            side_changed: side != self.side,
        };
        self.current = index;
        self.side = side;
        Some(change)
    }

    /// Jump to a spread without animation. Out-of-range indices are ignored.
    pub fn jump_to(&mut self, projection: &Projection, index: usize) -> Option<NavChange> {
        if index >= projection.len() {
            return None;
        }
        let spread_changed = index != self.current;
        self.current = index;
        Some(NavChange {
            spread_changed,
            side_changed: false,
        })
    }

    /// Keep the position valid after the book shrank
    pub fn clamp_to(&mut self, projection: &Projection) -> bool {
        let clamped = clamp(self.current, projection.len());
        let changed = clamped != self.current;
        self.current = clamped;
        changed
    }

    /// Navigation indicator text: the spread label, plus the visible half on
    /// mobile interior spreads
    pub fn nav_label(&self, projection: &Projection) -> String {
        let Some(spread) = projection.at(self.current) else {
            return String::new();
        };
        if self.mobile && !spread.is_terminal() {
            let half = match self.side {
                PageSide::Left => "A",
                PageSide::Right => "B",
            };
            format!("{} · pág {}", spread.label, half)
        } else {
            spread.label.clone()
        }
    }

    fn on_interior(&self, projection: &Projection) -> bool {
        projection
            .at(self.current)
            .is_some_and(|s| !s.is_terminal())
    }
}

fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
