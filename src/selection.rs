//! Selection state.
//!
//! A selection is just an anchor and a head; min/max are derived at use
//! time and the text-aware vs box-aware interpretation is derived from
//! world content, never stored.

use crate::entity::RegionKind;
use crate::geometry::{Bounds, Position};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The cell the gesture started on.
    pub anchor: Position,
    /// The live end of the gesture.
    pub head: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Content-contiguous: each row trimmed to its actual glyph extents.
    TextAware,
    /// Every cell in the rectangle, content or not.
    BoxAware,
}

impl Selection {
    pub fn new(anchor: Position) -> Self {
        Self { anchor, head: anchor }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.anchor, self.head)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.bounds().contains(pos)
    }

    /// Text-aware iff the anchor cell has content and the rectangle stays
    /// clear of every label and task.
    pub fn mode(&self, registry: &Registry) -> SelectionMode {
        if !registry.is_occupied(self.anchor) {
            return SelectionMode::BoxAware;
        }
        let rect = self.bounds();
        let mut blocked = false;
        for (_, region) in registry.regions() {
            if matches!(region.kind, RegionKind::Label | RegionKind::Task)
                && region.bounds.intersects(&rect)
            {
                blocked = true;
                break;
            }
        }
        if blocked { SelectionMode::BoxAware } else { SelectionMode::TextAware }
    }

    /// The occupied cells this selection covers under its derived mode.
    pub fn cells(&self, registry: &Registry) -> Vec<Position> {
        let rect = self.bounds();
        let mode = self.mode(registry);
        let mut out = Vec::new();
        for y in rect.start.y..=rect.end.y {
            let (min_x, max_x) = match mode {
                SelectionMode::BoxAware => (rect.start.x, rect.end.x),
                SelectionMode::TextAware => {
                    // Trim the row to its glyph extents inside the rect.
                    let mut lo = None;
                    let mut hi = None;
                    for x in rect.start.x..=rect.end.x {
                        if registry.is_occupied(Position::new(x, y)) {
                            if lo.is_none() {
                                lo = Some(x);
                            }
                            hi = Some(x);
                        }
                    }
                    match (lo, hi) {
                        (Some(lo), Some(hi)) => (lo, hi),
                        _ => continue,
                    }
                }
            };
            for x in min_x..=max_x {
                let pos = Position::new(x, y);
                if registry.is_occupied(pos) {
                    out.push(pos);
                }
            }
        }
        out
    }
}
