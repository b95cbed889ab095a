//! Corner-resize controller.
//!
//! Each move sample computes fresh bounds from the session's original
//! snapshot and writes them through the registry (optimistic, continuous);
//! release finalizes, cancel restores the snapshot.

use crate::entity::{Entity, EntityKey};
use crate::geometry::{Bounds, Position};
use crate::pattern;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn positions(bounds: &Bounds) -> [(Corner, Position); 4] {
        [
            (Corner::TopLeft, bounds.start),
            (Corner::TopRight, Position::new(bounds.end.x, bounds.start.y)),
            (Corner::BottomLeft, Position::new(bounds.start.x, bounds.end.y)),
            (Corner::BottomRight, bounds.end),
        ]
    }
}

/// New bounds from dragging `corner` of `original` to `pos`.
///
/// Only the two edges adjacent to the corner move; the opposite edges are
/// pinned, and the moving edges are clamped so the region keeps at least
/// one cell of extent on each axis and never inverts.
pub fn resize_bounds(original: Bounds, corner: Corner, pos: Position) -> Bounds {
    let Bounds { start, end } = original;
    match corner {
        Corner::TopLeft => Bounds {
            start: Position::new(pos.x.min(end.x - 1), pos.y.min(end.y - 1)),
            end,
        },
        Corner::TopRight => Bounds {
            start: Position::new(start.x, pos.y.min(end.y - 1)),
            end: Position::new(pos.x.max(start.x + 1), end.y),
        },
        Corner::BottomLeft => Bounds {
            start: Position::new(pos.x.min(end.x - 1), start.y),
            end: Position::new(end.x, pos.y.max(start.y + 1)),
        },
        Corner::BottomRight => Bounds {
            start,
            end: Position::new(pos.x.max(start.x + 1), pos.y.max(start.y + 1)),
        },
    }
}

/// One in-flight resize. The original bounds are immutable for the
/// session's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub key: EntityKey,
    pub corner: Corner,
    pub original: Bounds,
    pub live: Bounds,
}

impl ResizeSession {
    pub fn start(registry: &Registry, key: EntityKey, corner: Corner) -> Option<Self> {
        let bounds = registry.get(&key)?.as_region()?.bounds;
        Some(Self { key, corner, original: bounds, live: bounds })
    }

    /// Apply one move sample. A missing target key (deleted mid-session by
    /// an external actor) ends the session silently.
    pub fn update(&mut self, registry: &mut Registry, pos: Position) -> bool {
        let new_bounds = resize_bounds(self.original, self.corner, pos);
        if new_bounds == self.live {
            return true;
        }
        if !write_bounds(registry, &self.key, new_bounds) {
            tracing::debug!(key = %self.key, "resize target vanished, ending session");
            return false;
        }
        self.live = new_bounds;
        true
    }

    /// Release: the live bounds stand.
    pub fn finish(self, _registry: &mut Registry) {}

    /// Escape/cancel: restore the snapshot so no partial resize remains.
    pub fn cancel(self, registry: &mut Registry) {
        write_bounds(registry, &self.key, self.original);
    }
}

fn write_bounds(registry: &mut Registry, key: &EntityKey, bounds: Bounds) -> bool {
    let Some(region) = registry.get(key).and_then(Entity::as_region) else {
        return false;
    };
    let mut updated = region.clone();
    updated.bounds = bounds;
    let pattern_key = updated.pattern.clone();
    registry.set(key.clone(), Entity::Region(updated));
    // A note inside a pattern drags the pattern's enclosure with it.
    if let Some(pattern_key) = pattern_key {
        pattern::recompute_bounds(registry, &pattern_key);
    }
    true
}
