//! Viewport query over the registry.
//!
//! A naive scan over the parse cache; entity counts stay in the low
//! thousands, and the contract (rectangle in, key set out) is the same
//! one a grid-bucketed index would implement.

use crate::entity::{Entity, EntityKey};
use crate::geometry::Bounds;
use crate::registry::Registry;

/// Cells of slack added around the query window so entities don't pop in
/// at the viewport edge.
pub const QUERY_MARGIN: i32 = 5;

impl Registry {
    /// Keys of all entities intersecting `window` (expanded by the
    /// margin). Regions use bounds overlap, cells use membership.
    /// Degenerate bounds never match.
    pub fn visible_in(&self, window: Bounds) -> Vec<EntityKey> {
        let query = window.expanded(QUERY_MARGIN);
        if !query.valid() {
            return Vec::new();
        }
        let mut keys = Vec::new();
        for (key, entity) in self.entries() {
            let hit = match entity {
                Entity::Cell(cell) => query.contains(cell.pos),
                Entity::Region(region) => region.bounds.intersects(&query),
            };
            if hit {
                keys.push(key.clone());
            }
        }
        keys
    }
}
