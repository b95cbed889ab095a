//! Move controller.
//!
//! A grab is taken at gesture start and dragged by whole-cell deltas.
//! Region moves are delete-and-recreate, so the moved entity gets a new
//! key; cell moves snapshot every source first, then delete, then write,
//! so a move onto overlapping cells never eats its own content.

use crate::entity::{CellEntity, Entity, EntityKey, RegionEntity};
use crate::geometry::Position;
use crate::pattern;
use crate::registry::Registry;

/// What a long press picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grab {
    /// A whole region entity, by key.
    Region(EntityKey),
    /// The cells of a rectangular selection.
    Selection(Vec<Position>),
    /// The cells of a contiguous text block.
    TextBlock(Vec<Position>),
}

impl Grab {
    /// Apply a whole-cell delta, returning the grab to keep dragging with.
    /// Region grabs come back re-keyed; cell grabs come back translated.
    /// A grab whose target has vanished comes back as `None`.
    pub fn shifted(self, registry: &mut Registry, dx: i32, dy: i32) -> Option<Grab> {
        if dx == 0 && dy == 0 {
            return Some(self);
        }
        match self {
            Grab::Region(key) => move_region(registry, &key, dx, dy).map(Grab::Region),
            Grab::Selection(cells) => Some(Grab::Selection(move_cells(registry, &cells, dx, dy))),
            Grab::TextBlock(cells) => Some(Grab::TextBlock(move_cells(registry, &cells, dx, dy))),
        }
    }
}

/// Delete-and-recreate a region at a translated position. The creation
/// timestamp is preserved so stacking order survives the move; the key
/// still changes because it embeds the origin.
pub fn move_region(
    registry: &mut Registry,
    key: &EntityKey,
    dx: i32,
    dy: i32,
) -> Option<EntityKey> {
    if dx == 0 && dy == 0 {
        return registry.contains(key).then(|| key.clone());
    }
    let region = registry.get(key).and_then(Entity::as_region)?.clone();
    let moved = RegionEntity {
        bounds: region.bounds.translated(dx, dy),
        ..region.clone()
    };
    let new_key = moved.key();
    registry.delete(key);
    registry.set(new_key.clone(), Entity::Region(moved));
    if let Some(pattern_key) = &region.pattern {
        pattern::rekey_member(registry, pattern_key, key, new_key.clone());
    }
    Some(new_key)
}

/// Move the occupied cells among `cells` by a whole-cell delta, glyph and
/// style intact. Returns the translated positions.
pub fn move_cells(
    registry: &mut Registry,
    cells: &[Position],
    dx: i32,
    dy: i32,
) -> Vec<Position> {
    if dx == 0 && dy == 0 {
        return cells.to_vec();
    }
    let snapshot: Vec<CellEntity> = cells
        .iter()
        .filter_map(|&pos| registry.cell_at(pos).cloned())
        .collect();
    for cell in &snapshot {
        registry.clear_glyph(cell.pos);
    }
    for cell in &snapshot {
        let pos = cell.pos.translated(dx, dy);
        registry.set(
            EntityKey::cell(pos),
            Entity::Cell(CellEntity { pos, ..cell.clone() }),
        );
    }
    cells.iter().map(|pos| pos.translated(dx, dy)).collect()
}
