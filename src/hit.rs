//! Hit-test resolver: what is under a surface position.
//!
//! Priority when several entities overlap, highest first: resize handle of
//! the currently selected region, image, note/mail/iframe, pattern, text,
//! label/task/link, bound, nothing.

use std::collections::{HashSet, VecDeque};

use crate::entity::{EntityKey, RegionKind};
use crate::geometry::{Bounds, Camera, Position};
use crate::registry::Registry;
use crate::resize::Corner;

/// Pixel radius of the corner-handle hit box.
pub const HANDLE_HIT_PX: f32 = 12.0;

/// A contiguous run of grid text: the maximal 4-connected block of
/// non-space cells, bridging single horizontal gaps between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub cells: Vec<Position>,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    /// A corner handle of the selected region entity.
    Handle { key: EntityKey, corner: Corner },
    Region { key: EntityKey, kind: RegionKind },
    Text(TextBlock),
}

/// Resolve the highest-priority entity at a surface pixel. `selected` is
/// the region whose handles are live, if any.
pub fn hit_test(
    registry: &Registry,
    camera: &Camera,
    selected: Option<&EntityKey>,
    px: f32,
    py: f32,
) -> Option<Hit> {
    if let Some(hit) = handle_at(registry, camera, selected, px, py) {
        return Some(hit);
    }
    let pos = camera.screen_to_world(px, py);
    hit_test_world(registry, pos)
}

/// World-position variant, skipping the handle layer.
pub fn hit_test_world(registry: &Registry, pos: Position) -> Option<Hit> {
    let mut above_text: Option<(u8, i64, &EntityKey, RegionKind)> = None;
    let mut below_text: Option<(u8, i64, &EntityKey, RegionKind)> = None;

    for (key, region) in registry.regions() {
        if !region.bounds.contains(pos) {
            continue;
        }
        let rank = match region.kind {
            RegionKind::Image => 0,
            RegionKind::Note | RegionKind::Mail | RegionKind::Iframe => 1,
            RegionKind::Pattern => 2,
            RegionKind::Label | RegionKind::Task | RegionKind::Link => 4,
            RegionKind::Bound => 5,
        };
        let slot = if rank <= 2 { &mut above_text } else { &mut below_text };
        // Lower rank wins; within a rank the newest entity is topmost.
        let better = match slot {
            Some((r, ms, ..)) => rank < *r || (rank == *r && region.created_ms > *ms),
            None => true,
        };
        if better {
            *slot = Some((rank, region.created_ms, key, region.kind));
        }
    }

    if let Some((_, _, key, kind)) = above_text {
        return Some(Hit::Region { key: key.clone(), kind });
    }
    if let Some(block) = text_block_at(registry, pos) {
        return Some(Hit::Text(block));
    }
    below_text.map(|(_, _, key, kind)| Hit::Region { key: key.clone(), kind })
}

fn handle_at(
    registry: &Registry,
    camera: &Camera,
    selected: Option<&EntityKey>,
    px: f32,
    py: f32,
) -> Option<Hit> {
    let key = selected?;
    let region = registry.get(key)?.as_region()?;
    if !region.bounds.valid() {
        return None;
    }
    for (corner, corner_pos) in Corner::positions(&region.bounds) {
        // Handles sit on the far edge of their corner cell for the
        // right/bottom sides so they track the painted outline.
        let (cx, cy) = camera.world_to_screen(corner_pos);
        if (px - cx).abs() <= HANDLE_HIT_PX && (py - cy).abs() <= HANDLE_HIT_PX {
            return Some(Hit::Handle { key: key.clone(), corner });
        }
    }
    None
}

/// Discover the contiguous text block containing `start`.
///
/// A single horizontally-adjacent space between two non-space cells is
/// bridged, so "word gap word" reads as one block; wider gaps end the
/// block. An empty start cell falls back to its 8 neighbors before giving
/// up.
pub fn text_block_at(registry: &Registry, start: Position) -> Option<TextBlock> {
    let seed = if registry.is_occupied(start) {
        start
    } else {
        neighbor_with_content(registry, start)?
    };

    let mut cells = Vec::new();
    let mut visited: HashSet<Position> = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(p) = queue.pop_front() {
        cells.push(p);
        let sides = [
            Position::new(p.x - 1, p.y),
            Position::new(p.x + 1, p.y),
            Position::new(p.x, p.y - 1),
            Position::new(p.x, p.y + 1),
        ];
        for next in sides {
            if registry.is_occupied(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
        // Bridge a one-cell horizontal gap between runs.
        for dir in [-1, 1] {
            let gap = Position::new(p.x + dir, p.y);
            let far = Position::new(p.x + 2 * dir, p.y);
            if !registry.is_occupied(gap) && registry.is_occupied(far) && visited.insert(far) {
                queue.push_back(far);
            }
        }
    }

    let mut bounds = Bounds::cell(cells[0]);
    for &p in &cells[1..] {
        bounds = bounds.union(&Bounds::cell(p));
    }
    Some(TextBlock { cells, bounds })
}

fn neighbor_with_content(registry: &Registry, pos: Position) -> Option<Position> {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let p = Position::new(pos.x + dx, pos.y + dy);
            if registry.is_occupied(p) {
                return Some(p);
            }
        }
    }
    None
}
