//! Pattern maintenance.
//!
//! A pattern never owns its bounds: they are recomputed as the tight
//! enclosure of its member notes plus the corridor padding whenever a
//! member moves, resizes, joins or leaves. A pattern with no members is
//! deleted.

use crate::entity::{Entity, EntityKey, RegionEntity, RegionKind};
use crate::geometry::Bounds;
use crate::registry::Registry;

/// Corridor cells added around the member enclosure.
pub const PATTERN_PADDING: i32 = 2;

/// Recompute a pattern's bounds from its current members. Idempotent and
/// order-independent; dangling member keys are skipped, and a dangling
/// `pattern_key` (the pattern itself missing) is a no-op.
pub fn recompute_bounds(registry: &mut Registry, pattern_key: &EntityKey) {
    let Some(pattern) = registry.get(pattern_key).and_then(Entity::as_region) else {
        return;
    };
    if pattern.kind != RegionKind::Pattern {
        return;
    }

    let mut enclosure: Option<Bounds> = None;
    let mut live_members = Vec::with_capacity(pattern.members.len());
    for member_key in &pattern.members {
        let Some(member) = registry.get(member_key).and_then(Entity::as_region) else {
            tracing::debug!(member = %member_key, "dropping dangling pattern member");
            continue;
        };
        if !member.bounds.valid() {
            continue;
        }
        live_members.push(member_key.clone());
        enclosure = Some(match enclosure {
            Some(b) => b.union(&member.bounds),
            None => member.bounds,
        });
    }

    match enclosure {
        Some(bounds) => {
            let mut updated = pattern.clone();
            updated.bounds = bounds.expanded(PATTERN_PADDING);
            updated.members = live_members;
            registry.set(pattern_key.clone(), Entity::Region(updated));
        }
        None => {
            registry.delete(pattern_key);
        }
    }
}

/// Replace a member key after a move minted a new identity, then refit.
pub fn rekey_member(
    registry: &mut Registry,
    pattern_key: &EntityKey,
    old_key: &EntityKey,
    new_key: EntityKey,
) {
    if let Some(pattern) = registry.get(pattern_key).and_then(Entity::as_region) {
        let mut updated = pattern.clone();
        for member in &mut updated.members {
            if member == old_key {
                *member = new_key.clone();
            }
        }
        registry.set(pattern_key.clone(), Entity::Region(updated));
    }
    recompute_bounds(registry, pattern_key);
}

/// Add a note to a pattern (sets the back-reference) and refit.
pub fn add_member(registry: &mut Registry, pattern_key: &EntityKey, note_key: &EntityKey) {
    let Some(pattern) = registry.get(pattern_key).and_then(Entity::as_region) else {
        return;
    };
    let mut updated = pattern.clone();
    if !updated.members.contains(note_key) {
        updated.members.push(note_key.clone());
    }
    registry.set(pattern_key.clone(), Entity::Region(updated));

    if let Some(note) = registry.get(note_key).and_then(Entity::as_region) {
        let mut note = note.clone();
        note.pattern = Some(pattern_key.clone());
        registry.set(note_key.clone(), Entity::Region(note));
    }
    recompute_bounds(registry, pattern_key);
}

/// Remove a note from its pattern and refit (which deletes an emptied
/// pattern).
pub fn remove_member(registry: &mut Registry, pattern_key: &EntityKey, note_key: &EntityKey) {
    if let Some(pattern) = registry.get(pattern_key).and_then(Entity::as_region) {
        let mut updated = pattern.clone();
        updated.members.retain(|m| m != note_key);
        registry.set(pattern_key.clone(), Entity::Region(updated));
    }
    recompute_bounds(registry, pattern_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::store::MemoryStore;

    fn b(x0: i32, y0: i32, x1: i32, y1: i32) -> Bounds {
        Bounds::new(Position::new(x0, y0), Position::new(x1, y1))
    }

    fn setup() -> (Registry, EntityKey, EntityKey, EntityKey) {
        let mut reg = Registry::new(Box::new(MemoryStore::new()));

        let mut note_a = RegionEntity::new(RegionKind::Note, b(0, 0, 2, 2));
        note_a.created_ms = 1;
        let mut note_b = RegionEntity::new(RegionKind::Note, b(10, 10, 12, 12));
        note_b.created_ms = 2;
        let key_a = note_a.key();
        let key_b = note_b.key();

        let mut pattern = RegionEntity::new(RegionKind::Pattern, b(0, 0, 0, 0));
        pattern.created_ms = 3;
        pattern.members = vec![key_a.clone(), key_b.clone()];
        let pattern_key = pattern.key();

        note_a.pattern = Some(pattern_key.clone());
        note_b.pattern = Some(pattern_key.clone());

        reg.set(key_a.clone(), Entity::Region(note_a));
        reg.set(key_b.clone(), Entity::Region(note_b));
        reg.set(pattern_key.clone(), Entity::Region(pattern));
        (reg, pattern_key, key_a, key_b)
    }

    #[test]
    fn enclosure_is_tight_plus_padding() {
        let (mut reg, pattern_key, ..) = setup();
        recompute_bounds(&mut reg, &pattern_key);
        let bounds = reg.get(&pattern_key).unwrap().bounds();
        assert_eq!(bounds, b(-PATTERN_PADDING, -PATTERN_PADDING, 12 + PATTERN_PADDING, 12 + PATTERN_PADDING));
    }

    #[test]
    fn recompute_is_idempotent() {
        let (mut reg, pattern_key, ..) = setup();
        recompute_bounds(&mut reg, &pattern_key);
        let once = reg.get(&pattern_key).unwrap().bounds();
        recompute_bounds(&mut reg, &pattern_key);
        recompute_bounds(&mut reg, &pattern_key);
        assert_eq!(reg.get(&pattern_key).unwrap().bounds(), once);
    }

    #[test]
    fn shrinks_when_a_member_is_deleted() {
        let (mut reg, pattern_key, _key_a, key_b) = setup();
        recompute_bounds(&mut reg, &pattern_key);
        reg.delete(&key_b);
        recompute_bounds(&mut reg, &pattern_key);
        let bounds = reg.get(&pattern_key).unwrap().bounds();
        assert_eq!(bounds, b(-PATTERN_PADDING, -PATTERN_PADDING, 2 + PATTERN_PADDING, 2 + PATTERN_PADDING));
    }

    #[test]
    fn empty_pattern_is_deleted() {
        let (mut reg, pattern_key, key_a, key_b) = setup();
        reg.delete(&key_a);
        reg.delete(&key_b);
        recompute_bounds(&mut reg, &pattern_key);
        assert!(reg.get(&pattern_key).is_none());
    }

    #[test]
    fn dangling_pattern_reference_is_harmless() {
        let mut reg = Registry::new(Box::new(MemoryStore::new()));
        recompute_bounds(&mut reg, &EntityKey("pattern:0,0:99".into()));
        assert!(reg.is_empty());
    }

    #[test]
    fn rekey_swaps_and_refits() {
        let (mut reg, pattern_key, key_a, _key_b) = setup();
        // Pretend note A moved: new entity at translated bounds, new key.
        let mut moved = reg.get(&key_a).unwrap().as_region().unwrap().clone();
        moved.bounds = moved.bounds.translated(20, 0);
        moved.created_ms = 50;
        let new_key = moved.key();
        reg.delete(&key_a);
        reg.set(new_key.clone(), Entity::Region(moved));

        rekey_member(&mut reg, &pattern_key, &key_a, new_key.clone());
        let pattern = reg.get(&pattern_key).unwrap().as_region().unwrap();
        assert!(pattern.members.contains(&new_key));
        assert!(!pattern.members.contains(&key_a));
        assert_eq!(
            pattern.bounds,
            b(10 - PATTERN_PADDING, 0 - PATTERN_PADDING, 22 + PATTERN_PADDING, 12 + PATTERN_PADDING)
        );
    }
}
