//! Entity registry: the sole owner of entity state.
//!
//! Wraps a world store and keeps a parse-once cache of validated entities,
//! invalidated on write. Controllers read entities, compute replacements,
//! and write whole values back; there is no partial in-place patching
//! across this boundary.

use std::collections::HashMap;

use crate::entity::{CellEntity, Entity, EntityKey, RegionEntity, RegionKind};
use crate::geometry::Position;
use crate::store::WorldStore;

pub struct Registry {
    store: Box<dyn WorldStore>,
    cache: HashMap<EntityKey, Entity>,
    /// Position -> cell key, kept in lockstep with the cache so glyph
    /// lookups inside flood fills stay O(1).
    cells_by_pos: HashMap<Position, EntityKey>,
}

impl Registry {
    pub fn new(store: Box<dyn WorldStore>) -> Self {
        let mut registry = Self {
            store,
            cache: HashMap::new(),
            cells_by_pos: HashMap::new(),
        };
        registry.reload();
        registry
    }

    /// Rebuild the cache from the store. A value that fails to parse is
    /// skipped and logged; it never aborts the rest of the iteration.
    pub fn reload(&mut self) {
        self.cache.clear();
        self.cells_by_pos.clear();
        for key in self.store.keys() {
            let Some(value) = self.store.get(&key) else {
                continue;
            };
            match Entity::from_value(&value) {
                Ok(entity) => {
                    if let Entity::Cell(cell) = &entity {
                        self.cells_by_pos.insert(cell.pos, key.clone());
                    }
                    self.cache.insert(key, entity);
                }
                Err(err) => {
                    tracing::warn!(key = %key, %err, "skipping malformed entity");
                }
            }
        }
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.cache.get(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Whole-value replacement. Keeps the store and cache in lockstep.
    pub fn set(&mut self, key: EntityKey, entity: Entity) {
        self.store.set(key.clone(), entity.to_value());
        if let Some(Entity::Cell(old)) = self.cache.get(&key) {
            self.cells_by_pos.remove(&old.pos);
        }
        if let Entity::Cell(cell) = &entity {
            self.cells_by_pos.insert(cell.pos, key.clone());
        }
        self.cache.insert(key, entity);
    }

    pub fn delete(&mut self, key: &EntityKey) -> bool {
        if let Some(Entity::Cell(cell)) = self.cache.get(key) {
            self.cells_by_pos.remove(&cell.pos);
        }
        self.cache.remove(key);
        self.store.delete(key)
    }

    pub fn for_each_of_kind<F>(&self, kind: RegionKind, mut f: F)
    where
        F: FnMut(&EntityKey, &RegionEntity),
    {
        for (key, entity) in &self.cache {
            if let Entity::Region(region) = entity {
                if region.kind == kind {
                    f(key, region);
                }
            }
        }
    }

    /// All validated entries.
    pub fn entries(&self) -> impl Iterator<Item = (&EntityKey, &Entity)> {
        self.cache.iter()
    }

    pub fn regions(&self) -> impl Iterator<Item = (&EntityKey, &RegionEntity)> {
        self.cache.iter().filter_map(|(key, entity)| match entity {
            Entity::Region(region) => Some((key, region)),
            Entity::Cell(_) => None,
        })
    }

    pub fn cell_at(&self, pos: Position) -> Option<&CellEntity> {
        let key = self.cells_by_pos.get(&pos)?;
        self.cache.get(key).and_then(Entity::as_cell)
    }

    /// Non-space glyph at a position, if any.
    pub fn glyph_at(&self, pos: Position) -> Option<char> {
        self.cell_at(pos).map(|cell| cell.glyph).filter(|&g| g != ' ')
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.glyph_at(pos).is_some()
    }

    /// Write a glyph as a cell entity; a space clears the cell, the same
    /// convention the sparse grid has always had.
    pub fn set_glyph(&mut self, pos: Position, glyph: char, style: Option<crate::entity::CellStyle>) {
        let key = EntityKey::cell(pos);
        if glyph == ' ' {
            self.delete(&key);
        } else {
            self.set(key, Entity::Cell(CellEntity { pos, glyph, style }));
        }
    }

    pub fn clear_glyph(&mut self, pos: Position) {
        self.delete(&EntityKey::cell(pos));
    }

    /// Persist the backing store, when it persists at all.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.store.flush()
    }

    pub fn store_dirty(&self) -> bool {
        self.store.dirty()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn empty_registry() -> Registry {
        Registry::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn set_get_delete_round_trip() {
        let mut reg = empty_registry();
        let note = RegionEntity::new(
            RegionKind::Note,
            Bounds::new(Position::new(0, 0), Position::new(3, 2)),
        );
        let key = note.key();
        reg.set(key.clone(), Entity::Region(note.clone()));
        assert_eq!(reg.get(&key).unwrap().as_region().unwrap(), &note);
        assert!(reg.delete(&key));
        assert!(reg.get(&key).is_none());
    }

    #[test]
    fn malformed_value_is_skipped_not_fatal() {
        let mut store = MemoryStore::new();
        store.set(EntityKey("note:0,0:1".into()), json!({"kind": "note", "bounds": "oops"}));
        store.set(
            EntityKey("cell:5,5".into()),
            json!({"pos": {"x": 5, "y": 5}, "glyph": "z"}),
        );
        let reg = Registry::new(Box::new(store));
        // The broken note vanished, the good cell survived.
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.glyph_at(Position::new(5, 5)), Some('z'));
    }

    #[test]
    fn glyph_write_space_clears() {
        let mut reg = empty_registry();
        let pos = Position::new(2, 2);
        reg.set_glyph(pos, 'a', None);
        assert!(reg.is_occupied(pos));
        reg.set_glyph(pos, ' ', None);
        assert!(!reg.is_occupied(pos));
        assert!(reg.is_empty());
    }

    #[test]
    fn for_each_of_kind_filters() {
        let mut reg = empty_registry();
        let mut note = RegionEntity::new(RegionKind::Note, Bounds::cell(Position::new(0, 0)));
        note.created_ms = 1;
        let mut label = RegionEntity::new(RegionKind::Label, Bounds::cell(Position::new(9, 9)));
        label.created_ms = 2;
        reg.set(note.key(), Entity::Region(note));
        reg.set(label.key(), Entity::Region(label));

        let mut seen = Vec::new();
        reg.for_each_of_kind(RegionKind::Note, |key, _| seen.push(key.clone()));
        assert_eq!(seen, vec![EntityKey("note:0,0:1".into())]);
    }
}
