//! Entity model for the world grid.
//!
//! Every stored value is either a single character cell or a rectangular
//! region entity. Values live in the world store as JSON and are validated
//! here, at the registry boundary; nothing downstream ever dispatches on
//! key text or raw JSON shape.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{Bounds, Position};

/// Key into the world store. Region keys embed kind, origin and creation
/// time (`note:4,-2:1724800000000`), cell keys embed only the position
/// (`cell:4,-2`) — which is why moving an entity mints a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityKey(pub String);

impl EntityKey {
    pub fn cell(pos: Position) -> Self {
        Self(format!("cell:{},{}", pos.x, pos.y))
    }

    pub fn region(kind: RegionKind, origin: Position, created_ms: i64) -> Self {
        Self(format!("{}:{},{}:{}", kind.as_str(), origin.x, origin.y, created_ms))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The region entity kinds. `Pattern` is derived (bounds recomputed from
/// member notes), everything else is authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Note,
    Image,
    Iframe,
    Mail,
    Pattern,
    Bound,
    Label,
    Task,
    Link,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Note => "note",
            RegionKind::Image => "image",
            RegionKind::Iframe => "iframe",
            RegionKind::Mail => "mail",
            RegionKind::Pattern => "pattern",
            RegionKind::Bound => "bound",
            RegionKind::Label => "label",
            RegionKind::Task => "task",
            RegionKind::Link => "link",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "note" => Some(RegionKind::Note),
            "image" => Some(RegionKind::Image),
            "iframe" => Some(RegionKind::Iframe),
            "mail" => Some(RegionKind::Mail),
            "pattern" => Some(RegionKind::Pattern),
            "bound" => Some(RegionKind::Bound),
            "label" => Some(RegionKind::Label),
            "task" => Some(RegionKind::Task),
            "link" => Some(RegionKind::Link),
            _ => None,
        }
    }

    /// Kinds a long-press may pick up and move.
    pub fn moveable(self) -> bool {
        matches!(
            self,
            RegionKind::Note | RegionKind::Image | RegionKind::Iframe | RegionKind::Mail
        )
    }
}

/// Optional per-cell style reference. Colors are opaque names here; the
/// paint collaborator decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
}

/// One glyph at one world position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntity {
    pub pos: Position,
    pub glyph: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

/// A rectangular region entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntity {
    pub kind: RegionKind,
    pub bounds: Bounds,
    pub created_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Payload: note text, image source, iframe url, label caption, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Weak back-reference from a note to its pattern, by key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<EntityKey>,
    /// Member note keys, patterns only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<EntityKey>,
}

impl RegionEntity {
    pub fn new(kind: RegionKind, bounds: Bounds) -> Self {
        Self {
            kind,
            bounds,
            created_ms: now_ms(),
            style: None,
            content: None,
            pattern: None,
            members: Vec::new(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::region(self.kind, self.bounds.start, self.created_ms)
    }
}

/// Any value the registry hands out. The two layouts have disjoint
/// required fields (`pos`/`glyph` vs `kind`/`bounds`), so untagged
/// deserialization is unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
    Cell(CellEntity),
    Region(RegionEntity),
}

impl Entity {
    /// Parse a stored value. Accepts the canonical layout, and falls back
    /// to the legacy flat layout (`startX`/`endY`/`text` at top level) so
    /// old worlds load; the legacy shape never leaves this function.
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Ok(entity) = serde_json::from_value::<Entity>(value.clone()) {
            if let Entity::Region(region) = &entity {
                if !region.bounds.valid() {
                    // Kept, but queries will treat it as "no match".
                    tracing::debug!(kind = region.kind.as_str(), "loaded degenerate bounds");
                }
            }
            return Ok(entity);
        }
        legacy_region_from_value(value)
            .ok_or_else(|| anyhow!("unrecognized entity value: {value}"))
            .map(Entity::Region)
    }

    pub fn to_value(&self) -> Value {
        // Serialization of these types cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The entity's footprint on the grid.
    pub fn bounds(&self) -> Bounds {
        match self {
            Entity::Cell(cell) => Bounds::cell(cell.pos),
            Entity::Region(region) => region.bounds,
        }
    }

    pub fn as_region(&self) -> Option<&RegionEntity> {
        match self {
            Entity::Region(region) => Some(region),
            Entity::Cell(_) => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellEntity> {
        match self {
            Entity::Cell(cell) => Some(cell),
            Entity::Region(_) => None,
        }
    }
}

/// One-time migration adapter for the legacy flat region layout.
fn legacy_region_from_value(value: &Value) -> Option<RegionEntity> {
    let obj = value.as_object()?;
    let kind = RegionKind::from_tag(obj.get("type")?.as_str()?)?;
    let bounds = Bounds {
        start: Position::new(get_i32(obj, "startX")?, get_i32(obj, "startY")?),
        end: Position::new(get_i32(obj, "endX")?, get_i32(obj, "endY")?),
    };
    let content = obj
        .get("text")
        .or_else(|| obj.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    Some(RegionEntity {
        kind,
        bounds,
        created_ms: obj.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
        style: obj.get("style").and_then(Value::as_str).map(str::to_owned),
        content,
        pattern: obj
            .get("patternKey")
            .and_then(Value::as_str)
            .map(|s| EntityKey(s.to_owned())),
        members: Vec::new(),
    })
}

fn get_i32(obj: &serde_json::Map<String, Value>, key: &str) -> Option<i32> {
    obj.get(key)?.as_i64().map(|n| n as i32)
}

/// Milliseconds since the epoch, for creation timestamps.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cell_round_trips_through_json() {
        let cell = Entity::Cell(CellEntity {
            pos: Position::new(-3, 7),
            glyph: 'Q',
            style: Some(CellStyle { fg: Some("red".into()), bg: None }),
        });
        let back = Entity::from_value(&cell.to_value()).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn region_round_trips_through_json() {
        let mut note = RegionEntity::new(
            RegionKind::Note,
            Bounds::new(Position::new(1, 2), Position::new(5, 6)),
        );
        note.content = Some("hello".into());
        note.pattern = Some(EntityKey("pattern:0,0:1".into()));
        let entity = Entity::Region(note);
        let back = Entity::from_value(&entity.to_value()).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn legacy_flat_layout_is_accepted() {
        let value = json!({
            "type": "note",
            "startX": 2, "startY": 3, "endX": 8, "endY": 5,
            "text": "old world note",
            "timestamp": 1700000000000i64,
            "patternKey": "pattern:0,0:42"
        });
        let entity = Entity::from_value(&value).unwrap();
        let region = entity.as_region().unwrap();
        assert_eq!(region.kind, RegionKind::Note);
        assert_eq!(region.bounds, Bounds::new(Position::new(2, 3), Position::new(8, 5)));
        assert_eq!(region.content.as_deref(), Some("old world note"));
        assert_eq!(region.pattern.as_ref().unwrap().as_str(), "pattern:0,0:42");
    }

    #[test]
    fn garbage_value_is_an_error_not_a_panic() {
        assert!(Entity::from_value(&json!({"kind": "wormhole"})).is_err());
        assert!(Entity::from_value(&json!(42)).is_err());
        assert!(Entity::from_value(&json!("note")).is_err());
    }

    #[test]
    fn region_key_embeds_origin_and_timestamp() {
        let mut region = RegionEntity::new(
            RegionKind::Image,
            Bounds::new(Position::new(-4, 9), Position::new(0, 12)),
        );
        region.created_ms = 123;
        assert_eq!(region.key().as_str(), "image:-4,9:123");
        assert_eq!(EntityKey::cell(Position::new(-4, 9)).as_str(), "cell:-4,9");
    }
}
