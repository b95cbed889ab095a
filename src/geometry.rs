use serde::{Deserialize, Serialize};

/// A world position on the grid (can be negative for infinite canvas feel)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Inclusive rectangular bounds in world cells.
///
/// Stored as authored; `valid()` is checked wherever degenerate bounds
/// must be treated as "no match" instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub start: Position,
    pub end: Position,
}

impl Bounds {
    pub fn new(a: Position, b: Position) -> Self {
        Self {
            start: Position::new(a.x.min(b.x), a.y.min(b.y)),
            end: Position::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn cell(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn valid(&self) -> bool {
        self.start.x <= self.end.x && self.start.y <= self.end.y
    }

    pub fn width(&self) -> i32 {
        self.end.x - self.start.x + 1
    }

    pub fn height(&self) -> i32 {
        self.end.y - self.start.y + 1
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.valid()
            && pos.x >= self.start.x
            && pos.x <= self.end.x
            && pos.y >= self.start.y
            && pos.y <= self.end.y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.valid()
            && other.valid()
            && self.start.x <= other.end.x
            && self.end.x >= other.start.x
            && self.start.y <= other.end.y
            && self.end.y >= other.start.y
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            start: self.start.translated(dx, dy),
            end: self.end.translated(dx, dy),
        }
    }

    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            start: Position::new(self.start.x - margin, self.start.y - margin),
            end: Position::new(self.end.x + margin, self.end.y + margin),
        }
    }

    /// Smallest bounds enclosing both.
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            start: Position::new(self.start.x.min(other.start.x), self.start.y.min(other.start.y)),
            end: Position::new(self.end.x.max(other.end.x), self.end.y.max(other.end.y)),
        }
    }
}

/// Base cell width in surface pixels at zoom 1.0.
pub const BASE_CELL_PX: f32 = 10.0;

/// A content row occupies this many base rows of surface height, to leave
/// room for glyph ascent/descent. Anything converting a pixel row back to
/// a content row must divide by this span.
pub const CELL_ROW_SPAN: f32 = 2.0;

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 8.0;

/// Cell width in pixels for a zoom level. Monotonic, never <= 0 for any
/// clamped zoom.
pub fn cell_width(zoom: f32) -> f32 {
    BASE_CELL_PX * zoom
}

/// Cell height in pixels for a zoom level (carries the glyph row span).
pub fn cell_height(zoom: f32) -> f32 {
    BASE_CELL_PX * CELL_ROW_SPAN * zoom
}

/// The view into the world: zoom plus a fractional world-cell offset.
///
/// The transform itself is pure math and runs inside per-cell paint loops;
/// zoom clamping lives in `zoom_by`, the only place zoom changes.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub zoom: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { zoom: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl Camera {
    /// World cell -> surface pixel position of the cell's top-left corner.
    pub fn world_to_screen(&self, pos: Position) -> (f32, f32) {
        (
            (pos.x as f32 - self.offset_x) * cell_width(self.zoom),
            (pos.y as f32 - self.offset_y) * cell_height(self.zoom),
        )
    }

    /// Surface pixel -> the world cell containing it. Exact inverse of
    /// `world_to_screen` for cell corners, within float tolerance.
    pub fn screen_to_world(&self, px: f32, py: f32) -> Position {
        Position::new(
            (px / cell_width(self.zoom) + self.offset_x).floor() as i32,
            (py / cell_height(self.zoom) + self.offset_y).floor() as i32,
        )
    }

    /// Pan by a pixel delta (positive delta drags content left/up).
    pub fn pan_px(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx / cell_width(self.zoom);
        self.offset_y += dy / cell_height(self.zoom);
    }

    /// Pan by whole cells.
    pub fn pan_cells(&mut self, dx: i32, dy: i32) {
        self.offset_x += dx as f32;
        self.offset_y += dy as f32;
    }

    /// Multiply zoom by `factor`, clamped, keeping the world point under
    /// the pixel anchor fixed on screen.
    pub fn zoom_by(&mut self, factor: f32, anchor_px: f32, anchor_py: f32) {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom == self.zoom {
            return;
        }
        let wx = anchor_px / cell_width(self.zoom) + self.offset_x;
        let wy = anchor_py / cell_height(self.zoom) + self.offset_y;
        self.zoom = new_zoom;
        self.offset_x = wx - anchor_px / cell_width(self.zoom);
        self.offset_y = wy - anchor_py / cell_height(self.zoom);
    }

    /// World bounds covered by a pixel viewport.
    pub fn visible_bounds(&self, width_px: f32, height_px: f32) -> Bounds {
        let top_left = self.screen_to_world(0.0, 0.0);
        let bottom_right = self.screen_to_world(width_px, height_px);
        Bounds::new(top_left, bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bounds_normalize_on_construction() {
        let b = Bounds::new(Position::new(5, 7), Position::new(2, 3));
        assert_eq!(b.start, Position::new(2, 3));
        assert_eq!(b.end, Position::new(5, 7));
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 5);
    }

    #[test]
    fn degenerate_bounds_never_match() {
        let bad = Bounds { start: Position::new(4, 4), end: Position::new(1, 1) };
        assert!(!bad.valid());
        assert!(!bad.contains(Position::new(2, 2)));
        assert!(!bad.intersects(&Bounds::cell(Position::new(2, 2))));
    }

    #[test]
    fn zoom_anchor_stays_fixed() {
        let mut cam = Camera { zoom: 1.0, offset_x: 3.5, offset_y: -2.0 };
        // Anchor off any cell boundary so float error cannot flip the floor.
        let before = cam.screen_to_world(123.0, 87.0);
        cam.zoom_by(1.5, 123.0, 87.0);
        let after = cam.screen_to_world(123.0, 87.0);
        assert_eq!(before, after);
    }

    #[test]
    fn zoom_clamps_at_call_site() {
        let mut cam = Camera::default();
        cam.zoom_by(1e-6, 0.0, 0.0);
        assert_eq!(cam.zoom, MIN_ZOOM);
        cam.zoom_by(1e9, 0.0, 0.0);
        assert_eq!(cam.zoom, MAX_ZOOM);
        assert!(cell_width(cam.zoom) > 0.0);
        assert!(cell_height(cam.zoom) > 0.0);
    }

    #[test]
    fn cell_size_monotonic_in_zoom() {
        let mut prev_w = 0.0;
        let mut prev_h = 0.0;
        for step in 1..=80 {
            let zoom = MIN_ZOOM + (MAX_ZOOM - MIN_ZOOM) * (step as f32 / 80.0);
            assert!(cell_width(zoom) > prev_w);
            assert!(cell_height(zoom) > prev_h);
            prev_w = cell_width(zoom);
            prev_h = cell_height(zoom);
        }
    }

    proptest! {
        #[test]
        fn screen_world_round_trip(
            x in -10_000i32..10_000,
            y in -10_000i32..10_000,
            zoom in 0.1f32..8.0,
            ox in -500.0f32..500.0,
            oy in -500.0f32..500.0,
        ) {
            let cam = Camera { zoom, offset_x: ox, offset_y: oy };
            let pos = Position::new(x, y);
            let (px, py) = cam.world_to_screen(pos);
            // Hit-test at the cell's center to stay clear of the corner
            // rounding boundary.
            let back = cam.screen_to_world(
                px + cell_width(zoom) / 2.0,
                py + cell_height(zoom) / 2.0,
            );
            prop_assert_eq!(back, pos);
        }
    }
}
