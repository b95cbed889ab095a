//! Application state.
//!
//! `EngineCtx` is the explicit shared state every controller reads and
//! writes through; there are no ambient globals. `App` wraps it with the
//! terminal-facing concerns: modes, key handling, autosave, status line.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::GestureConfig;
use crate::entity::EntityKey;
use crate::gesture::{self, Channel, EngineEvent, GestureEngine, Modifiers, PointerSample};
use crate::geometry::{Camera, Position, BASE_CELL_PX, CELL_ROW_SPAN};
use crate::hit;
use crate::registry::Registry;
use crate::selection::Selection;

/// How long writes may sit unflushed before the frame loop saves them.
const AUTOSAVE_INTERVAL_MS: u64 = 2_000;

/// World state shared by the gesture, resize and move controllers.
pub struct EngineCtx {
    /// The registry - THE source of truth for entity state.
    pub registry: Registry,
    pub camera: Camera,
    /// Live selection rectangle, if any.
    pub selection: Option<Selection>,
    /// Region entity whose corner handles are active, if any.
    pub selected: Option<EntityKey>,
}

impl EngineCtx {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            camera: Camera::default(),
            selection: None,
            selected: None,
        }
    }
}

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing onto the grid; Enter returns to the column typing started in.
    Insert { cursor: Position, line_start: i32 },
}

pub struct App {
    pub ctx: EngineCtx,
    pub engine: GestureEngine,
    pub mode: Mode,
    pub running: bool,
    pub status_message: Option<String>,
    /// Terminal size in cells, refreshed each frame before input handling.
    pub surface: (u16, u16),
    last_save_ms: u64,
}

/// One terminal cell maps to a fixed block of surface pixels; the camera
/// does the rest.
pub fn surface_px(column: u16, row: u16) -> (f32, f32) {
    (
        f32::from(column) * BASE_CELL_PX,
        f32::from(row) * BASE_CELL_PX * CELL_ROW_SPAN,
    )
}

impl App {
    pub fn new(registry: Registry, config: GestureConfig) -> Self {
        Self {
            ctx: EngineCtx::new(registry),
            engine: GestureEngine::new(config),
            mode: Mode::Normal,
            running: true,
            status_message: None,
            surface: (80, 24),
            last_save_ms: 0,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    // Pointer plumbing: terminal mouse events arrive in cells and feed the
    // engine's mouse channel as surface pixels.

    pub fn pointer_down(&mut self, column: u16, row: u16, time_ms: u64, mods: Modifiers) {
        let (px, py) = surface_px(column, row);
        self.engine
            .press(&mut self.ctx, Channel::Mouse, PointerSample { px, py, time_ms }, mods);
    }

    pub fn pointer_moved(&mut self, column: u16, row: u16, time_ms: u64) {
        let (px, py) = surface_px(column, row);
        self.engine.moved(&mut self.ctx, PointerSample { px, py, time_ms });
    }

    pub fn pointer_up(&mut self, column: u16, row: u16, time_ms: u64) {
        let (px, py) = surface_px(column, row);
        self.engine.release(&mut self.ctx, PointerSample { px, py, time_ms });
    }

    /// The pointer left the interactive surface; finalize like a release.
    pub fn pointer_leave(&mut self, time_ms: u64) {
        self.engine.leave(&mut self.ctx, time_ms);
    }

    pub fn scroll_zoom(&mut self, column: u16, row: u16, zoom_in: bool) {
        let (px, py) = surface_px(column, row);
        let factor = if zoom_in { 1.1 } else { 1.0 / 1.1 };
        self.ctx.camera.zoom_by(factor, px, py);
    }

    /// Frame tick: long presses, tap windows, engine events, autosave.
    pub fn tick(&mut self, now_ms: u64) {
        self.engine.tick(&mut self.ctx, now_ms);
        for event in self.engine.drain_events() {
            self.apply_event(event);
        }
        if self.ctx.registry.store_dirty()
            && now_ms.saturating_sub(self.last_save_ms) >= AUTOSAVE_INTERVAL_MS
        {
            self.save();
            self.last_save_ms = now_ms;
        }
    }

    fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Tapped { pos } => {
                if let Some(key) = gesture::select_at(&mut self.ctx, pos) {
                    self.mode = Mode::Normal;
                    self.set_status(format!("Selected {key}"));
                } else {
                    self.mode = Mode::Insert { cursor: pos, line_start: pos.x };
                    self.set_status(format!("Typing at {},{}", pos.x, pos.y));
                }
            }
            EngineEvent::DoubleTapped { pos } => {
                if let Some(block) = hit::text_block_at(&self.ctx.registry, pos) {
                    self.ctx.selection = Some(Selection {
                        anchor: block.bounds.start,
                        head: block.bounds.end,
                    });
                    self.set_status(format!("Selected {} cells", block.cells.len()));
                }
            }
            EngineEvent::Cancelled => {
                self.mode = Mode::Normal;
                self.ctx.selected = None;
                self.set_status("Cancelled");
            }
            EngineEvent::Haptic => {
                self.set_status("Moving");
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match self.mode {
            Mode::Insert { cursor, line_start } => self.on_insert_key(key, cursor, line_start),
            Mode::Normal => self.on_normal_key(key),
        }
    }

    fn on_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.save();
            }
            KeyCode::Esc => self.cancel(),
            KeyCode::Left => self.ctx.camera.pan_cells(-2, 0),
            KeyCode::Right => self.ctx.camera.pan_cells(2, 0),
            KeyCode::Up => self.ctx.camera.pan_cells(0, -1),
            KeyCode::Down => self.ctx.camera.pan_cells(0, 1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom_centered(1.25),
            KeyCode::Char('-') => self.zoom_centered(1.0 / 1.25),
            _ => {}
        }
    }

    fn on_insert_key(&mut self, key: KeyEvent, mut cursor: Position, line_start: i32) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                return;
            }
            KeyCode::Enter => {
                cursor = Position::new(line_start, cursor.y + 1);
            }
            KeyCode::Backspace => {
                cursor.x -= 1;
                self.ctx.registry.clear_glyph(cursor);
            }
            KeyCode::Left => cursor.x -= 1,
            KeyCode::Right => cursor.x += 1,
            KeyCode::Up => cursor.y -= 1,
            KeyCode::Down => cursor.y += 1,
            KeyCode::Char(c) => {
                self.ctx.registry.set_glyph(cursor, c, None);
                cursor.x += 1;
            }
            _ => {}
        }
        self.mode = Mode::Insert { cursor, line_start };
    }

    /// The abstract escape signal: force-terminates the active gesture
    /// session and drops local UI state.
    pub fn cancel(&mut self) {
        self.engine.cancel(&mut self.ctx);
        for event in self.engine.drain_events() {
            self.apply_event(event);
        }
    }

    fn zoom_centered(&mut self, factor: f32) {
        let (cx, cy) = surface_px(self.surface.0 / 2, self.surface.1 / 2);
        self.ctx.camera.zoom_by(factor, cx, cy);
    }

    pub fn save(&mut self) {
        match self.ctx.registry.flush() {
            Ok(()) => self.set_status("Saved"),
            Err(err) => {
                tracing::warn!(%err, "world save failed");
                self.set_status(format!("Save failed: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn app() -> App {
        App::new(
            Registry::new(Box::new(MemoryStore::new())),
            GestureConfig::default(),
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_writes_cells_and_advances() {
        let mut app = app();
        app.mode = Mode::Insert { cursor: Position::new(0, 0), line_start: 0 };
        app.on_key(press(KeyCode::Char('h')));
        app.on_key(press(KeyCode::Char('i')));
        assert_eq!(app.ctx.registry.glyph_at(Position::new(0, 0)), Some('h'));
        assert_eq!(app.ctx.registry.glyph_at(Position::new(1, 0)), Some('i'));
        app.on_key(press(KeyCode::Backspace));
        assert_eq!(app.ctx.registry.glyph_at(Position::new(1, 0)), None);
    }

    #[test]
    fn enter_returns_to_the_starting_column() {
        let mut app = app();
        app.mode = Mode::Insert { cursor: Position::new(4, 0), line_start: 4 };
        app.on_key(press(KeyCode::Char('x')));
        app.on_key(press(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Insert { cursor: Position::new(4, 1), line_start: 4 });
    }

    #[test]
    fn q_quits_only_in_normal_mode() {
        let mut app = app();
        app.mode = Mode::Insert { cursor: Position::new(0, 0), line_start: 0 };
        app.on_key(press(KeyCode::Char('q')));
        assert!(app.running);
        app.on_key(press(KeyCode::Esc));
        app.on_key(press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn arrow_keys_pan_the_camera() {
        let mut app = app();
        app.on_key(press(KeyCode::Right));
        app.on_key(press(KeyCode::Down));
        assert_eq!(app.ctx.camera.offset_x, 2.0);
        assert_eq!(app.ctx.camera.offset_y, 1.0);
    }

    #[test]
    fn zoom_keys_clamp_at_the_limits() {
        let mut app = app();
        for _ in 0..100 {
            app.on_key(press(KeyCode::Char('+')));
        }
        assert_eq!(app.ctx.camera.zoom, crate::geometry::MAX_ZOOM);
        for _ in 0..100 {
            app.on_key(press(KeyCode::Char('-')));
        }
        assert_eq!(app.ctx.camera.zoom, crate::geometry::MIN_ZOOM);
    }

    #[test]
    fn tap_on_empty_canvas_enters_insert_mode() {
        let mut app = app();
        app.pointer_down(3, 2, 0, Modifiers::default());
        app.pointer_up(3, 2, 50);
        app.tick(1_000);
        assert_eq!(app.mode, Mode::Insert { cursor: Position::new(3, 2), line_start: 3 });
    }
}
