//! Gesture session manager.
//!
//! One finite-state machine classifies raw pointer samples from either
//! input channel into pan, pinch-zoom, selection, corner resize, or move
//! sessions. Resolution order when interpretations compete: long press,
//! then two-finger, then resize handle, then modifier move, then plain
//! pan/select, then tap counting. Exactly one session is active at a time.
//!
//! Timing is sample-driven: every sample carries a millisecond timestamp
//! and the app loop calls [`GestureEngine::tick`] once per frame, so long
//! presses and tap windows fire without wall-clock reads in here. Tap
//! resolution is deferred until the multi-tap window lapses, which is what
//! lets a third tap cancel instead of the first two firing as a double.

use std::mem;

use crate::app::EngineCtx;
use crate::config::GestureConfig;
use crate::entity::EntityKey;
use crate::geometry::Position;
use crate::hit::{self, Hit};
use crate::mover::Grab;
use crate::resize::ResizeSession;
use crate::selection::Selection;

/// Which input surface a sample came from. The classification rules that
/// differ between surfaces (drag default, tap counting, long press) key
/// off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Mouse,
    Touch,
}

/// One raw pointer sample in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub px: f32,
    pub py: f32,
    pub time_ms: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// The "move what's under me" modifier (Shift on the keyboard surface).
    pub move_held: bool,
}

/// Notifications for the app layer. The engine mutates world state
/// directly; these cover the effects only the app can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A single tap resolved (its multi-tap window lapsed).
    Tapped { pos: Position },
    /// A double tap resolved: enter selection mode or dismiss an overlay.
    DoubleTapped { pos: Position },
    /// The active session was force-terminated (Escape or triple tap).
    Cancelled,
    /// A long press was acknowledged; the platform may buzz.
    Haptic,
}

#[derive(Debug, Default)]
enum Session {
    #[default]
    Idle,
    /// Down, not yet classified: may become a tap, long-press move, drag
    /// pan, or drag selection.
    Pressed {
        channel: Channel,
        start: PointerSample,
        /// Furthest the pointer has strayed from the press point.
        dist_max: f32,
        /// What a long press here would pick up, captured at press time.
        grab: Option<Grab>,
        /// A drag should select rather than pan (mouse always, touch after
        /// a double-tap lead-in).
        select_intent: bool,
    },
    Panning {
        last_px: f32,
        last_py: f32,
    },
    Selecting,
    Resizing(ResizeSession),
    /// Modifier move: displacement applies once, on release.
    MovePending {
        grab: Grab,
        start_world: Position,
        last_world: Position,
    },
    /// Long-press move: displacement applies live, whole cells at a time.
    Moving {
        grab: Grab,
        last_world: Position,
        applied: (i32, i32),
    },
    Pinch {
        a: (f32, f32),
        b: (f32, f32),
    },
}

#[derive(Debug, Default)]
struct TapTracker {
    count: u8,
    time_ms: u64,
    px: f32,
    py: f32,
    pos: Position,
}

pub struct GestureEngine {
    config: GestureConfig,
    state: Session,
    taps: TapTracker,
    /// Last sample seen, so a surface-leave can finalize like a release.
    last_sample: Option<PointerSample>,
    events: Vec<EngineEvent>,
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: Session::Idle,
            taps: TapTracker::default(),
            last_sample: None,
            events: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, Session::Idle)
    }

    /// Events produced since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    pub fn press(&mut self, ctx: &mut EngineCtx, channel: Channel, sample: PointerSample, mods: Modifiers) {
        if !matches!(self.state, Session::Idle) {
            return;
        }
        self.last_sample = Some(sample);
        let world = ctx.camera.screen_to_world(sample.px, sample.py);
        let hit = hit::hit_test(&ctx.registry, &ctx.camera, ctx.selected.as_ref(), sample.px, sample.py);

        if let Some(Hit::Handle { key, corner }) = &hit {
            if let Some(session) = ResizeSession::start(&ctx.registry, key.clone(), *corner) {
                self.taps = TapTracker::default();
                self.state = Session::Resizing(session);
                return;
            }
        }
        if mods.move_held {
            if let Some(grab) = grab_at(ctx, world, hit.as_ref(), true) {
                self.taps = TapTracker::default();
                self.state = Session::MovePending {
                    grab,
                    start_world: world,
                    last_world: world,
                };
                return;
            }
        }
        // Long presses only exist on the touch surface.
        let grab = if channel == Channel::Touch {
            grab_at(ctx, world, hit.as_ref(), false)
        } else {
            None
        };
        let select_intent = match channel {
            Channel::Mouse => true,
            Channel::Touch => self.tap_continues(&sample),
        };
        self.state = Session::Pressed {
            channel,
            start: sample,
            dist_max: 0.0,
            grab,
            select_intent,
        };
    }

    pub fn moved(&mut self, ctx: &mut EngineCtx, sample: PointerSample) {
        self.last_sample = Some(sample);
        let state = mem::take(&mut self.state);
        self.state = match state {
            Session::Pressed {
                channel,
                start,
                dist_max,
                grab,
                select_intent,
            } => {
                let dist_max = dist_max.max(dist_px(start.px, start.py, sample.px, sample.py));
                if dist_max <= self.config.long_press_slop_px {
                    Session::Pressed { channel, start, dist_max, grab, select_intent }
                } else {
                    // The drag broke the tap and long-press candidates.
                    self.taps = TapTracker::default();
                    if select_intent {
                        let anchor = ctx.camera.screen_to_world(start.px, start.py);
                        ctx.selection = Some(Selection::new(anchor));
                        self.state = Session::Selecting;
                        self.moved(ctx, sample);
                        return;
                    }
                    self.state = Session::Panning { last_px: start.px, last_py: start.py };
                    self.moved(ctx, sample);
                    return;
                }
            }
            Session::Panning { last_px, last_py } => {
                ctx.camera.pan_px(-(sample.px - last_px), -(sample.py - last_py));
                Session::Panning { last_px: sample.px, last_py: sample.py }
            }
            Session::Selecting => {
                let head = ctx.camera.screen_to_world(sample.px, sample.py);
                if let Some(sel) = &mut ctx.selection {
                    sel.head = head;
                }
                Session::Selecting
            }
            Session::Resizing(mut session) => {
                let pos = ctx.camera.screen_to_world(sample.px, sample.py);
                if session.update(&mut ctx.registry, pos) {
                    Session::Resizing(session)
                } else {
                    Session::Idle
                }
            }
            Session::MovePending { grab, start_world, .. } => {
                let last_world = ctx.camera.screen_to_world(sample.px, sample.py);
                Session::MovePending { grab, start_world, last_world }
            }
            Session::Moving { grab, last_world, applied } => {
                let pos = ctx.camera.screen_to_world(sample.px, sample.py);
                let (dx, dy) = (pos.x - last_world.x, pos.y - last_world.y);
                match grab.shifted(&mut ctx.registry, dx, dy) {
                    Some(grab) => Session::Moving {
                        grab,
                        last_world: pos,
                        applied: (applied.0 + dx, applied.1 + dy),
                    },
                    None => Session::Idle,
                }
            }
            other @ (Session::Idle | Session::Pinch { .. }) => other,
        };
    }

    pub fn release(&mut self, ctx: &mut EngineCtx, sample: PointerSample) {
        self.last_sample = None;
        match mem::take(&mut self.state) {
            Session::Pressed { start, .. } => {
                if sample.time_ms.saturating_sub(start.time_ms) <= self.config.tap_max_ms {
                    self.register_tap(ctx, sample);
                }
            }
            Session::Resizing(session) => session.finish(&mut ctx.registry),
            Session::MovePending { grab, start_world, .. } => {
                let end = ctx.camera.screen_to_world(sample.px, sample.py);
                let _ = grab.shifted(&mut ctx.registry, end.x - start_world.x, end.y - start_world.y);
            }
            // Pan, selection and live move already committed their effect.
            Session::Panning { .. }
            | Session::Selecting
            | Session::Moving { .. }
            | Session::Pinch { .. }
            | Session::Idle => {}
        }
    }

    /// Pointer left the interactive surface: finalize exactly as a release
    /// at the last seen position would.
    pub fn leave(&mut self, ctx: &mut EngineCtx, time_ms: u64) {
        if let Some(last) = self.last_sample {
            self.release(ctx, PointerSample { time_ms, ..last });
        }
    }

    /// Frame tick: fires long presses and lapsed tap windows.
    pub fn tick(&mut self, ctx: &mut EngineCtx, now_ms: u64) {
        let state = mem::take(&mut self.state);
        self.state = match state {
            Session::Pressed {
                channel: Channel::Touch,
                start,
                dist_max,
                grab: Some(grab),
                ..
            } if now_ms.saturating_sub(start.time_ms) >= self.config.long_press_ms
                && dist_max <= self.config.long_press_slop_px =>
            {
                self.taps = TapTracker::default();
                self.events.push(EngineEvent::Haptic);
                Session::Moving {
                    grab,
                    last_world: ctx.camera.screen_to_world(start.px, start.py),
                    applied: (0, 0),
                }
            }
            other => other,
        };

        // Taps resolve only once the window lapses with nothing pressed,
        // so a further tap can still upgrade the count.
        if matches!(self.state, Session::Idle)
            && self.taps.count > 0
            && now_ms.saturating_sub(self.taps.time_ms) > self.config.multi_tap_window_ms
        {
            let event = match self.taps.count {
                1 => EngineEvent::Tapped { pos: self.taps.pos },
                _ => EngineEvent::DoubleTapped { pos: self.taps.pos },
            };
            self.taps = TapTracker::default();
            self.events.push(event);
        }
    }

    /// External escape signal (keyboard Escape or a triple tap). Rolls
    /// back any live resize or move so no partial mutation survives.
    pub fn cancel(&mut self, ctx: &mut EngineCtx) {
        match mem::take(&mut self.state) {
            Session::Resizing(session) => session.cancel(&mut ctx.registry),
            Session::Moving { grab, applied, .. } => {
                let _ = grab.shifted(&mut ctx.registry, -applied.0, -applied.1);
            }
            _ => {}
        }
        ctx.selection = None;
        self.taps = TapTracker::default();
        self.last_sample = None;
        self.events.push(EngineEvent::Cancelled);
    }

    /// A second touch point appeared: the single-touch session is
    /// abandoned (rolled back if it was mutating) and the channel goes
    /// two-finger until a point lifts.
    pub fn pinch_start(&mut self, ctx: &mut EngineCtx, a: (f32, f32), b: (f32, f32)) {
        match mem::take(&mut self.state) {
            Session::Resizing(session) => session.cancel(&mut ctx.registry),
            Session::Moving { grab, applied, .. } => {
                let _ = grab.shifted(&mut ctx.registry, -applied.0, -applied.1);
            }
            _ => {}
        }
        self.taps = TapTracker::default();
        self.state = Session::Pinch { a, b };
    }

    /// Midpoint drives pan, point-to-point distance ratio drives zoom.
    pub fn pinch_move(&mut self, ctx: &mut EngineCtx, a: (f32, f32), b: (f32, f32)) {
        if let Session::Pinch { a: pa, b: pb } = self.state {
            let (mx0, my0) = ((pa.0 + pb.0) / 2.0, (pa.1 + pb.1) / 2.0);
            let (mx1, my1) = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
            ctx.camera.pan_px(-(mx1 - mx0), -(my1 - my0));
            let d0 = dist_px(pa.0, pa.1, pb.0, pb.1);
            let d1 = dist_px(a.0, a.1, b.0, b.1);
            if d0 > f32::EPSILON {
                ctx.camera.zoom_by(d1 / d0, mx1, my1);
            }
            self.state = Session::Pinch { a, b };
        }
    }

    pub fn pinch_end(&mut self, _ctx: &mut EngineCtx) {
        if matches!(self.state, Session::Pinch { .. }) {
            self.state = Session::Idle;
        }
    }

    fn tap_continues(&self, sample: &PointerSample) -> bool {
        self.taps.count > 0
            && sample.time_ms.saturating_sub(self.taps.time_ms) <= self.config.multi_tap_window_ms
            && dist_px(self.taps.px, self.taps.py, sample.px, sample.py) <= self.config.tap_max_dist_px
    }

    fn register_tap(&mut self, ctx: &mut EngineCtx, sample: PointerSample) {
        let continues = self.tap_continues(&sample);
        if !continues && self.taps.count > 0 {
            // A pending tap elsewhere still resolves; it just cannot chain.
            let event = match self.taps.count {
                1 => EngineEvent::Tapped { pos: self.taps.pos },
                _ => EngineEvent::DoubleTapped { pos: self.taps.pos },
            };
            self.events.push(event);
        }
        let count = if continues { self.taps.count + 1 } else { 1 };
        if count >= 3 {
            // Unconditional cancel, never a double-tap.
            self.cancel(ctx);
            return;
        }
        self.taps = TapTracker {
            count,
            time_ms: sample.time_ms,
            px: sample.px,
            py: sample.py,
            pos: ctx.camera.screen_to_world(sample.px, sample.py),
        };
    }
}

/// What a press at `world` could pick up and move. `allow_text` admits
/// bare text blocks, which only the modifier move may grab.
fn grab_at(ctx: &EngineCtx, world: Position, hit: Option<&Hit>, allow_text: bool) -> Option<Grab> {
    if let Some(sel) = &ctx.selection {
        if sel.contains(world) {
            let cells = sel.cells(&ctx.registry);
            if !cells.is_empty() {
                return Some(Grab::Selection(cells));
            }
        }
    }
    match hit {
        Some(Hit::Region { key, kind }) if kind.moveable() => Some(Grab::Region(key.clone())),
        Some(Hit::Text(block)) if allow_text => Some(Grab::TextBlock(block.cells.clone())),
        _ => None,
    }
}

fn dist_px(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

/// Selected-entity bookkeeping shared by the app layer: a tap on a region
/// selects it, a tap elsewhere clears the selection.
pub fn select_at(ctx: &mut EngineCtx, pos: Position) -> Option<EntityKey> {
    match hit::hit_test_world(&ctx.registry, pos) {
        Some(Hit::Region { key, .. }) => {
            ctx.selected = Some(key.clone());
            Some(key)
        }
        _ => {
            ctx.selected = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, RegionEntity, RegionKind};
    use crate::geometry::Bounds;
    use crate::registry::Registry;
    use crate::store::MemoryStore;

    fn ctx() -> EngineCtx {
        EngineCtx::new(Registry::new(Box::new(MemoryStore::new())))
    }

    fn engine() -> GestureEngine {
        GestureEngine::new(GestureConfig::default())
    }

    fn at(px: f32, py: f32, time_ms: u64) -> PointerSample {
        PointerSample { px, py, time_ms }
    }

    fn tap(eng: &mut GestureEngine, ctx: &mut EngineCtx, px: f32, py: f32, t: u64) {
        eng.press(ctx, Channel::Touch, at(px, py, t), Modifiers::default());
        eng.release(ctx, at(px, py, t + 50));
    }

    fn put_note(ctx: &mut EngineCtx, bounds: Bounds, created_ms: i64) -> EntityKey {
        let mut note = RegionEntity::new(RegionKind::Note, bounds);
        note.created_ms = created_ms;
        let key = note.key();
        ctx.registry.set(key.clone(), Entity::Region(note));
        key
    }

    #[test]
    fn single_tap_resolves_after_the_window() {
        let mut ctx = ctx();
        let mut eng = engine();
        tap(&mut eng, &mut ctx, 10.0, 10.0, 0);
        eng.tick(&mut ctx, 100);
        assert!(eng.drain_events().is_empty());
        eng.tick(&mut ctx, 500);
        assert_eq!(eng.drain_events(), vec![EngineEvent::Tapped { pos: Position::new(1, 0) }]);
    }

    #[test]
    fn two_taps_resolve_as_double() {
        let mut ctx = ctx();
        let mut eng = engine();
        tap(&mut eng, &mut ctx, 10.0, 10.0, 0);
        tap(&mut eng, &mut ctx, 12.0, 10.0, 200);
        eng.tick(&mut ctx, 700);
        assert_eq!(
            eng.drain_events(),
            vec![EngineEvent::DoubleTapped { pos: Position::new(1, 0) }]
        );
    }

    #[test]
    fn three_quick_taps_always_cancel() {
        let mut ctx = ctx();
        let mut eng = engine();
        tap(&mut eng, &mut ctx, 10.0, 10.0, 0);
        tap(&mut eng, &mut ctx, 10.0, 10.0, 150);
        tap(&mut eng, &mut ctx, 10.0, 10.0, 300);
        eng.tick(&mut ctx, 2000);
        // Cancel only; the first two taps never surface as a double.
        assert_eq!(eng.drain_events(), vec![EngineEvent::Cancelled]);
    }

    #[test]
    fn distant_second_tap_starts_a_fresh_count() {
        let mut ctx = ctx();
        let mut eng = engine();
        tap(&mut eng, &mut ctx, 10.0, 10.0, 0);
        tap(&mut eng, &mut ctx, 300.0, 10.0, 200);
        eng.tick(&mut ctx, 700);
        // Two singles, not a double.
        assert_eq!(
            eng.drain_events(),
            vec![
                EngineEvent::Tapped { pos: Position::new(1, 0) },
                EngineEvent::Tapped { pos: Position::new(30, 0) },
            ]
        );
        eng.tick(&mut ctx, 2000);
        assert!(eng.drain_events().is_empty());
    }

    #[test]
    fn mouse_drag_makes_a_selection() {
        let mut ctx = ctx();
        let mut eng = engine();
        eng.press(&mut ctx, Channel::Mouse, at(0.0, 0.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(55.0, 45.0, 40));
        let sel = ctx.selection.unwrap();
        assert_eq!(sel.anchor, Position::new(0, 0));
        assert_eq!(sel.head, Position::new(5, 2));
        eng.release(&mut ctx, at(55.0, 45.0, 80));
        assert!(eng.is_idle());
        assert!(ctx.selection.is_some());
    }

    #[test]
    fn touch_drag_pans_the_camera() {
        let mut ctx = ctx();
        let mut eng = engine();
        eng.press(&mut ctx, Channel::Touch, at(100.0, 100.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(140.0, 100.0, 40));
        eng.release(&mut ctx, at(140.0, 100.0, 80));
        // Dragging right pulls content right, so the offset went left.
        assert!(ctx.camera.offset_x < 0.0);
        assert!(ctx.selection.is_none());
    }

    #[test]
    fn double_tap_then_drag_selects_on_touch() {
        let mut ctx = ctx();
        let mut eng = engine();
        tap(&mut eng, &mut ctx, 10.0, 10.0, 0);
        eng.press(&mut ctx, Channel::Touch, at(10.0, 10.0, 200), Modifiers::default());
        eng.moved(&mut ctx, at(80.0, 10.0, 250));
        assert!(ctx.selection.is_some());
        eng.release(&mut ctx, at(80.0, 10.0, 300));
    }

    #[test]
    fn long_press_on_a_note_moves_it() {
        let mut ctx = ctx();
        let mut eng = engine();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(3, 1)),
            7,
        );
        eng.press(&mut ctx, Channel::Touch, at(15.0, 15.0, 0), Modifiers::default());
        eng.tick(&mut ctx, 600);
        assert_eq!(eng.drain_events(), vec![EngineEvent::Haptic]);
        // One cell right is 10 px at default zoom.
        eng.moved(&mut ctx, at(25.0, 15.0, 650));
        assert!(!ctx.registry.contains(&key));
        assert!(ctx.registry.contains(&EntityKey("note:1,0:7".into())));
        eng.release(&mut ctx, at(25.0, 15.0, 700));
        assert!(eng.is_idle());
    }

    #[test]
    fn early_movement_defeats_the_long_press() {
        let mut ctx = ctx();
        let mut eng = engine();
        put_note(&mut ctx, Bounds::new(Position::new(0, 0), Position::new(3, 1)), 7);
        eng.press(&mut ctx, Channel::Touch, at(15.0, 15.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(45.0, 15.0, 100));
        eng.tick(&mut ctx, 600);
        // Fell back to pan, never haptic.
        assert!(eng.drain_events().is_empty());
        assert!(ctx.camera.offset_x < 0.0);
    }

    #[test]
    fn escape_during_move_restores_the_original_spot() {
        let mut ctx = ctx();
        let mut eng = engine();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(3, 1)),
            7,
        );
        eng.press(&mut ctx, Channel::Touch, at(15.0, 15.0, 0), Modifiers::default());
        eng.tick(&mut ctx, 600);
        eng.moved(&mut ctx, at(65.0, 15.0, 650));
        assert!(!ctx.registry.contains(&key));
        eng.cancel(&mut ctx);
        assert!(ctx.registry.contains(&key));
        let events = eng.drain_events();
        assert!(events.contains(&EngineEvent::Cancelled));
    }

    #[test]
    fn modifier_press_moves_on_release_only() {
        let mut ctx = ctx();
        let mut eng = engine();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(3, 1)),
            7,
        );
        let mods = Modifiers { move_held: true };
        eng.press(&mut ctx, Channel::Mouse, at(15.0, 15.0, 0), mods);
        eng.moved(&mut ctx, at(65.0, 15.0, 100));
        // Nothing moved yet.
        assert!(ctx.registry.contains(&key));
        eng.release(&mut ctx, at(65.0, 15.0, 200));
        assert!(!ctx.registry.contains(&key));
        assert!(ctx.registry.contains(&EntityKey("note:5,0:7".into())));
    }

    #[test]
    fn handle_press_resizes_the_selected_region() {
        let mut ctx = ctx();
        let mut eng = engine();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(4, 4)),
            7,
        );
        ctx.selected = Some(key.clone());
        // Bottom-right corner cell (4,4) renders at (40,80)..(50,100).
        eng.press(&mut ctx, Channel::Mouse, at(45.0, 90.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(85.0, 90.0, 40));
        eng.release(&mut ctx, at(85.0, 90.0, 80));
        let bounds = ctx.registry.get(&key).unwrap().as_region().unwrap().bounds;
        assert_eq!(bounds, Bounds::new(Position::new(0, 0), Position::new(8, 4)));
    }

    #[test]
    fn escape_during_resize_restores_the_snapshot() {
        let mut ctx = ctx();
        let mut eng = engine();
        let original = Bounds::new(Position::new(0, 0), Position::new(4, 4));
        let key = put_note(&mut ctx, original, 7);
        ctx.selected = Some(key.clone());
        eng.press(&mut ctx, Channel::Mouse, at(45.0, 90.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(85.0, 90.0, 40));
        eng.cancel(&mut ctx);
        let bounds = ctx.registry.get(&key).unwrap().as_region().unwrap().bounds;
        assert_eq!(bounds, original);
    }

    #[test]
    fn second_touch_promotes_to_pinch_zoom() {
        let mut ctx = ctx();
        let mut eng = engine();
        eng.press(&mut ctx, Channel::Touch, at(100.0, 100.0, 0), Modifiers::default());
        eng.pinch_start(&mut ctx, (80.0, 100.0), (120.0, 100.0));
        eng.pinch_move(&mut ctx, (60.0, 100.0), (140.0, 100.0));
        assert!(ctx.camera.zoom > 1.0);
        eng.pinch_end(&mut ctx);
        assert!(eng.is_idle());
    }

    #[test]
    fn leaving_the_surface_finalizes_like_release() {
        let mut ctx = ctx();
        let mut eng = engine();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(4, 4)),
            7,
        );
        ctx.selected = Some(key.clone());
        eng.press(&mut ctx, Channel::Mouse, at(45.0, 90.0, 0), Modifiers::default());
        eng.moved(&mut ctx, at(85.0, 90.0, 40));
        eng.leave(&mut ctx, 80);
        assert!(eng.is_idle());
        let bounds = ctx.registry.get(&key).unwrap().as_region().unwrap().bounds;
        assert_eq!(bounds, Bounds::new(Position::new(0, 0), Position::new(8, 4)));
    }

    #[test]
    fn tap_selects_a_region_and_empty_tap_clears() {
        let mut ctx = ctx();
        let key = put_note(
            &mut ctx,
            Bounds::new(Position::new(0, 0), Position::new(3, 1)),
            7,
        );
        assert_eq!(select_at(&mut ctx, Position::new(1, 1)), Some(key.clone()));
        assert_eq!(ctx.selected, Some(key));
        assert_eq!(select_at(&mut ctx, Position::new(50, 50)), None);
        assert_eq!(ctx.selected, None);
    }
}
