//! Paint collaborator.
//!
//! Draws whatever the viewport query returns; it decides colors and
//! glyphs, never entity semantics. One terminal cell covers one block of
//! surface pixels, so everything routes through the camera transform.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use crate::app::{surface_px, App, Mode};
use crate::entity::{Entity, RegionKind};
use crate::geometry::{Bounds, Position};
use crate::resize::Corner;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Canvas area
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    frame.render_widget(CanvasWidget { app }, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
    render_help_bar(frame, chunks[2]);

    if let Mode::Insert { cursor, .. } = app.mode {
        if let Some((x, y)) = cell_in(&chunks[0], app, cursor) {
            frame.set_cursor_position((x, y));
        }
    }
}

/// Custom widget for rendering the world grid.
struct CanvasWidget<'a> {
    app: &'a App,
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let (width_px, height_px) = surface_px(area.width, area.height);
        let window = app.ctx.camera.visible_bounds(width_px, height_px);
        let mut keys = app.ctx.registry.visible_in(window);
        // Paint background layers first so cells land on top.
        keys.sort_by_key(|key| match app.ctx.registry.get(key) {
            Some(Entity::Region(region)) => match region.kind {
                RegionKind::Bound => 0,
                RegionKind::Pattern => 1,
                _ => 2,
            },
            _ => 3,
        });

        for key in &keys {
            match app.ctx.registry.get(key) {
                Some(Entity::Region(region)) => {
                    let style = region_style(region.kind);
                    draw_region_frame(buf, &area, app, region.bounds, style);
                    if let Some(content) = &region.content {
                        draw_region_content(buf, &area, app, region.bounds, content, style);
                    }
                }
                Some(Entity::Cell(cell)) => {
                    if let Some((x, y)) = cell_in(&area, app, cell.pos) {
                        buf[(x, y)].set_char(cell.glyph).set_style(cell_style(cell));
                    }
                }
                None => {}
            }
        }

        if let Some(sel) = &app.ctx.selection {
            highlight_selection(buf, &area, app, sel.bounds());
        }

        if let Some(selected) = &app.ctx.selected {
            if let Some(region) = app.ctx.registry.get(selected).and_then(Entity::as_region) {
                draw_handles(buf, &area, app, region.bounds);
            }
        }
    }
}

/// World cell -> buffer coordinates, if it lands inside the area.
fn cell_in(area: &Rect, app: &App, pos: Position) -> Option<(u16, u16)> {
    let (px, py) = app.ctx.camera.world_to_screen(pos);
    let (cell_w, cell_h) = surface_px(1, 1);
    let col = (px / cell_w).floor();
    let row = (py / cell_h).floor();
    if col < 0.0 || row < 0.0 || col >= f32::from(area.width) || row >= f32::from(area.height) {
        return None;
    }
    Some((area.x + col as u16, area.y + row as u16))
}

fn draw_region_frame(buf: &mut Buffer, area: &Rect, app: &App, bounds: Bounds, style: Style) {
    if !bounds.valid() {
        return;
    }
    for y in bounds.start.y..=bounds.end.y {
        for x in bounds.start.x..=bounds.end.x {
            let on_h_edge = y == bounds.start.y || y == bounds.end.y;
            let on_v_edge = x == bounds.start.x || x == bounds.end.x;
            if !on_h_edge && !on_v_edge {
                continue;
            }
            let Some((bx, by)) = cell_in(area, app, Position::new(x, y)) else {
                continue;
            };
            let ch = match (on_h_edge, on_v_edge) {
                (true, true) => corner_char(x == bounds.start.x, y == bounds.start.y),
                (true, false) => '─',
                (false, true) => '│',
                (false, false) => unreachable!(),
            };
            buf[(bx, by)].set_char(ch).set_style(style);
        }
    }
}

fn corner_char(left: bool, top: bool) -> char {
    match (left, top) {
        (true, true) => '┌',
        (false, true) => '┐',
        (true, false) => '└',
        (false, false) => '┘',
    }
}

fn draw_region_content(
    buf: &mut Buffer,
    area: &Rect,
    app: &App,
    bounds: Bounds,
    content: &str,
    style: Style,
) {
    // First inner row, clipped to the frame.
    let y = bounds.start.y + 1;
    if y >= bounds.end.y {
        return;
    }
    for (i, ch) in content.chars().enumerate() {
        let x = bounds.start.x + 1 + i as i32;
        if x >= bounds.end.x {
            break;
        }
        if let Some((bx, by)) = cell_in(area, app, Position::new(x, y)) {
            buf[(bx, by)].set_char(ch).set_style(style);
        }
    }
}

fn highlight_selection(buf: &mut Buffer, area: &Rect, app: &App, bounds: Bounds) {
    let style = Style::default().bg(Color::DarkGray);
    for y in bounds.start.y..=bounds.end.y {
        for x in bounds.start.x..=bounds.end.x {
            if let Some((bx, by)) = cell_in(area, app, Position::new(x, y)) {
                buf[(bx, by)].set_style(style);
            }
        }
    }
}

fn draw_handles(buf: &mut Buffer, area: &Rect, app: &App, bounds: Bounds) {
    let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    for (_, pos) in Corner::positions(&bounds) {
        if let Some((bx, by)) = cell_in(area, app, pos) {
            buf[(bx, by)].set_char('◆').set_style(style);
        }
    }
}

fn region_style(kind: RegionKind) -> Style {
    let color = match kind {
        RegionKind::Note => Color::Yellow,
        RegionKind::Image => Color::Magenta,
        RegionKind::Iframe => Color::LightBlue,
        RegionKind::Mail => Color::LightRed,
        RegionKind::Pattern => Color::Cyan,
        RegionKind::Bound => Color::DarkGray,
        RegionKind::Label => Color::Green,
        RegionKind::Task => Color::Blue,
        RegionKind::Link => Color::LightCyan,
    };
    Style::default().fg(color)
}

fn cell_style(cell: &crate::entity::CellEntity) -> Style {
    let mut style = Style::default();
    if let Some(named) = cell.style.as_ref().and_then(|s| s.fg.as_deref()) {
        if let Ok(color) = named.parse::<Color>() {
            style = style.fg(color);
        }
    }
    style
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Insert { .. } => "INSERT",
    };
    let mut spans = vec![
        Span::styled(format!(" {mode} "), Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(format!(
            " zoom {:.0}%  at {:.0},{:.0}  {} entities",
            app.ctx.camera.zoom * 100.0,
            app.ctx.camera.offset_x,
            app.ctx.camera.offset_y,
            app.ctx.registry.len(),
        )),
    ];
    if let Some(message) = &app.status_message {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help_bar(frame: &mut Frame, area: Rect) {
    let help = " q quit | arrows pan | +/- zoom | click type | drag select | shift-drag move | Esc cancel";
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
