mod app;
mod config;
mod entity;
mod geometry;
mod gesture;
mod hit;
mod mover;
mod pattern;
mod registry;
mod resize;
mod selection;
mod spatial;
mod store;
mod ui;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::KeyModifiers;
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use app::App;
use config::GestureConfig;
use gesture::Modifiers;
use registry::Registry;
use store::{default_storage_path, FileStore};

/// Infinite zoomable text-grid canvas
#[derive(Parser, Debug)]
#[command(name = "cellscape")]
#[command(version, about, long_about = None)]
struct Args {
    /// World file to open (defaults to the data-dir world)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Override the world storage path
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Log filter, e.g. "cellscape=debug"
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let world_path = args
        .file
        .or(args.store)
        .unwrap_or_else(default_storage_path);
    init_logging(&world_path, args.log_filter.as_deref())?;

    let store = FileStore::load(&world_path)
        .with_context(|| format!("loading world from {}", world_path.display()))?;
    let registry = Registry::new(Box::new(store));
    let config_path = world_path.with_file_name("gestures.json");
    let mut app = App::new(registry, GestureConfig::load(&config_path));
    tracing::info!(world = %world_path.display(), entities = app.ctx.registry.len(), "loaded world");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.surface = (size.width, size.height.saturating_sub(2)); // Reserve 2 rows for status/help

    let result = run_app(&mut terminal, &mut app);

    // Final flush so quitting never loses the last edits.
    if let Err(err) = app.ctx.registry.flush() {
        tracing::warn!(%err, "final world save failed");
    }

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Log to a file next to the world; stdout belongs to the terminal UI.
fn init_logging(world_path: &PathBuf, filter: Option<&str>) -> Result<()> {
    let log_path = world_path.with_file_name("cellscape.log");
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::File::create(&log_path)?;
    let filter = match filter {
        Some(spec) => EnvFilter::new(spec),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cellscape=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let clock = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        let now_ms = clock.elapsed().as_millis() as u64;
        app.tick(now_ms);

        // Poll with a timeout so ticks keep firing while input is quiet.
        if event::poll(Duration::from_millis(16))? {
            let now_ms = clock.elapsed().as_millis() as u64;
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Mouse(mouse) => {
                    let mods = Modifiers {
                        move_held: mouse.modifiers.contains(KeyModifiers::SHIFT),
                    };
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            app.pointer_down(mouse.column, mouse.row, now_ms, mods);
                        }
                        MouseEventKind::Drag(MouseButton::Left) => {
                            app.pointer_moved(mouse.column, mouse.row, now_ms);
                        }
                        MouseEventKind::Up(MouseButton::Left) => {
                            app.pointer_up(mouse.column, mouse.row, now_ms);
                        }
                        MouseEventKind::ScrollUp => app.scroll_zoom(mouse.column, mouse.row, true),
                        MouseEventKind::ScrollDown => {
                            app.scroll_zoom(mouse.column, mouse.row, false);
                        }
                        _ => {}
                    }
                }
                Event::Resize(w, h) => {
                    app.surface = (w, h.saturating_sub(2));
                }
                Event::FocusLost => app.pointer_leave(now_ms),
                _ => {}
            }
        }
    }

    Ok(())
}
