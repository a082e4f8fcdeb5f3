//! livescroll: one reverse-chronological stream from many paginated feeds.
//!
//! ## Architecture overview
//!
//! ```text
//!                   StreamMsg            draw()
//! ┌──────────────┐  (channel)  ┌──────┐ ───────► ┌───────┐
//! │ controller.rs│ ──────────► │app.rs│          │ ui.rs │
//! │ (tokio task) │             └──────┘          └───────┘
//! └──────────────┘                 │ Request::LoadMore
//!   ▲   │ fetch pages              ▼
//!   │   ▼                     ┌─────────┐
//!   │ source/ ─► frontier.rs  │input.rs │
//!   │         ─► buffer.rs    └─────────┘
//!   └──────── trigger() ◄──── main loop
//! ```
//!
//! * **`source/`**: the `PageFetcher` trait, the `/parse` HTTP client and
//!   the `Entry` type.
//! * **`frontier`**: per-source continuation state.
//! * **`buffer`**: fetched entries waiting to be rendered, newest first.
//! * **`controller`**: the gated fetch/render loop.
//! * **`render`**: the controller-to-UI channel.
//! * **`app`** / **`ui`** / **`input`**: terminal state, drawing, keys.
//! * **`discovery`** / **`config`**: where the sources and settings come from.
//! * **`main`**: wires everything together and runs the event loop.

mod app;
mod buffer;
mod config;
mod controller;
mod discovery;
mod error;
mod frontier;
mod input;
mod render;
mod source;
mod ui;

#[cfg(test)]
mod test_utils;

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::{Handle, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::{App, Request};
use config::Config;
use controller::{LoadController, Settings};
use render::{ChannelRenderer, StreamMsg};
use source::HttpFetcher;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Log to a file; stdout belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One load controller and the channel its batches arrive on.  Replacing the
/// session is the only way to start over after the stream is exhausted.
struct Session {
    sources: Vec<String>,
    controller: Arc<LoadController<HttpFetcher, ChannelRenderer>>,
    rx: mpsc::Receiver<StreamMsg>,
}

impl Session {
    fn start(sources: Vec<String>, fetcher: &HttpFetcher, settings: Settings, runtime: &Handle) -> Self {
        info!(sources = ?sources, "starting session");
        let (renderer, rx) = ChannelRenderer::channel();
        let controller = Arc::new(LoadController::new(
            sources.iter().cloned(),
            fetcher.clone(),
            renderer,
            settings,
        ));
        controller.trigger(runtime);
        Self {
            sources,
            controller,
            rx,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::load();
    init_logging(&config.log_file)?;
    install_panic_hook();

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let fetcher = HttpFetcher::new(&config.server, config.timeout())?;
    let settings = config.settings();

    // -- discover sources ----------------------------------------------------
    let sources = runtime.block_on(discovery::discover(
        &config.urls,
        config.query.as_deref(),
        &fetcher,
    ))?;
    let mut session = Session::start(sources, &fetcher, settings, runtime.handle());

    // -- terminal setup (RAII: Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(config.bottom_distance);

    // -- main event loop -----------------------------------------------------
    // Each iteration:
    //   1. Drain rendered batches from the current session.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    //   4. Carry out whatever the input asked for.
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = session.rx.try_recv() {
            app.apply(msg);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        match app.take_request() {
            Some(Request::LoadMore) => {
                if !session.controller.trigger(runtime.handle()) {
                    app.trigger_dropped(session.controller.phase());
                }
            }
            Some(Request::Reload) => {
                let sources = session.sources.clone();
                app.reset();
                session = Session::start(sources, &fetcher, settings, runtime.handle());
            }
            Some(Request::Follow(link)) => {
                let sources = discovery::urls_from_query(&link);
                if sources.is_empty() {
                    warn!(%link, "feed link has no sources");
                    app.status = "Entry has no feed link".into();
                } else {
                    app.reset();
                    session = Session::start(sources, &fetcher, settings, runtime.handle());
                }
            }
            None => {}
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
