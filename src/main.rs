//! car-tracker-tui: a terminal front end for a car-tracker backend.
//!
//! Paste a marketplace URL, watch the backend ingest it, and triage the cars
//! it has collected.
//!
//! ## Architecture overview
//!
//! ```text
//!                 Effect              Msg (channel)
//! ┌──────────┐ ───────► ┌─────────────┐ ───────► ┌──────────┐  draw()  ┌──────────┐
//! │  app.rs  │          │ dispatch.rs │          │  app.rs  │ ───────► │  ui.rs   │
//! │ (state)  │          │  + poll.rs  │          │ (apply)  │          │ (render) │
//! └──────────┘          │   (tokio)   │          └──────────┘          └──────────┘
//!      ▲                └─────────────┘
//!      │ handle_key_event()
//! ┌──────────┐
//! │ input.rs │
//! └──────────┘
//! ```
//!
//! * **`api/`** — the `ListingApi` trait and its HTTP implementation.
//! * **`listing/`** — listing records and the in-memory store.
//! * **`poll`** — one tokio loop per ingestion task, polling its status.
//! * **`dispatch`** — runs `Effect`s on the runtime and reports back as `Msg`s.
//! * **`app`** — owns all application state; `apply` turns a `Msg` into new
//!   state plus follow-up `Effect`s.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse args, set up logging, the
//!   runtime and the terminal, and run the event loop.

mod api;
mod app;
mod config;
mod dispatch;
mod effect;
mod error;
mod input;
mod listing;
mod logging;
mod msg;
mod poll;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use api::{HttpApi, ListingApi};
use app::App;
use config::Config;
use dispatch::Dispatcher;
use effect::Effect;

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.  This prevents the common TUI bug where a panic leaves the
/// terminal in a broken state.
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

/// Install a panic hook that restores the terminal before printing the
/// panic message.  Without this, a panic inside the event loop would leave
/// raw mode enabled and the alternate screen active.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Config::parse();
    logging::initialize(&config.log_file, config.log_level());
    log::info!("starting against {}", config.base_url);

    // -- IO runtime ----------------------------------------------------------
    // The UI loop stays synchronous; API calls and poll loops run here.
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let api: Arc<dyn ListingApi> =
        Arc::new(HttpApi::new(&config.base_url).context("building HTTP client")?);
    let mut dispatcher = Dispatcher::new(api, runtime.handle().clone(), tx, config.poll_settings());

    install_panic_hook();

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();
    dispatcher.run(Effect::Refresh);

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply messages from the runtime, running any follow-up effects.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Process runtime messages
        while let Ok(msg) = rx.try_recv() {
            let effects = app.apply(msg);
            dispatcher.run_all(effects);
        }
        dispatcher.tick();

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                let effects = input::handle_key_event(&mut app, key);
                dispatcher.run_all(effects);
            }
        }

        if app.quit {
            break;
        }
    }

    let abandoned = dispatcher.active_tasks();
    if abandoned > 0 {
        log::info!("abandoning {abandoned} task(s) still being polled");
    }
    // Abort poll loops before tearing the runtime down.
    drop(dispatcher);
    runtime.shutdown_background();
    log::info!("exiting");

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
