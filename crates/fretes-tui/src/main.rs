use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use fretes_core::config::Config;
use tui::{AppEvent, EventHandler, Tui};

/// Diagnostics go to a file so they never corrupt the interface. Enabled
/// only when FRETES_LOG names a path.
fn init_tracing() -> Result<()> {
    let Ok(path) = std::env::var("FRETES_LOG") else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::load().unwrap_or_else(|_| Config::default());
    tracing::info!(api_base_url = %config.api_base_url, "starting fretes");
    let mut app = App::new(config);
    app.bootstrap();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            let is_tick = matches!(event, AppEvent::Tick);
            handler::handle_event(app, event);
            if is_tick {
                app.poll_tasks();
            }
        }
    }

    Ok(())
}
