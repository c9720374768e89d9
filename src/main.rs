mod app;
mod cli;
mod event;
mod help;
mod keys;
mod list;
mod logging;
mod settings;
mod source;
mod theme;
mod time;
mod tui;
mod views;
mod widgets;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::Frame;
use tracing::{info, warn};

use app::{App, DEBUG_PANE_HEIGHT, Message};
use cli::{Cli, SourceKind};
use event::{Event, EventHandler};
use list::{FetchFn, ScrollConfig};
use settings::Settings;
use source::{DemoSource, HnSource, Post};
use theme::{ResolvedTheme, detect_terminal_theme};

const TICK_RATE_MS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = settings::config_dir(cli.config_dir.as_ref());

    if let Some(log_path) = log_path(&cli, config_dir.as_ref()) {
        match logging::init(&log_path, cli.verbose) {
            Ok(()) if cli.verbose => eprintln!("Logging to {}", log_path.display()),
            Ok(()) => {}
            Err(e) => eprintln!("Logging disabled: {e}"),
        }
    }

    let settings = config_dir
        .as_ref()
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {e:#}");
                Settings::default()
            })
        })
        .unwrap_or_default();

    run_tui(cli, settings).await
}

fn log_path(cli: &Cli, config_dir: Option<&PathBuf>) -> Option<PathBuf> {
    cli.log_file
        .clone()
        .or_else(|| config_dir.map(|dir| settings::log_path(dir)))
}

/// Priority: --dark/--light > settings file > terminal detection.
fn resolve_theme(cli: &Cli, settings: &Settings) -> ResolvedTheme {
    let variant = cli
        .forced_variant()
        .or(settings.theme)
        .unwrap_or_else(detect_terminal_theme);
    ResolvedTheme::for_variant(variant)
}

fn build_fetcher(cli: &Cli, config: &ScrollConfig) -> Result<FetchFn<Post>> {
    let fetch = match cli.source {
        SourceKind::Demo => {
            let demo = DemoSource::new(cli.total, config.items_per_load, time::now_unix())
                .with_latency(Duration::from_millis(cli.latency_ms))
                .fail_first(cli.fail_first);
            source::fetcher(demo)
        }
        SourceKind::Hn => {
            let hn = HnSource::new(config.items_per_load)
                .context("Failed to set up the Hacker News client")?;
            source::fetcher(hn)
        }
    };
    Ok(fetch)
}

async fn run_tui(cli: Cli, settings: Settings) -> Result<()> {
    let config = cli.scroll_config(&settings.list);
    let fetch = build_fetcher(&cli, &config)?;
    let theme = resolve_theme(&cli, &settings);
    info!(source = cli.source.label(), ?config, "starting");

    let mut terminal = tui::init().context("Failed to initialize terminal")?;
    let mut app = App::new(config, fetch, theme);
    app.title = cli.source.label().to_string();
    let mut events = EventHandler::new(TICK_RATE_MS);
    let mut last_size: Option<(u16, u16)> = None;

    let result = async {
        loop {
            // Report size changes before drawing so the frame uses fresh heights.
            let size = terminal.size()?;
            if last_size != Some((size.width, size.height)) {
                last_size = Some((size.width, size.height));
                app.update(Message::Resize {
                    width: size.width,
                    height: size.height,
                });
            }

            terminal.draw(|frame| render(&app, frame))?;

            // Poll async results (non-blocking)
            while let Ok(result) = app.result_rx.try_recv() {
                app.handle_async_result(result);
            }

            if app.should_quit {
                break;
            }

            let msg = match events.next().await? {
                Event::Key(key) => keys::handle_key(key),
                Event::Mouse(mouse) => keys::handle_mouse(mouse),
                Event::Resize(width, height) => {
                    last_size = Some((width, height));
                    Some(Message::Resize { width, height })
                }
                Event::Tick => Some(Message::Tick),
            };
            if let Some(msg) = msg {
                app.update(msg);
            }
        }
        anyhow::Ok(())
    }
    .await;

    app.shutdown();
    if let Err(e) = tui::restore() {
        warn!(%e, "failed to restore terminal");
    }
    result
}

fn render(app: &App, frame: &mut Frame) {
    use ratatui::layout::{Constraint, Layout};

    let area = frame.area();

    // Split area for debug pane if visible
    let (main_area, debug_area) = if app.debug.visible {
        let chunks = Layout::vertical([
            Constraint::Min(0),                    // Feed
            Constraint::Length(DEBUG_PANE_HEIGHT), // Debug pane
        ])
        .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    views::feed::render(frame, app, main_area);

    if let Some(debug_area) = debug_area {
        views::debug::render(frame, app, debug_area);
    }
}
