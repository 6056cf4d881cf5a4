mod api;
mod app;
mod catalog;
mod codec;
mod config;
mod constants;
mod input;
mod player;
mod sync;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{App, Screen};
use constants::constants;

// --- CLI ---

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScreen {
  Dashboard,
  Admin,
  Profile,
}

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Shared data directory (catalog, prefs, log). Instances pointed at the
  /// same directory see each other's changes. Defaults to the platform data dir.
  #[arg(short, long)]
  data_dir: Option<PathBuf>,

  /// Base URL of the auth/profile API.
  #[arg(long)]
  api_base: Option<String>,

  /// Screen to open when already signed in (default: dashboard).
  #[arg(short, long)]
  screen: Option<CliScreen>,
}

fn resolve_data_dir(args: &Args) -> Result<PathBuf> {
  if let Some(ref dir) = args.data_dir {
    return Ok(dir.clone());
  }
  let dirs = directories::ProjectDirs::from("", "", "coursedeck")
    .context("Could not determine a data directory; pass --data-dir")?;
  Ok(dirs.data_dir().to_path_buf())
}

/// Logs go to a file — the terminal belongs to the UI.
fn init_logging(data_dir: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
  std::fs::create_dir_all(data_dir)
    .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
  let appender = tracing_appender::rolling::never(data_dir, "coursedeck.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let data_dir = resolve_data_dir(&args)?;
  let _log_guard = init_logging(&data_dir)?;
  info!(dir = %data_dir.display(), version = env!("CARGO_PKG_VERSION"), "coursedeck starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args, data_dir).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args, data_dir: PathBuf) -> Result<()> {
  let api_base = args.api_base.unwrap_or_else(|| constants().api_base.clone());
  let requested = args.screen.map(|s| match s {
    CliScreen::Dashboard => Screen::Dashboard,
    CliScreen::Admin => Screen::Admin,
    CliScreen::Profile => Screen::Profile,
  });
  let mut app = App::new(data_dir, api_base, requested);

  loop {
    app.tick().await;

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  Ok(())
}
