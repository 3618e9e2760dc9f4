use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use ytshelf::app::App;
use ytshelf::config::Config;
use ytshelf::input::handle_key_event;
use ytshelf::youtube::{ApiVersion, HttpFetcher};
use ytshelf::{logging, ui};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Search API version: 'v2' (Atom feed) or 'v3' (JSON)
  #[arg(long, value_enum)]
  api_version: Option<ApiVersion>,

  /// Search within a single channel instead of all of YouTube
  #[arg(long)]
  channel_search: bool,

  /// Channel to search when --channel-search is on
  #[arg(long)]
  channel_id: Option<String>,

  /// Results requested per search
  #[arg(long)]
  max_results: Option<u32>,

  /// 1-based index of the first result (v2 only)
  #[arg(long)]
  start_index: Option<u32>,

  /// API key sent with v3 requests
  #[arg(long)]
  api_key: Option<String>,

  /// Run this search on startup
  #[arg(short, long)]
  query: Option<String>,

  /// Persist the effective preferences to prefs.toml
  #[arg(long)]
  save: bool,
}

impl Args {
  fn apply(&self, config: &mut Config) {
    if let Some(v) = self.api_version {
      config.api_version = Some(v);
    }
    if self.channel_search {
      config.channel_scoped_search = Some(true);
    }
    if let Some(ref id) = self.channel_id {
      config.channel_id = Some(id.clone());
    }
    if let Some(n) = self.max_results {
      config.max_results = Some(n);
    }
    if let Some(n) = self.start_index {
      config.page_start_index = Some(n);
    }
    if let Some(ref key) = self.api_key {
      config.api_key = Some(key.clone());
    }
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  // Logging is best effort; the UI works without it.
  let _log_guard = logging::init().ok();

  let mut config = Config::load();
  args.apply(&mut config);
  if args.save {
    config.save().context("Failed to save preferences")?;
    info!("preferences saved");
  }
  let search_config = config.search_config().context("Invalid search settings")?;
  info!(api = search_config.api_version.label(), scope = ?search_config.scope, "starting");

  let mut app = App::new(search_config, Arc::new(HttpFetcher::new()), config.auto_select_first());
  if let Some(ref q) = args.query {
    app.set_input(q);
    app.trigger_search();
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  if let Err(ref e) = result {
    warn!(err = %e, "exiting with error");
  }
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending(Instant::now());
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
