use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding filter directives, e.g. `YTSHELF_LOG=ytshelf=debug`.
pub const LOG_ENV: &str = "YTSHELF_LOG";

/// Send tracing output to a daily-rolling file in the data directory. The
/// terminal belongs to the UI, so nothing is written to stderr.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", "ytshelf").context("No home directory to keep logs in")?;
  let log_dir = dirs.data_dir().join("logs");
  std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create {}", log_dir.display()))?;

  let appender = tracing_appender::rolling::daily(&log_dir, "ytshelf.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter())
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}

fn filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}
