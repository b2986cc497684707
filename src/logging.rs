//! File-backed logging. The terminal belongs to fzf and the player, so
//! nothing is written to stdout/stderr.

use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "jfzf.log";
const DEFAULT_FILTER: &str = "jfzf=debug,warn";

/// Route tracing output to a daily-rotated file under the cache directory.
/// Returns the log directory.
pub fn init() -> Result<PathBuf> {
  let log_dir = dirs::cache_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("jfzf")
    .join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  // Keep the background writer alive for the life of the process.
  Box::leak(Box::new(guard));

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .init();

  Ok(log_dir)
}
