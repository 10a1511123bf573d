//! Logging for the `trawl` binary.
//!
//! Every run writes to `<dir>/trawl.log.<date>`, rotated daily. Row, match
//! and scroll events go out under the `trawl.traversal` target, driver
//! traffic under `trawl.session`, `trawl.resolver` and `trawl.gesture`.
//! `RUST_LOG` overrides the configured filter, e.g.
//! `RUST_LOG=info,trawl.resolver=debug`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Overrides the default log directory when the config names none.
pub const LOG_DIR_ENV: &str = "TRAWL_LOG_DIR";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event; fields like `bounds` and `title` stay
    /// separate keys.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected text or json)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log file name before the date suffix, and the directory name under
    /// `~/.local/share` when no directory is given.
    pub file_stem: &'static str,
    pub log_dir: Option<PathBuf>,
    /// Mirror events to the terminal.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset or unparsable.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_stem: "trawl",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Install the global subscriber and return today's log file.
///
/// Only the first call installs anything; the process keeps that setup and
/// later calls get the same path back.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = log_dir(config.file_stem, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let path = log_file(&dir, config.file_stem, Local::now().date_naive());

    let appender = rolling::daily(&dir, format!("{}.log", config.file_stem));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter.as_str()));

    tracing_subscriber::registry()
        .with(sinks(config.format, writer, config.emit_stderr).with_filter(filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing the log subscriber: {e}"))?;

    let _ = LOG_PATH.set(path.clone());
    Ok(path)
}

/// File sink, plus a terminal sink when asked. The file never gets ANSI
/// colour codes.
fn sinks(format: LogFormat, file: NonBlocking, stderr: bool) -> Vec<BoxedLayer> {
    let mut layers = Vec::with_capacity(2);
    match format {
        LogFormat::Text => {
            layers.push(fmt::layer().with_writer(file).with_ansi(false).boxed());
            if stderr {
                layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
            }
        }
        LogFormat::Json => {
            layers.push(fmt::layer().json().with_writer(file).boxed());
            if stderr {
                layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
            }
        }
    }
    layers
}

/// Configured directory, then `TRAWL_LOG_DIR`, then `~/.local/share/<stem>`.
fn log_dir(stem: &str, configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return with_home(dir);
    }
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        return with_home(Path::new(&dir));
    }
    match std::env::var("HOME") {
        Ok(home) => Path::new(&home).join(".local/share").join(stem),
        Err(_) => PathBuf::from(stem),
    }
}

fn with_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var("HOME")) {
        (Ok(rest), Ok(home)) => Path::new(&home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Name the daily appender gives the file for `date`.
fn log_file(dir: &Path, stem: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{stem}.log.{}", date.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_dir_wins_and_expands_home() {
        assert_eq!(
            log_dir("trawl", Some(Path::new("/var/log/trawl"))),
            PathBuf::from("/var/log/trawl")
        );

        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                log_dir("trawl", Some(Path::new("~/logs"))),
                PathBuf::from(home).join("logs")
            );
        }
    }

    #[test]
    fn file_carries_the_date_suffix() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            log_file(Path::new("/tmp/trawl"), "trawl", date),
            PathBuf::from("/tmp/trawl/trawl.log.2026-03-09")
        );
    }

    #[test]
    fn parses_log_format() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
