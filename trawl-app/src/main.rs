use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use trawl_common::observability::{init_logging, LogConfig, LogFormat};
use trawl_config::{TrawlConfig, TrawlConfigLoader};
use trawl_runtime::TrawlRuntime;

mod run;

const DEFAULT_CONFIG_FILE: &str = "trawl.yaml";

/// Walk an app's endless list over Appium and open rows whose title matches.
#[derive(Parser, Debug)]
#[command(name = "trawl", version)]
struct Args {
    /// YAML configuration file. Without it `trawl.yaml` is used if present.
    #[arg(short, long, env = "TRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Title keyword to match; repeat for several. Replaces the configured list.
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    #[arg(long)]
    case_insensitive: bool,

    /// Consecutive no-movement scrolls before stopping.
    #[arg(long)]
    max_idle_scrolls: Option<u32>,

    /// `text` or `json`.
    #[arg(long)]
    log_format: Option<LogFormat>,

    #[arg(long)]
    log_stderr: Option<bool>,
}

fn load_config(args: &Args) -> Result<TrawlConfig> {
    let loader = match &args.config {
        Some(path) => TrawlConfigLoader::new().with_file(path),
        None => TrawlConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg = loader.load()?;
    apply_overrides(&mut cfg, args);
    Ok(cfg)
}

/// Command-line flags win over every configuration source.
fn apply_overrides(cfg: &mut TrawlConfig, args: &Args) {
    if !args.keywords.is_empty() {
        cfg.matching.keywords = args.keywords.clone();
    }
    if args.case_insensitive {
        cfg.matching.case_sensitive = false;
    }
    if let Some(limit) = args.max_idle_scrolls {
        cfg.traversal.max_idle_scrolls = Some(limit);
    }
    if let Some(format) = args.log_format {
        cfg.logging.format = format;
    }
    if let Some(stderr) = args.log_stderr {
        cfg.logging.stderr = stderr;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = load_config(&args)?;

    let log_path = init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })?;
    tracing::info!(log = %log_path.display(), server = %cfg.appium.server_url(), "trawl starting");

    let runtime = TrawlRuntime::build("trawl-worker", None)?;
    let handle = runtime.handle();
    let cancel = handle.cancellation();
    let _signals = handle.watch_signals();

    let result = runtime.block_on(run::run(&cfg, &cancel));
    runtime.shutdown(Duration::from_secs(2));

    let report = result?;
    tracing::info!(
        stop = ?report.stop,
        cycles = report.cycles,
        processed = report.stats.processed,
        matched = report.stats.matched,
        "trawl finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configuration() {
        let args = Args::try_parse_from([
            "trawl",
            "--keyword",
            "chiikawa",
            "-k",
            "奇卡瓦",
            "--case-insensitive",
            "--max-idle-scrolls",
            "3",
            "--log-format",
            "json",
            "--log-stderr",
            "false",
        ])
        .unwrap();

        let mut cfg = TrawlConfig::default();
        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.matching.keywords, vec!["chiikawa", "奇卡瓦"]);
        assert!(!cfg.matching.case_sensitive);
        assert_eq!(cfg.traversal.max_idle_scrolls, Some(3));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert!(!cfg.logging.stderr);
    }

    #[test]
    fn no_flags_keep_configuration() {
        let args = Args::try_parse_from(["trawl"]).unwrap();
        let mut cfg = TrawlConfig::default();
        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.matching.keywords, vec!["约尔"]);
        assert!(cfg.matching.case_sensitive);
        assert_eq!(cfg.traversal.max_idle_scrolls, Some(5));
    }
}
