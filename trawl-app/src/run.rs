use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use trawl_common::TrawlError;
use trawl_config::TrawlConfig;
use trawl_crawler::{
    ensure_foreground, ListTraversal, MatchPolicy, StopReason, TraversalReport, TraversalSettings,
    TraversalStats,
};
use trawl_drivers::appium::provider::SessionProvider;
use trawl_drivers::MobileSession;

/// Open a session, traverse the list, and delete the session again no
/// matter how the traversal ended.
pub async fn run(cfg: &TrawlConfig, cancel: &CancellationToken) -> Result<TraversalReport> {
    let provider = SessionProvider::new(cfg.appium.server_url(), cfg.capabilities.to_w3c());
    let result = drive(&provider, cfg, cancel).await;
    if let Err(err) = provider.end_session().await {
        warn!(target: "trawl.session", error = %err, "session teardown failed");
    }
    result
}

async fn drive(
    provider: &SessionProvider,
    cfg: &TrawlConfig,
    cancel: &CancellationToken,
) -> Result<TraversalReport> {
    let session: Arc<dyn MobileSession> = provider
        .get_session()
        .await
        .with_context(|| format!("connecting to Appium at {}", provider.server_url()))?;

    let launch_wait = Duration::from_millis(cfg.traversal.launch_wait_ms);
    match ensure_foreground(
        session.as_ref(),
        &cfg.capabilities.app_package,
        launch_wait,
        cancel,
    )
    .await
    {
        Ok(_) => {}
        Err(TrawlError::Cancelled) => return Ok(cancelled_before_start()),
        Err(err) => return Err(err).context("bringing the target app to the foreground"),
    }

    let mut traversal = ListTraversal::new(
        session,
        MatchPolicy::from(&cfg.matching),
        TraversalSettings::from(cfg),
    );

    let container_wait = Duration::from_millis(cfg.traversal.container_wait_ms);
    tokio::select! {
        _ = cancel.cancelled() => return Ok(cancelled_before_start()),
        ready = traversal.wait_for_container(container_wait) => {
            ready.context("waiting for the list to load")?;
        }
    }

    let report = traversal.run(cancel).await.context("traversal failed")?;
    info!(
        target: "trawl.traversal",
        stop = ?report.stop,
        processed = report.stats.processed,
        matched = report.stats.matched,
        scrolls = report.stats.scrolls,
        "done"
    );
    Ok(report)
}

fn cancelled_before_start() -> TraversalReport {
    info!(target: "trawl.traversal", "cancelled before the traversal started");
    TraversalReport {
        stop: StopReason::Cancelled,
        cycles: 0,
        stats: TraversalStats::default(),
    }
}
