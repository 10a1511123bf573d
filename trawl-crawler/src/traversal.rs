//! The list traversal loop.
//!
//! Each cycle re-locates the list, takes one snapshot of its rows and walks
//! it in order. Rows are identified by their on-screen bounds, remembered in
//! a [`SeenSet`] until the page advances. A cycle that finds nothing new
//! scrolls the list and starts a fresh page.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trawl_common::{Result, TrawlError};
use trawl_drivers::gesture::{GestureEngine, ScrollDirection, ScrollOutcome, SwipeSpan};
use trawl_drivers::pacing::Pacing;
use trawl_drivers::resolver::{ElementResolver, Resolved};
use trawl_drivers::{Bounds, ElementId, MobileSession};

use crate::policy::MatchPolicy;
use crate::seen::SeenSet;
use crate::settings::TraversalSettings;

/// Running totals for one traversal. Reporting only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub processed: u64,
    pub matched: u64,
    pub scrolls: u64,
}

/// How a single row was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Bounds already seen on this page.
    Seen,
    /// Present in the snapshot but not displayed; left for a later cycle.
    Hidden,
    New { matched: bool },
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub rows: usize,
    pub new: usize,
    pub seen: usize,
    pub hidden: usize,
    pub matched: usize,
    /// Rows abandoned after a driver error.
    pub failed: usize,
    /// Set when the cycle ended in a scroll.
    pub scroll: Option<ScrollOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    /// Too many consecutive scrolls reported no movement.
    EndOfList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalReport {
    pub stop: StopReason,
    pub cycles: u64,
    pub stats: TraversalStats,
}

pub struct ListTraversal {
    session: Arc<dyn MobileSession>,
    resolver: ElementResolver,
    gestures: GestureEngine,
    policy: MatchPolicy,
    settings: TraversalSettings,
    pacing: Pacing,
    seen: SeenSet,
    stats: TraversalStats,
    idle_scrolls: u32,
}

impl ListTraversal {
    pub fn new(
        session: Arc<dyn MobileSession>,
        policy: MatchPolicy,
        settings: TraversalSettings,
    ) -> Self {
        Self {
            resolver: ElementResolver::new(session.clone()),
            gestures: GestureEngine::new(session.clone()),
            session,
            policy,
            settings,
            pacing: Pacing::new(),
            seen: SeenSet::new(),
            stats: TraversalStats::default(),
            idle_scrolls: 0,
        }
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Block until the list container is on screen, for at most `timeout`.
    pub async fn wait_for_container(&self, timeout: Duration) -> Result<()> {
        match self
            .resolver
            .wait_until_present(&self.settings.container, timeout)
            .await?
        {
            Some(found) => {
                info!(target: "trawl.traversal", locator = %found.locator, "list container is present");
                Ok(())
            }
            None => Err(TrawlError::ContainerNotFound(format!(
                "{} (waited {timeout:?})",
                self.settings.container
            ))),
        }
    }

    /// Cycle until cancelled or the list stops moving.
    ///
    /// Errors are returned only for failures outside a single row: the
    /// container going missing, or the snapshot or scroll call failing.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<TraversalReport> {
        let mut cycles = 0u64;
        info!(target: "trawl.traversal", keywords = ?self.policy.keywords(), "traversal started");

        let stop = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let report = match self.run_cycle(cancel).await {
                Ok(report) => report,
                Err(TrawlError::Cancelled) => break StopReason::Cancelled,
                Err(err) => {
                    warn!(target: "trawl.traversal", error = %err, cycles, "traversal aborted");
                    return Err(err);
                }
            };
            cycles += 1;
            debug!(target: "trawl.traversal", cycle = cycles, ?report, "cycle finished");

            if report.scroll == Some(ScrollOutcome::NoMovement) && self.idle_limit_reached() {
                info!(
                    target: "trawl.traversal",
                    idle_scrolls = self.idle_scrolls,
                    "list stopped moving; treating as end of content"
                );
                break StopReason::EndOfList;
            }

            if !self.pacing.pause(self.settings.cycle_pause, cancel).await {
                break StopReason::Cancelled;
            }
        };

        info!(
            target: "trawl.traversal",
            ?stop,
            cycles,
            processed = self.stats.processed,
            matched = self.stats.matched,
            scrolls = self.stats.scrolls,
            "traversal finished"
        );
        Ok(TraversalReport {
            stop,
            cycles,
            stats: self.stats,
        })
    }

    /// One pass over the current snapshot, followed by a scroll if nothing
    /// new turned up.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<CycleReport> {
        let container = self.locate_container().await?;
        let rows = self
            .session
            .find_child_elements(&container.element, &self.settings.row)
            .await?;

        let mut report = CycleReport {
            rows: rows.len(),
            ..CycleReport::default()
        };
        for row in &rows {
            match self.process_row(row, cancel).await {
                Ok(RowOutcome::Seen) => report.seen += 1,
                Ok(RowOutcome::Hidden) => report.hidden += 1,
                Ok(RowOutcome::New { matched }) => {
                    report.new += 1;
                    if matched {
                        report.matched += 1;
                    }
                }
                Err(TrawlError::Cancelled) => return Err(TrawlError::Cancelled),
                Err(err) => {
                    warn!(target: "trawl.traversal", %row, error = %err, "row abandoned");
                    report.failed += 1;
                }
            }
        }

        if report.new == 0 {
            report.scroll = Some(self.scroll_page(cancel).await?);
        }
        Ok(report)
    }

    async fn locate_container(&self) -> Result<Resolved> {
        self.resolver
            .resolve(&self.settings.container)
            .await?
            .ok_or_else(|| TrawlError::ContainerNotFound(self.settings.container.to_string()))
    }

    async fn process_row(&mut self, row: &ElementId, cancel: &CancellationToken) -> Result<RowOutcome> {
        let bounds = self.session.bounds(row).await?;
        if self.seen.contains(&bounds) {
            return Ok(RowOutcome::Seen);
        }
        if !self.session.is_displayed(row).await? {
            debug!(target: "trawl.traversal", %bounds, "row not displayed");
            return Ok(RowOutcome::Hidden);
        }

        let title = self.extract_title(row).await;
        info!(target: "trawl.traversal", %bounds, title = %title, "row");

        let matched = self.policy.is_match(&title);
        if matched {
            info!(target: "trawl.traversal", %bounds, title = %title, "match; opening detail");
            self.visit_detail(bounds, cancel).await?;
        }

        // Counted only once committed to the page.
        self.seen.insert(bounds);
        self.stats.processed += 1;
        if matched {
            self.stats.matched += 1;
        }
        Ok(RowOutcome::New { matched })
    }

    /// Text of the first title-class descendant of `row`, or `""` when there
    /// is none or it can't be read.
    async fn extract_title(&self, row: &ElementId) -> String {
        let first = match self
            .session
            .find_child_elements(row, &self.settings.title)
            .await
        {
            Ok(candidates) => candidates.into_iter().next(),
            Err(err) => {
                warn!(target: "trawl.traversal", %row, error = %err, "title lookup failed");
                return String::new();
            }
        };
        let Some(title) = first else {
            debug!(target: "trawl.traversal", %row, "row has no title element");
            return String::new();
        };

        match self.session.text(&title).await {
            Ok(text) => text,
            Err(err) => {
                warn!(target: "trawl.traversal", %title, error = %err, "reading title failed");
                String::new()
            }
        }
    }

    /// Tap the row and, once the detail page is confirmed open, dwell on it
    /// and navigate back. A tap that opens nothing leaves the list alone.
    async fn visit_detail(&self, bounds: Bounds, cancel: &CancellationToken) -> Result<()> {
        let detail = &self.settings.detail;
        let (x, y) = bounds.center();
        self.gestures.tap(x.into(), y.into()).await?;
        self.pause(detail.settle, cancel).await?;

        if !detail.page.wait_for(&self.resolver, detail.open_timeout).await? {
            warn!(
                target: "trawl.traversal",
                %bounds,
                page = %detail.page,
                timeout = ?detail.open_timeout,
                "detail page did not open; staying on the list"
            );
            return Ok(());
        }

        let scrolls = self.pacing.pick_count(detail.scrolls_min, detail.scrolls_max);
        for n in 1..=scrolls {
            debug!(target: "trawl.traversal", n, scrolls, "scrolling detail page");
            self.gestures.swipe_up(SwipeSpan::default()).await?;
            let gap = self
                .pacing
                .pick(detail.scroll_pause_min_ms, detail.scroll_pause_max_ms);
            self.pause(gap, cancel).await?;
        }

        self.session.back().await?;
        self.pause(detail.back_settle, cancel).await
    }

    /// Scroll the list one step and start a new page.
    async fn scroll_page(&mut self, cancel: &CancellationToken) -> Result<ScrollOutcome> {
        let container = self.locate_container().await?;
        let outcome = self
            .gestures
            .scroll_element(
                &container.element,
                ScrollDirection::Up,
                self.settings.scroll_percent,
            )
            .await?;

        self.seen.clear();
        self.stats.scrolls += 1;
        match outcome {
            ScrollOutcome::Moved => self.idle_scrolls = 0,
            ScrollOutcome::NoMovement => {
                self.idle_scrolls += 1;
                warn!(
                    target: "trawl.traversal",
                    idle_scrolls = self.idle_scrolls,
                    "scroll reported no movement; likely reached the end of content"
                );
            }
        }
        info!(
            target: "trawl.traversal",
            processed = self.stats.processed,
            matched = self.stats.matched,
            scrolls = self.stats.scrolls,
            "scrolled"
        );

        self.pause(self.settings.scroll_settle, cancel).await?;
        Ok(outcome)
    }

    fn idle_limit_reached(&self) -> bool {
        matches!(self.settings.max_idle_scrolls, Some(limit) if self.idle_scrolls >= limit)
    }

    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        if self.pacing.pause(duration, cancel).await {
            Ok(())
        } else {
            Err(TrawlError::Cancelled)
        }
    }
}
