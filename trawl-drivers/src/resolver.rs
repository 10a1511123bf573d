//! Multi-strategy element resolution.
//!
//! A [`LocatorSpec`] names up to four ways to find one logical element. The
//! resolver walks them in fixed order and returns the first match that is
//! currently displayed. "Nothing found" is `Ok(None)`, never an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use trawl_common::{Result, TrawlError};

use crate::gesture::{GestureEngine, SwipeSpan};
use crate::locator::{Locator, LocatorSpec};
use crate::session::{ElementId, MobileSession};

/// Poll interval for the `wait_until_*` helpers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A displayed element and the locator that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub element: ElementId,
    pub locator: Locator,
}

/// Side effect to perform between failed resolution attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recovery {
    None,
    /// Swipe up in case the element is below the fold. A heuristic: it can
    /// just as well scroll a visible target away.
    SwipeUp(SwipeSpan),
}

#[derive(Clone)]
pub struct ElementResolver {
    session: Arc<dyn MobileSession>,
    gestures: GestureEngine,
    poll_interval: Duration,
}

impl ElementResolver {
    pub fn new(session: Arc<dyn MobileSession>) -> Self {
        Self {
            gestures: GestureEngine::new(session.clone()),
            session,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// First displayed match across `spec`'s strategies, in order.
    ///
    /// A lookup error or a hidden match moves on to the next strategy.
    pub async fn resolve(&self, spec: &LocatorSpec) -> Result<Option<Resolved>> {
        for locator in spec.candidates() {
            let element = match self.session.find_element(&locator).await {
                Ok(Some(element)) => element,
                Ok(None) => {
                    debug!(target: "trawl.resolver", %locator, "no match");
                    continue;
                }
                Err(err) => {
                    warn!(target: "trawl.resolver", %locator, error = %err, "lookup failed; trying next strategy");
                    continue;
                }
            };

            match self.session.is_displayed(&element).await {
                Ok(true) => {
                    debug!(target: "trawl.resolver", %locator, %element, "resolved");
                    return Ok(Some(Resolved { element, locator }));
                }
                Ok(false) => {
                    debug!(target: "trawl.resolver", %locator, %element, "match not displayed");
                }
                Err(err) => {
                    warn!(target: "trawl.resolver", %locator, error = %err, "visibility check failed; trying next strategy");
                }
            }
        }
        Ok(None)
    }

    /// [`resolve`](Self::resolve) up to `max_attempts` times, running
    /// `recovery` between a miss and the next attempt.
    pub async fn resolve_with_retry(
        &self,
        spec: &LocatorSpec,
        max_attempts: u32,
        recovery: Recovery,
    ) -> Result<Option<Resolved>> {
        let attempts = max_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(found) = self.resolve(spec).await? {
                return Ok(Some(found));
            }
            if attempt < attempts {
                debug!(target: "trawl.resolver", %spec, attempt, "not found; recovering before retry");
                self.recover(recovery).await?;
            }
        }
        Ok(None)
    }

    /// Resolve and click, swiping up between attempts.
    ///
    /// Returns `Ok(false)` when the element never showed up. Driver failures
    /// from the click or the recovery swipe don't stop the retries; the last
    /// one is returned once all attempts are spent.
    pub async fn click_with_retry(&self, spec: &LocatorSpec, max_attempts: u32) -> Result<bool> {
        let attempts = max_attempts.max(1);
        let mut last_err: Option<TrawlError> = None;

        for attempt in 1..=attempts {
            if let Some(found) = self.resolve(spec).await? {
                match self.session.click(&found.element).await {
                    Ok(()) => {
                        debug!(target: "trawl.resolver", %spec, attempt, "clicked");
                        return Ok(true);
                    }
                    Err(err) if err.is_not_found() => {
                        debug!(target: "trawl.resolver", %spec, attempt, "element vanished before click");
                    }
                    Err(err) => {
                        warn!(target: "trawl.resolver", %spec, attempt, error = %err, "click failed");
                        last_err = Some(err);
                    }
                }
            }

            if attempt < attempts {
                if let Err(err) = self.recover(Recovery::SwipeUp(SwipeSpan::default())).await {
                    warn!(target: "trawl.resolver", %spec, attempt, error = %err, "recovery swipe failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => Ok(false),
        }
    }

    /// Poll until nothing in `spec` resolves. `Ok(false)` on timeout.
    pub async fn wait_until_absent(&self, spec: &LocatorSpec, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.resolve(spec).await?.is_none() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!(target: "trawl.resolver", %spec, ?timeout, "still present at deadline");
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Poll until `spec` resolves. `Ok(None)` on timeout.
    pub async fn wait_until_present(
        &self,
        spec: &LocatorSpec,
        timeout: Duration,
    ) -> Result<Option<Resolved>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.resolve(spec).await? {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                debug!(target: "trawl.resolver", %spec, ?timeout, "still absent at deadline");
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn recover(&self, recovery: Recovery) -> Result<()> {
        match recovery {
            Recovery::None => Ok(()),
            Recovery::SwipeUp(span) => self.gestures.swipe_up(span).await,
        }
    }
}
