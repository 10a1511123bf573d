use std::time::Duration;

use trawl_config::{DetailConfig, TrawlConfig};
use trawl_drivers::{Locator, LocatorSpec};

use crate::page::PageSignature;

/// Everything the traversal loop needs to know about the list and its
/// timing, resolved from configuration once at startup.
#[derive(Debug, Clone)]
pub struct TraversalSettings {
    /// Resource id first, class name as fallback.
    pub container: LocatorSpec,
    /// Direct children of the container that count as rows.
    pub row: Locator,
    /// Descendants of a row that may carry its title.
    pub title: Locator,
    pub cycle_pause: Duration,
    pub scroll_percent: f64,
    pub scroll_settle: Duration,
    pub max_idle_scrolls: Option<u32>,
    pub detail: DetailSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailSettings {
    /// Checked after the tap; dwell and back only happen once it shows up.
    pub page: PageSignature,
    pub open_timeout: Duration,
    pub settle: Duration,
    pub scrolls_min: u32,
    pub scrolls_max: u32,
    pub scroll_pause_min_ms: u64,
    pub scroll_pause_max_ms: u64,
    pub back_settle: Duration,
}

impl DetailSettings {
    /// No page check, no dwell, no scrolling.
    pub fn immediate() -> Self {
        Self {
            page: PageSignature::new("detail", Vec::new()),
            open_timeout: Duration::ZERO,
            settle: Duration::ZERO,
            scrolls_min: 0,
            scrolls_max: 0,
            scroll_pause_min_ms: 0,
            scroll_pause_max_ms: 0,
            back_settle: Duration::ZERO,
        }
    }
}

impl From<&DetailConfig> for DetailSettings {
    fn from(cfg: &DetailConfig) -> Self {
        Self {
            page: PageSignature::from_resource_ids("detail", &cfg.identifiers),
            open_timeout: Duration::from_millis(cfg.open_timeout_ms),
            settle: Duration::from_millis(cfg.settle_ms),
            scrolls_min: cfg.scrolls_min,
            scrolls_max: cfg.scrolls_max,
            scroll_pause_min_ms: cfg.scroll_pause_min_ms,
            scroll_pause_max_ms: cfg.scroll_pause_max_ms,
            back_settle: Duration::from_millis(cfg.back_settle_ms),
        }
    }
}

impl TraversalSettings {
    /// Settings with every pause set to zero, the default scroll percent and
    /// idle limit.
    ///
    /// ```
    /// use trawl_crawler::TraversalSettings;
    /// use trawl_drivers::LocatorSpec;
    ///
    /// let container = LocatorSpec::new().with_resource_id("com.example:id/list");
    /// let settings = TraversalSettings::new(container, "android.widget.FrameLayout", "android.widget.TextView");
    /// assert_eq!(settings.max_idle_scrolls, Some(5));
    /// assert!(settings.cycle_pause.is_zero());
    /// ```
    pub fn new(container: LocatorSpec, row_class: &str, title_class: &str) -> Self {
        Self {
            container,
            row: Locator::class_name(row_class),
            title: Locator::class_name(title_class),
            cycle_pause: Duration::ZERO,
            scroll_percent: 0.6,
            scroll_settle: Duration::ZERO,
            max_idle_scrolls: Some(5),
            detail: DetailSettings::immediate(),
        }
    }
}

impl From<&TrawlConfig> for TraversalSettings {
    fn from(cfg: &TrawlConfig) -> Self {
        let selectors = &cfg.selectors;
        let mut container = LocatorSpec::new();
        container.resource_id = selectors.container.resource_id.clone();
        container.class_name = selectors.container.class_name.clone();

        let traversal = &cfg.traversal;
        Self {
            container,
            row: Locator::class_name(selectors.row_class.as_str()),
            title: Locator::class_name(selectors.title_class.as_str()),
            cycle_pause: Duration::from_millis(traversal.cycle_pause_ms),
            scroll_percent: traversal.scroll_percent,
            scroll_settle: Duration::from_millis(traversal.scroll_settle_ms),
            max_idle_scrolls: traversal.max_idle_scrolls,
            detail: DetailSettings::from(&cfg.detail),
        }
    }
}
