use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use trawl_common::observability::LogFormat;
use trawl_common::{Result, TrawlError};

/// Top-level configuration. Every section has defaults, so an empty source
/// set yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrawlConfig {
    pub appium: AppiumConfig,
    pub capabilities: CapabilityConfig,
    pub selectors: SelectorConfig,
    pub matching: MatchConfig,
    pub traversal: TraversalConfig,
    pub detail: DetailConfig,
    pub logging: LoggingConfig,
}

/// Where the Appium server listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppiumConfig {
    pub host: String,
    pub port: u16,
    /// `/` for Appium 2, `/wd/hub` for Appium 1 servers.
    pub base_path: String,
}

impl Default for AppiumConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 4723,
            base_path: "/".into(),
        }
    }
}

impl AppiumConfig {
    /// Server URL with a trailing slash, ready for relative endpoint joins.
    ///
    /// ```
    /// use trawl_config::AppiumConfig;
    ///
    /// let cfg = AppiumConfig { base_path: "wd/hub".into(), ..AppiumConfig::default() };
    /// assert_eq!(cfg.server_url(), "http://localhost:4723/wd/hub/");
    /// ```
    pub fn server_url(&self) -> String {
        let path = self.base_path.trim_matches('/');
        if path.is_empty() {
            format!("http://{}:{}/", self.host, self.port)
        } else {
            format!("http://{}:{}/{}/", self.host, self.port, path)
        }
    }
}

/// Desired capabilities for the automation session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    pub platform_name: String,
    pub automation_name: String,
    pub device_name: String,
    pub app_package: String,
    pub app_activity: Option<String>,
    pub no_reset: bool,
    pub full_reset: bool,
    pub dont_stop_app_on_reset: bool,
    pub auto_launch: bool,
    pub new_command_timeout_secs: u64,
    /// Passed through verbatim; keys without a vendor prefix get `appium:`.
    pub extra: Map<String, Value>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            platform_name: "Android".into(),
            automation_name: "UiAutomator2".into(),
            device_name: "Android".into(),
            app_package: "com.taobao.idlefish".into(),
            app_activity: Some(".maincontainer.activity.MainFrameworkActivity".into()),
            no_reset: true,
            full_reset: false,
            dont_stop_app_on_reset: true,
            auto_launch: true,
            new_command_timeout_secs: 60,
            extra: Map::new(),
        }
    }
}

impl CapabilityConfig {
    /// Render the W3C capability map Appium expects (`appium:` vendor prefix
    /// on everything except `platformName`).
    pub fn to_w3c(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("platformName".into(), json!(self.platform_name));
        caps.insert("appium:automationName".into(), json!(self.automation_name));
        caps.insert("appium:deviceName".into(), json!(self.device_name));
        caps.insert("appium:appPackage".into(), json!(self.app_package));
        if let Some(activity) = &self.app_activity {
            caps.insert("appium:appActivity".into(), json!(activity));
        }
        caps.insert("appium:noReset".into(), json!(self.no_reset));
        caps.insert("appium:fullReset".into(), json!(self.full_reset));
        caps.insert(
            "appium:dontStopAppOnReset".into(),
            json!(self.dont_stop_app_on_reset),
        );
        caps.insert("appium:autoLaunch".into(), json!(self.auto_launch));
        caps.insert(
            "appium:newCommandTimeout".into(),
            json!(self.new_command_timeout_secs),
        );
        for (key, value) in &self.extra {
            let key = if key.contains(':') || key == "platformName" {
                key.clone()
            } else {
                format!("appium:{key}")
            };
            caps.insert(key, value.clone());
        }
        caps
    }
}

/// Selectors describing the list under traversal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub container: ContainerSelector,
    /// Class name of the container's row children.
    pub row_class: String,
    /// Class name of the text view carrying a row's title.
    pub title_class: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: ContainerSelector::default(),
            row_class: "android.widget.FrameLayout".into(),
            title_class: "android.widget.TextView".into(),
        }
    }
}

/// Primary (resource id) and fallback (class name) container strategies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerSelector {
    pub resource_id: Option<String>,
    pub class_name: Option<String>,
}

impl Default for ContainerSelector {
    fn default() -> Self {
        Self {
            resource_id: Some("com.taobao.idlefish:id/nested_recycler_view".into()),
            class_name: Some("androidx.recyclerview.widget.RecyclerView".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["约尔".into()],
            case_sensitive: true,
        }
    }
}

/// Pacing and stop policy for the traversal loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Pause after every cycle, whichever branch it took.
    pub cycle_pause_ms: u64,
    /// Fraction of the container the native scroll gesture travels.
    pub scroll_percent: f64,
    /// Pause after a scroll so the list can settle.
    pub scroll_settle_ms: u64,
    /// Consecutive no-movement scrolls before the traversal ends.
    /// `null` keeps scrolling forever.
    pub max_idle_scrolls: Option<u32>,
    /// How long to wait for the list to appear at startup.
    pub container_wait_ms: u64,
    /// Pause after bringing the target app to the foreground.
    pub launch_wait_ms: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            cycle_pause_ms: 1000,
            scroll_percent: 0.6,
            scroll_settle_ms: 1500,
            max_idle_scrolls: Some(5),
            container_wait_ms: 10_000,
            launch_wait_ms: 5000,
        }
    }
}

/// What happens on a matched row's detail page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    /// Resource ids that must all be present for the detail page to count
    /// as open. Empty skips the check.
    pub identifiers: Vec<String>,
    pub open_timeout_ms: u64,
    pub settle_ms: u64,
    pub scrolls_min: u32,
    pub scrolls_max: u32,
    pub scroll_pause_min_ms: u64,
    pub scroll_pause_max_ms: u64,
    pub back_settle_ms: u64,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            identifiers: vec![
                "com.taobao.idlefish:id/detail_title".into(),
                "com.taobao.idlefish:id/price_view".into(),
            ],
            open_timeout_ms: 5000,
            settle_ms: 2000,
            scrolls_min: 0,
            scrolls_max: 0,
            scroll_pause_min_ms: 1000,
            scroll_pause_max_ms: 3000,
            back_settle_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
            filter: "info".into(),
        }
    }
}

impl TrawlConfig {
    /// Reject values the traversal can't work with.
    pub fn validate(&self) -> Result<()> {
        let container = &self.selectors.container;
        let has_strategy = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_strategy(&container.resource_id) && !has_strategy(&container.class_name) {
            return Err(TrawlError::Config("selectors.container needs a resource_id or a class_name".into()));
        }
        if self.selectors.row_class.trim().is_empty() {
            return Err(TrawlError::Config("selectors.row_class must not be empty".into()));
        }
        if self.selectors.title_class.trim().is_empty() {
            return Err(TrawlError::Config("selectors.title_class must not be empty".into()));
        }
        let percent = self.traversal.scroll_percent;
        if !(percent > 0.0 && percent <= 1.0) {
            return Err(TrawlError::Config(format!(
                "traversal.scroll_percent must be in (0, 1], got {percent}"
            )));
        }
        if self.detail.scrolls_min > self.detail.scrolls_max {
            return Err(TrawlError::Config("detail.scrolls_min exceeds detail.scrolls_max".into()));
        }
        if self.detail.scroll_pause_min_ms > self.detail.scroll_pause_max_ms {
            return Err(TrawlError::Config("detail.scroll_pause_min_ms exceeds detail.scroll_pause_max_ms".into()));
        }
        if self.capabilities.app_package.trim().is_empty() {
            return Err(TrawlError::Config("capabilities.app_package must not be empty".into()));
        }
        Ok(())
    }
}
