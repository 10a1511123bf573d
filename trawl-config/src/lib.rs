//! Loader for trawl configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML file (if any),
//! inline YAML snippets, `TRAWL__SECTION__KEY` environment variables, and
//! finally `APPIUM_HOST` / `APPIUM_PORT`. `${VAR}` placeholders in any string
//! value are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::path::Path;

mod schema;

pub use schema::{
    AppiumConfig, CapabilityConfig, ContainerSelector, DetailConfig, LoggingConfig, MatchConfig,
    SelectorConfig, TraversalConfig, TrawlConfig,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TrawlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    inline: Vec<String>,
}

impl Default for TrawlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrawlConfigLoader {
    /// Start from defaults; sources are layered on by the `with_*` methods.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// let config = TrawlConfigLoader::new()
    ///     .with_yaml_str("matching:\n  keywords: [chiikawa]")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.matching.keywords, vec!["chiikawa".to_string()]);
    /// assert_eq!(config.appium.port, 4723);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            inline: Vec::new(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so env-only deployments still load.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use trawl_config::TrawlConfigLoader;
    ///
    /// temp_env::with_vars([("APPIUM_HOST", Some("10.0.0.7")), ("APPIUM_PORT", Some("4725"))], || {
    ///     let config = TrawlConfigLoader::new()
    ///         .with_yaml_str("appium:\n  host: ignored\n  port: 1")
    ///         .load()
    ///         .expect("valid configuration");
    ///
    ///     assert_eq!(config.appium.host, "10.0.0.7");
    ///     assert_eq!(config.appium.port, 4725);
    /// });
    /// ```
    pub fn load(self) -> Result<TrawlConfig, ConfigError> {
        let mut builder = self.builder;
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("TRAWL")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder.set_override_option("appium.host", std::env::var("APPIUM_HOST").ok())?;
        let port = match std::env::var("APPIUM_PORT") {
            Ok(raw) => Some(raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::Message(format!("APPIUM_PORT is not a port number ({raw:?}): {e}"))
            })?),
            Err(_) => None,
        };
        builder = builder.set_override_option("appium.port", port)?;

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TrawlConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("PKG", Some("com.example")), ("VIEW", Some("list"))], || {
            let mut v = json!(["$PKG", { "id": "${PKG}:id/${VIEW}" }, 7, false, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["com.example", { "id": "com.example:id/list" }, 7, false, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn capabilities_render_with_vendor_prefix() {
        let mut caps = CapabilityConfig::default();
        caps.extra.insert("udid".into(), json!("emulator-5554"));
        caps.extra.insert("appium:skipServerInstallation".into(), json!(true));
        let w3c = caps.to_w3c();

        assert_eq!(w3c["platformName"], json!("Android"));
        assert_eq!(w3c["appium:automationName"], json!("UiAutomator2"));
        assert_eq!(w3c["appium:appPackage"], json!("com.taobao.idlefish"));
        assert_eq!(w3c["appium:newCommandTimeout"], json!(60));
        assert_eq!(w3c["appium:udid"], json!("emulator-5554"));
        assert_eq!(w3c["appium:skipServerInstallation"], json!(true));
        assert!(!w3c.contains_key("automationName"));
    }

    #[test]
    fn validation_rejects_missing_container_strategies() {
        let mut cfg = TrawlConfig::default();
        cfg.selectors.container.resource_id = None;
        cfg.selectors.container.class_name = Some("  ".into());
        assert!(cfg.validate().is_err());

        cfg.selectors.container.class_name = Some("android.widget.ListView".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_scroll_percent() {
        let mut cfg = TrawlConfig::default();
        cfg.traversal.scroll_percent = 1.5;
        assert!(cfg.validate().is_err());
        cfg.traversal.scroll_percent = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(trawl_common::TrawlError::Config(msg)) if msg.contains("scroll_percent")
        ));
    }
}
