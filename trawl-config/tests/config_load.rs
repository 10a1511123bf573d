use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use trawl_common::observability::LogFormat;
use trawl_config::TrawlConfigLoader;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
appium:
  host: appium.internal
  port: 4800
  base_path: /wd/hub
capabilities:
  device_name: "${TRAWL_TEST_DEVICE}"
  app_activity: ~
selectors:
  container:
    resource_id: com.example:id/feed
    class_name: androidx.recyclerview.widget.RecyclerView
  row_class: android.widget.LinearLayout
matching:
  keywords: [chiikawa, 奇卡瓦]
  case_sensitive: false
traversal:
  max_idle_scrolls: ~
logging:
  format: json
"#;
    let p = write_yaml(&tmp, "trawl.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("TRAWL_TEST_DEVICE", Some("Pixel 7")),
            ("APPIUM_HOST", None),
            ("APPIUM_PORT", None),
        ],
        || {
            let config = TrawlConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load trawl config");

            assert_eq!(config.appium.server_url(), "http://appium.internal:4800/wd/hub/");
            assert_eq!(config.capabilities.device_name, "Pixel 7");
            assert!(config.capabilities.app_activity.is_none());
            assert_eq!(
                config.selectors.container.resource_id.as_deref(),
                Some("com.example:id/feed")
            );
            assert_eq!(config.selectors.row_class, "android.widget.LinearLayout");
            assert_eq!(config.selectors.title_class, "android.widget.TextView");
            assert_eq!(config.matching.keywords.len(), 2);
            assert!(!config.matching.case_sensitive);
            assert_eq!(config.traversal.max_idle_scrolls, None);
            assert_eq!(config.traversal.scroll_percent, 0.6);
            assert_eq!(config.logging.format, LogFormat::Json);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let absent = tmp.path().join("nope.yaml");

    temp_env::with_vars([("APPIUM_HOST", None::<&str>), ("APPIUM_PORT", None)], || {
        let config = TrawlConfigLoader::new()
            .with_optional_file(&absent)
            .load()
            .expect("defaults load");

        assert_eq!(config.appium.server_url(), "http://localhost:4723/");
        assert_eq!(config.traversal.max_idle_scrolls, Some(5));
        assert_eq!(config.matching.keywords, vec!["约尔".to_string()]);
        assert!(config.matching.case_sensitive);
    });
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = TrawlConfigLoader::new()
        .with_file(tmp.path().join("nope.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    temp_env::with_vars(
        [
            ("TRAWL__TRAVERSAL__CYCLE_PAUSE_MS", Some("250")),
            ("TRAWL__MATCHING__CASE_SENSITIVE", Some("false")),
            ("APPIUM_HOST", Some("192.168.1.20")),
            ("APPIUM_PORT", Some("4724")),
        ],
        || {
            let config = TrawlConfigLoader::new()
                .with_yaml_str("traversal:\n  cycle_pause_ms: 5000\nappium:\n  host: from-yaml")
                .load()
                .expect("load with env");

            assert_eq!(config.traversal.cycle_pause_ms, 250);
            assert!(!config.matching.case_sensitive);
            assert_eq!(config.appium.host, "192.168.1.20");
            assert_eq!(config.appium.port, 4724);
        },
    );
}

#[test]
#[serial]
fn bad_appium_port_is_rejected() {
    temp_env::with_var("APPIUM_PORT", Some("not-a-port"), || {
        let err = TrawlConfigLoader::new().load().unwrap_err();
        assert!(err.to_string().contains("APPIUM_PORT"));
    });
}

#[test]
#[serial]
fn invalid_values_fail_validation() {
    temp_env::with_vars([("APPIUM_HOST", None::<&str>), ("APPIUM_PORT", None)], || {
        let err = TrawlConfigLoader::new()
            .with_yaml_str("detail:\n  scrolls_min: 4\n  scrolls_max: 2")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("scrolls_min"));
    });
}

#[test]
#[serial]
fn detail_page_identifiers_can_be_replaced() {
    temp_env::with_vars([("APPIUM_HOST", None::<&str>), ("APPIUM_PORT", None)], || {
        let config = TrawlConfigLoader::new()
            .with_yaml_str("detail:\n  identifiers: [com.example:id/goods_title]\n  open_timeout_ms: 800")
            .load()
            .expect("load trawl config");
        assert_eq!(config.detail.identifiers, vec!["com.example:id/goods_title"]);
        assert_eq!(config.detail.open_timeout_ms, 800);
        assert_eq!(config.detail.settle_ms, 2000);
    });
}
