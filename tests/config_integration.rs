//! Integration tests for configuration loading

use std::fs;
use std::time::Duration;

use secbuddy::cli::Config;
use tempfile::TempDir;

#[test]
fn test_config_file_with_custom_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.toml");
    fs::write(
        &catalog_path,
        r#"
[[questions]]
id = "routerPassword"
prompt = "Have you changed the router admin password?"

[[questions.options]]
label = "Yes"
points = 25

[[questions.options]]
label = "No"
points = 5
recommendation = "Change the default router admin password."
"#,
    )
    .unwrap();

    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[assessment]
processing_delay_ms = 500
catalog_path = "{}"

[telemetry]
tick_interval_ms = 1000
seed = 3
"#,
            catalog_path.display()
        ),
    )
    .unwrap();

    let config = Config::load(Some(config_path)).unwrap();
    let driver = config.driver_config();
    assert_eq!(driver.processing_delay, Duration::from_millis(500));
    assert_eq!(driver.telemetry.tick_interval, Duration::from_secs(1));
    assert_eq!(driver.telemetry.seed, Some(3));

    let catalog = config.load_catalog().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.max_score(), 25);
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[telemetry]\nunstable_probability = 2.0\n").unwrap();

    assert!(Config::load(Some(path)).is_err());
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let mut config = Config::default();
    config.assessment.catalog_path = Some("/nonexistent/catalog.toml".to_string());
    assert!(config.load_catalog().is_err());
}

#[test]
fn test_defaults_round_trip_through_toml() {
    let config = Config::default();
    let text = config.to_toml().unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.telemetry.download_min, 20);
    assert_eq!(parsed.telemetry.download_max, 99);
    assert_eq!(parsed.chat.model, config.chat.model);
}
