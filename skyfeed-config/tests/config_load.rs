use skyfeed_config::{SettingsError, SkyfeedConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

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
feed:
  actor: "${SKYFEED_TEST_ACTOR}"
  days: 14
  max_pages: 5
  timeout_secs: 7.5
filters:
  self_site_domain: example.blog
  book_activity_prefixes:
    - "now reading:"
  "#;
    let p = write_yaml(&tmp, "skyfeed.yaml", file_yaml);

    let config = temp_env::with_var("SKYFEED_TEST_ACTOR", Some("alice.example"), || {
        SkyfeedConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load settings")
    });

    assert_eq!(config.feed.actor.as_deref(), Some("alice.example"));
    assert_eq!(config.feed.days, 14);
    assert_eq!(config.feed.max_pages, 5);
    assert_eq!(config.feed.timeout_secs, 7.5);
    assert_eq!(config.feed.page_size, 100);
    assert_eq!(config.filters.self_site_domain, "example.blog");
    assert_eq!(config.filters.book_activity_prefixes, vec!["now reading:"]);
    assert_eq!(config.api.base_url, "https://public.api.bsky.app");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "skyfeed.yaml", "feed:\n  actor: alice.example\n  days: 14\n");

    let config = temp_env::with_vars(
        [
            ("SKYFEED__FEED__DAYS", Some("3")),
            ("SKYFEED__API__BASE_URL", Some("http://localhost:9999")),
        ],
        || SkyfeedConfigLoader::new().with_file(&p).load().unwrap(),
    );

    assert_eq!(config.feed.days, 3);
    assert_eq!(config.api.base_url, "http://localhost:9999");
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = SkyfeedConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("optional file may be absent");

    assert_eq!(config.feed.days, 30);
    assert!(config.feed.actor.is_none());
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = SkyfeedConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();

    assert!(matches!(result, Err(SettingsError::Load(_))));
}
