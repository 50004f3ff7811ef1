//! Loader for Skyfeed settings with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, a YAML file, then
//! `SKYFEED__<SECTION>__<KEY>` environment variables. Command-line flags are
//! applied on top by the binary. `${VAR}` placeholders inside string values
//! are expanded after the sources are merged.
//!
//! ```yaml
//! feed:
//!   actor: alice.bsky.social
//!   days: 30
//!   output: data/bluesky_feed.json
//!   max_pages: 20
//!   timeout_secs: 20.0
//!   page_size: 100
//! filters:
//!   self_site_domain: example.blog
//!   book_activity_prefixes: ["started reading:", "reading:", "finished reading:"]
//! api:
//!   base_url: https://public.api.bsky.app
//! ```
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_CONFIG_FILE: &str = "skyfeed.yaml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct SkyfeedConfig {
    pub feed: FeedSettings,
    pub filters: FilterSettings,
    pub api: ApiSettings,
}

/// What to fetch and where to write it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub actor: Option<String>,
    /// Lookback window. Signed so that bad input can be reported rather than
    /// rejected by the parser.
    pub days: i64,
    pub output: PathBuf,
    pub max_pages: i64,
    pub timeout_secs: f64,
    pub page_size: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            actor: None,
            days: 30,
            output: PathBuf::from("data/bluesky_feed.json"),
            max_pages: 20,
            timeout_secs: 20.0,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Posts linking to this domain are treated as self-promotion.
    pub self_site_domain: String,
    /// Case-insensitive prefixes of automated reading-tracker posts.
    pub book_activity_prefixes: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            self_site_domain: "hunsanger.blog".into(),
            book_activity_prefixes: vec![
                "started reading:".into(),
                "reading:".into(),
                "finished reading:".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://public.api.bsky.app".into(),
        }
    }
}

impl SkyfeedConfig {
    /// Reject settings that would make a run meaningless. Runs before any I/O.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let feed = &self.feed;
        if feed.actor.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(SettingsError::Invalid("--actor is required".into()));
        }
        if feed.days <= 0 {
            return Err(SettingsError::Invalid(
                "--days must be greater than 0".into(),
            ));
        }
        if feed.max_pages <= 0 {
            return Err(SettingsError::Invalid(
                "--max-pages must be greater than 0".into(),
            ));
        }
        if !feed.timeout_secs.is_finite() || feed.timeout_secs <= 0.0 {
            return Err(SettingsError::Invalid(
                "--timeout must be a positive number of seconds".into(),
            ));
        }
        if feed.page_size == 0 || feed.page_size > MAX_PAGE_SIZE {
            return Err(SettingsError::Invalid(format!(
                "feed.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

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
pub struct SkyfeedConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SkyfeedConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SkyfeedConfigLoader {
    /// Start from built-in defaults. Environment overrides are layered on in
    /// [`SkyfeedConfigLoader::load`], so they beat every file source.
    ///
    /// ```
    /// use skyfeed_config::SkyfeedConfigLoader;
    ///
    /// let config = SkyfeedConfigLoader::new()
    ///     .with_yaml_str("feed:\n  actor: alice.example\n  days: 7")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.feed.actor.as_deref(), Some("alice.example"));
    /// assert_eq!(config.feed.days, 7);
    /// assert_eq!(config.feed.max_pages, 20);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is read only if present.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into typed settings.
    ///
    /// ```
    /// use skyfeed_config::SkyfeedConfigLoader;
    ///
    /// unsafe { std::env::set_var("SITE_DOMAIN", "example.blog"); }
    ///
    /// let config = SkyfeedConfigLoader::new()
    ///     .with_yaml_str("filters:\n  self_site_domain: \"${SITE_DOMAIN}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.filters.self_site_domain, "example.blog");
    /// assert_eq!(config.filters.book_activity_prefixes.len(), 3);
    ///
    /// unsafe { std::env::remove_var("SITE_DOMAIN"); }
    /// ```
    pub fn load(self) -> Result<SkyfeedConfig, SettingsError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SKYFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("filters.book_activity_prefixes"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SkyfeedConfig = serde_json::from_value(v)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
