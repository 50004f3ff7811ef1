//! Wires settings, the Bluesky client, the collector and the output writer.
use crate::cli::Cli;
use skyfeed_common::{Result, SkyfeedError};
use skyfeed_config::{DEFAULT_CONFIG_FILE, SkyfeedConfig, SkyfeedConfigLoader};
use skyfeed_social::bluesky::{
    BlueskyApi, CollectOptions, ContentFilters, FeedCollector, FeedDocument, write_document,
};
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug)]
pub struct RunSummary {
    pub posts: usize,
    pub output: PathBuf,
}

/// Settings validated and narrowed to what a run needs.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub actor: String,
    pub days: u32,
    pub max_pages: u32,
    pub timeout: Duration,
    pub page_size: u32,
    pub base_url: String,
    pub output: PathBuf,
    pub filters: ContentFilters,
}

/// Load file + env settings, apply flags, and validate. No network I/O.
pub fn load_settings(cli: &Cli) -> Result<SkyfeedConfig> {
    let loader = match &cli.config {
        Some(path) => SkyfeedConfigLoader::new().with_file(path),
        None => SkyfeedConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg = loader
        .load()
        .map_err(|e| SkyfeedError::Config(e.to_string()))?;
    cli.apply(&mut cfg);
    cfg.validate()
        .map_err(|e| SkyfeedError::Config(e.to_string()))?;
    Ok(cfg)
}

impl RunPlan {
    pub fn from_settings(cfg: &SkyfeedConfig) -> Result<Self> {
        let narrow = |value: i64, flag: &str| {
            u32::try_from(value).map_err(|_| SkyfeedError::Config(format!("{flag} is out of range")))
        };
        Ok(Self {
            actor: cfg.feed.actor.clone().unwrap_or_default().trim().to_string(),
            days: narrow(cfg.feed.days, "--days")?,
            max_pages: narrow(cfg.feed.max_pages, "--max-pages")?,
            timeout: Duration::try_from_secs_f64(cfg.feed.timeout_secs)
                .map_err(|e| SkyfeedError::Config(format!("--timeout: {e}")))?,
            page_size: cfg.feed.page_size,
            base_url: cfg.api.base_url.clone(),
            output: cfg.feed.output.clone(),
            filters: ContentFilters::new(
                &cfg.filters.self_site_domain,
                &cfg.filters.book_activity_prefixes,
            ),
        })
    }
}

/// Fetch, filter and write. Nothing is written when collection fails.
pub async fn run(plan: RunPlan) -> Result<RunSummary> {
    let api = BlueskyApi::new(&plan.base_url, plan.timeout)?.with_page_size(plan.page_size);
    let options = CollectOptions::new(plan.days, plan.max_pages, OffsetDateTime::now_utc())
        .with_filters(plan.filters.clone());

    tracing::info!(
        actor = %plan.actor,
        days = plan.days,
        max_pages = plan.max_pages,
        timeout_ms = u64::try_from(plan.timeout.as_millis()).unwrap_or(u64::MAX),
        "skyfeed.run.start"
    );

    let posts = FeedCollector::new(api, options).collect(&plan.actor).await?;

    let doc = FeedDocument::new(&plan.actor, plan.days, OffsetDateTime::now_utc(), posts);
    write_document(&plan.output, &doc)?;

    Ok(RunSummary {
        posts: doc.posts.len(),
        output: plan.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(args: &[&str]) -> Result<SkyfeedConfig> {
        let mut argv = vec!["skyfeed"];
        argv.extend_from_slice(args);
        load_settings(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        for args in [
            &["--actor", "alice.example", "--days", "0"][..],
            &["--actor", "alice.example", "--max-pages", "-2"][..],
            &["--actor", "alice.example", "--timeout", "0"][..],
            &["--days", "5"][..],
        ] {
            let err = settings(args).unwrap_err();
            assert!(matches!(err, SkyfeedError::Config(_)), "{args:?}");
            assert_eq!(err.exit_code().code(), 2);
        }
    }

    #[test]
    fn plan_narrows_validated_settings() {
        let cfg = settings(&["--actor", " alice.example ", "--days", "7", "--timeout", "1.5"]).unwrap();
        let plan = RunPlan::from_settings(&cfg).unwrap();

        assert_eq!(plan.actor, "alice.example");
        assert_eq!(plan.days, 7);
        assert_eq!(plan.max_pages, 20);
        assert_eq!(plan.timeout, Duration::from_millis(1500));
        assert_eq!(plan.page_size, 100);
        assert_eq!(plan.filters, ContentFilters::default());
    }

    #[test]
    fn huge_day_counts_are_rejected() {
        let cfg = settings(&["--actor", "a", "--days", "99999999999"]).unwrap();
        assert!(matches!(RunPlan::from_settings(&cfg), Err(SkyfeedError::Config(_))));
    }

    #[test]
    fn missing_explicit_config_file_is_a_config_error() {
        let err = settings(&["--actor", "a", "--config", "/nonexistent/skyfeed.yaml"]).unwrap_err();
        assert!(matches!(err, SkyfeedError::Config(_)));
    }

    #[tokio::test]
    async fn unrepresentable_day_window_is_a_config_error() {
        let cfg = settings(&["--actor", "a", "--days", "5000000"]).unwrap();
        let mut plan = RunPlan::from_settings(&cfg).unwrap();
        let output = std::env::temp_dir()
            .join(format!("skyfeed-days-{}", std::process::id()))
            .join("feed.json");
        plan.base_url = "http://127.0.0.1:9".into();
        plan.output = output.clone();

        let err = run(plan).await.unwrap_err();

        assert!(matches!(err, SkyfeedError::Config(_)));
        assert_eq!(err.exit_code().code(), 2);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn failed_fetch_writes_nothing() {
        let tmp = std::env::temp_dir().join(format!("skyfeed-test-{}", std::process::id()));
        let output = tmp.join("feed.json");
        let plan = RunPlan {
            actor: "alice.example".into(),
            days: 30,
            max_pages: 1,
            timeout: Duration::from_millis(500),
            page_size: 100,
            base_url: "http://127.0.0.1:9".into(),
            output: output.clone(),
            filters: ContentFilters::default(),
        };

        let err = run(plan).await.unwrap_err();

        assert!(matches!(err, SkyfeedError::Fetch(_)));
        assert!(!output.exists());
    }
}
