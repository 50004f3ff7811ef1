use clap::Parser;
use skyfeed_config::SkyfeedConfig;
use std::path::PathBuf;

/// Fetch Bluesky posts and write Hugo data JSON.
#[derive(Debug, Parser)]
#[command(name = "skyfeed", version)]
pub struct Cli {
    /// Bluesky handle (e.g. alice.bsky.social).
    #[arg(long)]
    pub actor: Option<String>,

    /// Only include posts from the last N days [default: 30].
    #[arg(long, allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Output JSON path [default: data/bluesky_feed.json].
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Maximum paginated API pages to fetch [default: 20].
    #[arg(long, allow_negative_numbers = true)]
    pub max_pages: Option<i64>,

    /// HTTP timeout in seconds [default: 20.0].
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Settings file; when omitted `skyfeed.yaml` is read if present.
    #[arg(long, env = "SKYFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror logs to stderr.
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Flags win over every other settings source.
    pub fn apply(&self, cfg: &mut SkyfeedConfig) {
        if let Some(actor) = &self.actor {
            cfg.feed.actor = Some(actor.clone());
        }
        if let Some(days) = self.days {
            cfg.feed.days = days;
        }
        if let Some(output) = &self.output {
            cfg.feed.output = output.clone();
        }
        if let Some(max_pages) = self.max_pages {
            cfg.feed.max_pages = max_pages;
        }
        if let Some(timeout) = self.timeout {
            cfg.feed.timeout_secs = timeout;
        }
    }
}
