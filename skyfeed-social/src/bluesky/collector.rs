//! Paginated collection of an author's recent, displayable posts.
//!
//! Pages are fetched strictly one after another. Collection stops at the page
//! ceiling, on an empty page, when the source has no further cursor, or after
//! a page that held nothing newer than the cutoff. Any fetch error aborts the
//! run and discards what was gathered so far.
use crate::bluesky::client::FeedSource;
use crate::bluesky::extract::{
    ContentFilters, date_label, extract_quote, format_timestamp, parse_created_at, post_web_url,
};
use crate::bluesky::richtext::render_rich_text_html;
use crate::bluesky::types::{FeedViewPost, Post, PostRecord, PostView, decode_lenient};
use serde_json::Value;
use skyfeed_common::{Result, SkyfeedError};
use std::collections::HashSet;
use time::{Duration, OffsetDateTime};

/// Inputs of one collection run. `now` is injected so runs are reproducible.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub days: u32,
    pub max_pages: u32,
    pub now: OffsetDateTime,
    pub filters: ContentFilters,
}

impl CollectOptions {
    pub fn new(days: u32, max_pages: u32, now: OffsetDateTime) -> Self {
        Self {
            days,
            max_pages,
            now,
            filters: ContentFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: ContentFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Oldest creation time still included. A window reaching past the
    /// representable calendar is a configuration error.
    pub fn cutoff(&self) -> Result<OffsetDateTime> {
        self.now
            .checked_sub(Duration::days(i64::from(self.days)))
            .ok_or_else(|| SkyfeedError::Config(format!("--days {} is out of range", self.days)))
    }
}

/// Why an entry did not make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Repost,
    Malformed,
    MissingTimestamp,
    BeforeCutoff,
    Reply,
    NoUrl,
    Duplicate,
    BookActivity,
    SelfLink,
    Empty,
}

impl Skip {
    fn as_str(self) -> &'static str {
        match self {
            Skip::Repost => "repost",
            Skip::Malformed => "malformed",
            Skip::MissingTimestamp => "missing_timestamp",
            Skip::BeforeCutoff => "before_cutoff",
            Skip::Reply => "reply",
            Skip::NoUrl => "no_url",
            Skip::Duplicate => "duplicate",
            Skip::BookActivity => "book_activity",
            Skip::SelfLink => "self_link",
            Skip::Empty => "empty",
        }
    }
}

/// Outcome of a single entry. `recent` is reported separately from the
/// verdict because it drives pagination even for entries that are skipped.
struct Verdict {
    recent: bool,
    post: std::result::Result<Post, Skip>,
}

impl Verdict {
    fn stale(skip: Skip) -> Self {
        Self {
            recent: false,
            post: Err(skip),
        }
    }

    fn recent(post: std::result::Result<Post, Skip>) -> Self {
        Self { recent: true, post }
    }
}

pub struct FeedCollector<S> {
    source: S,
    options: CollectOptions,
}

impl<S: FeedSource> FeedCollector<S> {
    pub fn new(source: S, options: CollectOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    /// Collect `actor`'s posts, newest first, with unique URLs.
    pub async fn collect(&self, actor: &str) -> Result<Vec<Post>> {
        let cutoff = self.options.cutoff()?;
        let mut posts: Vec<Post> = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;

        for page_no in 1..=self.options.max_pages {
            let page = self.source.fetch_page(actor, cursor.as_deref()).await?;
            let entries = page.entries();
            if entries.is_empty() {
                tracing::debug!(page = page_no, "bluesky.collect.empty_page");
                break;
            }

            let mut saw_recent = false;
            let mut accepted = 0usize;
            for entry in entries {
                let verdict = self.judge(entry, cutoff, &seen_urls);
                saw_recent |= verdict.recent;
                match verdict.post {
                    Ok(post) => {
                        seen_urls.insert(post.url.clone());
                        posts.push(post);
                        accepted += 1;
                    }
                    Err(skip) => {
                        tracing::debug!(page = page_no, reason = skip.as_str(), "bluesky.collect.skip");
                    }
                }
            }

            let next = page.next_cursor().map(str::to_owned);
            tracing::info!(
                page = page_no,
                entries = entries.len(),
                accepted,
                saw_recent,
                has_cursor = next.is_some(),
                "bluesky.collect.page"
            );

            match next {
                Some(next) if saw_recent => cursor = Some(next),
                _ => break,
            }
        }

        posts.sort_by(|a, b| b.created_at_unix.cmp(&a.created_at_unix));
        tracing::info!(actor, posts = posts.len(), "bluesky.collect.done");
        Ok(posts)
    }

    fn judge(&self, entry: &Value, cutoff: OffsetDateTime, seen_urls: &HashSet<String>) -> Verdict {
        let Some(entry) = decode_lenient::<FeedViewPost>(entry, "feed_entry") else {
            return Verdict::stale(Skip::Malformed);
        };
        if entry.is_repost() {
            return Verdict::stale(Skip::Repost);
        }

        let post = entry.post.unwrap_or_default();
        let Some(record) = PostRecord::from_value(&post.record) else {
            return Verdict::stale(Skip::Malformed);
        };

        let Some(created_at) = record
            .created_at
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .and_then(parse_created_at)
        else {
            return Verdict::stale(Skip::MissingTimestamp);
        };
        if created_at < cutoff {
            return Verdict::stale(Skip::BeforeCutoff);
        }

        Verdict::recent(self.build_post(&post, &record, created_at, seen_urls))
    }

    fn build_post(
        &self,
        post: &PostView,
        record: &PostRecord,
        created_at: OffsetDateTime,
        seen_urls: &HashSet<String>,
    ) -> std::result::Result<Post, Skip> {
        if record.is_reply() {
            return Err(Skip::Reply);
        }

        let author = post.author.clone().unwrap_or_default();
        let url = post_web_url(post.uri.as_deref().unwrap_or(""), author.handle())
            .ok_or(Skip::NoUrl)?;
        if seen_urls.contains(&url) {
            return Err(Skip::Duplicate);
        }

        let text = record.text();
        let facets = record.facets();
        let text_html = render_rich_text_html(text, &facets);
        let quote = post.embed.as_ref().and_then(extract_quote);

        let filters = &self.options.filters;
        if !text.is_empty() && filters.is_book_activity(text) {
            return Err(Skip::BookActivity);
        }
        if !text.is_empty() && filters.is_self_site_link(text, &facets) {
            return Err(Skip::SelfLink);
        }
        if text.is_empty() && quote.is_none() {
            return Err(Skip::Empty);
        }

        Ok(Post {
            author_display: author.display().to_string(),
            author_handle: author.handle().to_string(),
            created_at: format_timestamp(created_at),
            created_at_unix: created_at.unix_timestamp(),
            date_label: date_label(created_at),
            quote,
            text_html,
            text: text.to_string(),
            url,
        })
    }
}
