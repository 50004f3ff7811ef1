//! Read-only client for the public Bluesky AppView.
//!
//! Only `app.bsky.feed.getAuthorFeed` is wrapped. Requests are unauthenticated
//! and made exactly once; any failure is surfaced as [`SkyfeedError::Fetch`].
use crate::bluesky::types::FeedPage;
use async_trait::async_trait;
use skyfeed_common::{Result, SkyfeedError};
use skyfeed_http::{HttpClient, RequestOpts};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://public.api.bsky.app";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
const AUTHOR_FEED_PATH: &str = "xrpc/app.bsky.feed.getAuthorFeed";

/// Anything that can hand out author-feed pages one cursor at a time.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the page after `cursor` (the first page when `None`).
    async fn fetch_page(&self, actor: &str, cursor: Option<&str>) -> Result<FeedPage>;
}

#[derive(Clone)]
pub struct BlueskyApi {
    http: HttpClient,
    page_size: u32,
}

impl BlueskyApi {
    /// `timeout` bounds every page request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| SkyfeedError::Config(format!("invalid API base URL: {e}")))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn get_author_feed(&self, actor: &str, cursor: Option<&str>) -> Result<FeedPage> {
        let mut query: Vec<(&str, std::borrow::Cow<'_, str>)> = vec![
            ("actor", actor.into()),
            ("limit", self.page_size.to_string().into()),
        ];
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.into()));
        }

        let page: FeedPage = self
            .http
            .get_json(
                AUTHOR_FEED_PATH,
                RequestOpts {
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| SkyfeedError::Fetch(e.to_string()))?;

        tracing::debug!(
            actor,
            entries = page.entries().len(),
            has_cursor = page.next_cursor().is_some(),
            "bluesky.author_feed.page"
        );
        Ok(page)
    }
}

#[async_trait]
impl FeedSource for BlueskyApi {
    async fn fetch_page(&self, actor: &str, cursor: Option<&str>) -> Result<FeedPage> {
        self.get_author_feed(actor, cursor).await
    }
}
