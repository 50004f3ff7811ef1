//! Per-post helpers: canonical URLs, timestamps, content filters and quote
//! extraction.
use crate::bluesky::richtext::{PROFILE_BASE, render_rich_text_html};
use crate::bluesky::types::{EmbedView, Facet, FacetFeature, PostRecord, Quote, decode_lenient};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const DEFAULT_SELF_SITE_DOMAIN: &str = "hunsanger.blog";
pub const DEFAULT_BOOK_ACTIVITY_PREFIXES: [&str; 3] =
    ["started reading:", "reading:", "finished reading:"];

/// Web URL of a post, built from the last segment of its `at://` URI.
///
/// ```
/// use skyfeed_social::bluesky::extract::post_web_url;
///
/// assert_eq!(
///     post_web_url("at://did:plc:abc/app.bsky.feed.post/3kq", "alice.example").as_deref(),
///     Some("https://bsky.app/profile/alice.example/post/3kq"),
/// );
/// assert_eq!(post_web_url("", "alice.example"), None);
/// ```
pub fn post_web_url(at_uri: &str, handle: &str) -> Option<String> {
    if at_uri.is_empty() || handle.is_empty() {
        return None;
    }
    let post_id = at_uri.rsplit('/').next().unwrap_or(at_uri);
    Some(format!("{PROFILE_BASE}/{handle}/post/{post_id}"))
}

/// Parse an RFC 3339 timestamp (`Z` or numeric offset) and normalise to UTC.
pub fn parse_created_at(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
}

/// RFC 3339 in UTC with a `Z` suffix.
pub fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

/// Human label such as `Mar 5, 2024`.
pub fn date_label(dt: OffsetDateTime) -> String {
    let fmt = format_description!("[month repr:short] [day padding:none], [year]");
    dt.format(&fmt).unwrap_or_default()
}

/// Rules that keep automated and self-promotional posts out of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilters {
    self_site_domain: String,
    book_activity_prefixes: Vec<String>,
}

impl Default for ContentFilters {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_SITE_DOMAIN, DEFAULT_BOOK_ACTIVITY_PREFIXES)
    }
}

impl ContentFilters {
    /// Matching is case-insensitive; blank domain or prefixes never match.
    pub fn new<I, S>(self_site_domain: &str, book_activity_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            self_site_domain: self_site_domain.trim().to_lowercase(),
            book_activity_prefixes: book_activity_prefixes
                .into_iter()
                .map(|p| p.as_ref().trim_start().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Reading-tracker posts such as `Finished reading: Dune`.
    pub fn is_book_activity(&self, text: &str) -> bool {
        let normalized = text.trim().to_lowercase();
        self.book_activity_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()))
    }

    /// Whether the text, or any link facet target, mentions the own site.
    pub fn is_self_site_link(&self, text: &str, facets: &[Facet]) -> bool {
        if self.self_site_domain.is_empty() {
            return false;
        }
        if text.to_lowercase().contains(&self.self_site_domain) {
            return true;
        }
        facets
            .iter()
            .flat_map(|f| f.features.iter())
            .any(|feature| match feature {
                FacetFeature::Link { uri: Some(uri) } => {
                    uri.to_lowercase().contains(&self.self_site_domain)
                }
                _ => false,
            })
    }
}

/// Summarise the post quoted by `embed`, if any.
///
/// Deleted or blocked quotes yield [`Quote::unavailable`]; embeds without a
/// quoted record, or quotes with neither text nor URL, yield `None`.
pub fn extract_quote(embed: &Value) -> Option<Quote> {
    let embed: EmbedView = decode_lenient(embed, "embed")?;
    let record = embed.quoted_record()?;

    if record.is_unavailable() {
        return Some(Quote::unavailable());
    }

    let author = record.author.clone().unwrap_or_default();
    let value = record
        .value
        .as_ref()
        .and_then(PostRecord::from_value)
        .unwrap_or_default();

    let text = value.text();
    let url = post_web_url(record.uri.as_deref().unwrap_or(""), author.handle()).unwrap_or_default();
    if text.is_empty() && url.is_empty() {
        return None;
    }

    Some(Quote {
        author_display: author.display().to_string(),
        author_handle: author.handle().to_string(),
        text_html: Some(render_rich_text_html(text, &value.facets())),
        text: text.to_string(),
        url,
    })
}
