//! Wire models for `app.bsky.feed.getAuthorFeed` and the records it embeds,
//! plus the flattened output records written for the site generator.
//!
//! Upstream data is noisy, so anything below the page level is decoded one
//! item at a time: a malformed entry, record, facet or embed is dropped on its
//! own instead of failing the whole page.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const REPOST_REASON: &str = "app.bsky.feed.defs#reasonRepost";

/// Decode a loosely-typed JSON item, logging and discarding it on mismatch.
pub(crate) fn decode_lenient<T: DeserializeOwned>(value: &Value, what: &'static str) -> Option<T> {
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::debug!(what, error = %err, "bluesky.decode.skipped");
            None
        }
    }
}

/// Whether an optional JSON marker such as `reply` is set; `{}` and `null` are not.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ==============================
// Feed page
// ==============================

/// One page of an author feed. A page that is not an object, or whose `feed`
/// is not a list, fails to decode and aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedPage {
    #[serde(default)]
    pub feed: Option<Vec<Value>>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl FeedPage {
    pub fn entries(&self) -> &[Value] {
        self.feed.as_deref().unwrap_or(&[])
    }

    /// The cursor for the next page; an empty string counts as none.
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedViewPost {
    #[serde(default)]
    pub post: Option<PostView>,
    #[serde(default)]
    pub reason: Option<Reason>,
}

impl FeedViewPost {
    pub fn is_repost(&self) -> bool {
        self.reason
            .as_ref()
            .and_then(|r| r.kind.as_deref())
            .is_some_and(|k| k == REPOST_REASON)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Reason {
    #[serde(rename = "$type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostView {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub author: Option<ProfileView>,
    /// Kept raw: a record that is not an object only skips its entry.
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub embed: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileView {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

impl ProfileView {
    pub fn handle(&self) -> &str {
        self.handle.as_deref().unwrap_or("")
    }

    /// Display name, falling back to the handle when unset or empty.
    pub fn display(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.handle(),
        }
    }
}

// ==============================
// Post record
// ==============================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub facets: Option<Vec<Value>>,
    #[serde(default)]
    pub reply: Option<Value>,
}

impl PostRecord {
    /// Decode a record, returning `None` for anything that is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        decode_lenient(value, "record")
    }

    /// Trimmed post text.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("").trim()
    }

    pub fn is_reply(&self) -> bool {
        self.reply.as_ref().is_some_and(truthy)
    }

    /// Well-formed facets; malformed ones are dropped individually.
    pub fn facets(&self) -> Vec<Facet> {
        self.facets
            .iter()
            .flatten()
            .filter_map(|f| decode_lenient(f, "facet"))
            .collect()
    }
}

/// Annotation of a byte range of the post text.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Facet {
    #[serde(default)]
    pub index: Option<ByteSlice>,
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Vec<FacetFeature>,
}

/// Features decode one by one so an untyped feature cannot hide a valid link.
fn lenient_features<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<FacetFeature>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
    Ok(raw
        .iter()
        .filter_map(|f| decode_lenient(f, "facet_feature"))
        .collect())
}

/// Half-open range over the UTF-8 bytes of the text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    #[serde(default)]
    pub byte_start: Option<i64>,
    #[serde(default)]
    pub byte_end: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link {
        #[serde(default)]
        uri: Option<String>,
    },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention {
        #[serde(default)]
        did: Option<String>,
    },
    #[serde(other)]
    Other,
}

// ==============================
// Embeds
// ==============================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "$type")]
pub enum EmbedView {
    #[serde(rename = "app.bsky.embed.record#view")]
    Record {
        #[serde(default)]
        record: Option<EmbeddedRecord>,
    },
    #[serde(rename = "app.bsky.embed.recordWithMedia#view")]
    RecordWithMedia {
        #[serde(default)]
        record: Option<RecordEmbedView>,
    },
    #[serde(other)]
    Other,
}

impl EmbedView {
    /// The quoted record, unwrapping one level for record-with-media embeds.
    pub fn quoted_record(&self) -> Option<&EmbeddedRecord> {
        match self {
            EmbedView::Record { record } => record.as_ref(),
            EmbedView::RecordWithMedia { record } => record.as_ref()?.record.as_ref(),
            EmbedView::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordEmbedView {
    #[serde(default)]
    pub record: Option<EmbeddedRecord>,
}

/// A quoted record as seen by the viewer: a full view, or a tombstone.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EmbeddedRecord {
    #[serde(rename = "$type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub author: Option<ProfileView>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl EmbeddedRecord {
    /// Deleted or blocked quotes.
    pub fn is_unavailable(&self) -> bool {
        let kind = self.kind.as_deref().unwrap_or("");
        kind.ends_with("viewNotFound") || kind.ends_with("viewBlocked")
    }
}

// ==============================
// Output records
// ==============================

/// Summary of a quoted post. All-empty fields mean the quote existed but is
/// no longer viewable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub author_display: String,
    pub author_handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_html: Option<String>,
    pub text: String,
    pub url: String,
}

impl Quote {
    pub fn unavailable() -> Self {
        Self {
            author_display: String::new(),
            author_handle: String::new(),
            text_html: None,
            text: String::new(),
            url: String::new(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.text_html.is_none() && self.text.is_empty() && self.url.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub author_display: String,
    pub author_handle: String,
    pub created_at: String,
    pub created_at_unix: i64,
    pub date_label: String,
    pub quote: Option<Quote>,
    pub text_html: String,
    pub text: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repost_reason_is_detected() {
        let entry: FeedViewPost = serde_json::from_value(json!({
            "post": { "uri": "at://did:plc:x/app.bsky.feed.post/1" },
            "reason": { "$type": "app.bsky.feed.defs#reasonRepost" }
        }))
        .unwrap();
        assert!(entry.is_repost());

        let pinned: FeedViewPost = serde_json::from_value(json!({
            "reason": { "$type": "app.bsky.feed.defs#reasonPin" }
        }))
        .unwrap();
        assert!(!pinned.is_repost());
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert!(PostRecord::from_value(&json!("just a string")).is_none());
        assert!(PostRecord::from_value(&json!(null)).is_none());
        assert!(PostRecord::from_value(&json!({})).is_some());
    }

    #[test]
    fn empty_reply_marker_is_not_a_reply() {
        let empty = PostRecord::from_value(&json!({ "reply": {} })).unwrap();
        assert!(!empty.is_reply());
        let reply = PostRecord::from_value(&json!({
            "reply": { "parent": { "uri": "at://x" }, "root": { "uri": "at://x" } }
        }))
        .unwrap();
        assert!(reply.is_reply());
    }

    #[test]
    fn malformed_facets_are_dropped_individually() {
        let record = PostRecord::from_value(&json!({
            "text": "hello",
            "facets": [
                { "index": { "byteStart": 0, "byteEnd": 5 },
                  "features": [{ "$type": "app.bsky.richtext.facet#link", "uri": "https://a.example" }] },
                { "index": { "byteStart": "zero", "byteEnd": 5 }, "features": [] },
                { "index": { "byteStart": 0, "byteEnd": 5 },
                  "features": [{ "$type": "app.bsky.richtext.facet#tag", "tag": "rust" }] }
            ]
        }))
        .unwrap();

        let facets = record.facets();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[1].features, vec![FacetFeature::Other]);
    }

    #[test]
    fn untyped_feature_is_dropped_without_its_siblings() {
        let record = PostRecord::from_value(&json!({
            "text": "new post",
            "facets": [{
                "index": { "byteStart": 0, "byteEnd": 3 },
                "features": [
                    { "uri": "no-type" },
                    { "$type": "app.bsky.richtext.facet#link", "uri": "https://a.example/x" }
                ]
            }]
        }))
        .unwrap();

        let facets = record.facets();
        assert_eq!(facets.len(), 1);
        assert_eq!(
            facets[0].features,
            vec![FacetFeature::Link {
                uri: Some("https://a.example/x".into())
            }]
        );
    }

    #[test]
    fn record_with_media_unwraps_one_level() {
        let embed: EmbedView = serde_json::from_value(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": { "record": { "$type": "app.bsky.embed.record#viewRecord", "uri": "at://q" } },
            "media": { "$type": "app.bsky.embed.images#view", "images": [] }
        }))
        .unwrap();
        assert_eq!(
            embed.quoted_record().and_then(|r| r.uri.as_deref()),
            Some("at://q")
        );
    }

    #[test]
    fn image_embeds_carry_no_quote() {
        let embed: EmbedView = serde_json::from_value(json!({
            "$type": "app.bsky.embed.images#view",
            "images": []
        }))
        .unwrap();
        assert!(embed.quoted_record().is_none());
    }

    #[test]
    fn unavailable_quote_omits_rendered_text() {
        let v = serde_json::to_value(Quote::unavailable()).unwrap();
        assert_eq!(
            v,
            json!({ "author_display": "", "author_handle": "", "text": "", "url": "" })
        );
    }

    #[test]
    fn display_name_falls_back_to_handle() {
        let p = ProfileView {
            handle: Some("alice.example".into()),
            display_name: Some(String::new()),
        };
        assert_eq!(p.display(), "alice.example");
    }
}
