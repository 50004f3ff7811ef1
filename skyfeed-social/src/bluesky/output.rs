//! The JSON document handed to the static-site generator.
use crate::bluesky::extract::format_timestamp;
use crate::bluesky::types::Post;
use serde::{Deserialize, Serialize};
use skyfeed_common::Result;
use std::path::Path;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedDocument {
    pub actor: String,
    pub days: u32,
    pub generated_at: String,
    pub posts: Vec<Post>,
}

impl FeedDocument {
    /// `generated_at` is recorded to the whole second.
    pub fn new(actor: &str, days: u32, generated_at: OffsetDateTime, posts: Vec<Post>) -> Self {
        let generated_at = generated_at.replace_nanosecond(0).unwrap_or(generated_at);
        Self {
            actor: actor.to_string(),
            days,
            generated_at: format_timestamp(generated_at),
            posts,
        }
    }

    /// Pretty JSON (two-space indent, non-ASCII kept as-is) with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Write `doc` to `path`, creating parent directories as needed.
pub fn write_document(path: &Path, doc: &FeedDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_json()?)?;
    tracing::debug!(path = %path.display(), posts = doc.posts.len(), "output.written");
    Ok(())
}
