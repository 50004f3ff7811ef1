//! Bluesky author-feed ingestion.
//!
//! `client` fetches raw pages, `types` models them, `richtext` renders facet
//! annotations, `extract` holds per-post helpers and filters, `collector` runs
//! the page loop, and `output` writes the resulting document.
pub mod client;
pub mod collector;
pub mod extract;
pub mod output;
pub mod richtext;
pub mod types;

pub use client::{BlueskyApi, FeedSource};
pub use collector::{CollectOptions, FeedCollector};
pub use extract::ContentFilters;
pub use output::{FeedDocument, write_document};
pub use types::{Post, Quote};
