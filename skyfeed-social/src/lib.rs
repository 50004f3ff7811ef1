//! Social network clients and extractors used by Skyfeed.
//!
//! Only the Bluesky pipeline is implemented: paginated author-feed retrieval,
//! filtering, and rich-text rendering into the document a static site reads.
pub mod bluesky;
