//! Short-term memory pipeline.
//!
//! - `cache`: bounded, TTL-expiring store for extracted memory lists
//! - `sanitizer`: message validation and sensitive-content filtering
//! - `extractor`: cached, capped memory extraction from conversation history
//! - `ranker`: keyword-weighted prioritization and relevance selection
//! - `janitor`: periodic purge of expired cache entries

pub mod cache;
pub mod extractor;
pub mod janitor;
pub mod ranker;
pub mod sanitizer;
