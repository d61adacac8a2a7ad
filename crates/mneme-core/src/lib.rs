//! Memory pipeline and port definitions for mneme.
//!
//! This crate holds the short-term memory pipeline (cache, sanitizer,
//! extractor, ranker, janitor) and the `ConversationRepository` port that
//! the infrastructure layer implements. It depends only on `mneme-types` --
//! never on `mneme-infra` or any database/IO crate.

pub mod conversation;
pub mod memory;
pub mod service;
