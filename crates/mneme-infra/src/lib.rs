//! Infrastructure layer for mneme.
//!
//! Contains implementations of the ports defined in `mneme-core`: an
//! in-memory conversation store (seedable from JSON), and the configuration
//! loader that merges `memory.toml` with environment overrides.

pub mod config;
pub mod conversation;
