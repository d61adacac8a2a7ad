//! Shared domain types for mneme.
//!
//! This crate contains the types passed between the memory pipeline and its
//! collaborators: conversation records, priority categories and weights,
//! cache statistics, configuration, and the repository error type.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod memory;
