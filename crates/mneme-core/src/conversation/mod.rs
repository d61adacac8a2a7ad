//! Access to stored conversation history.

pub mod repository;
