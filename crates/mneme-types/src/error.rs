use thiserror::Error;

/// Errors from repository operations (used by trait definitions in mneme-core).
///
/// The memory pipeline never propagates these to its caller: a failed fetch
/// degrades to an empty memory list at the extractor boundary.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("conversation store connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conversation store unavailable: {0}")]
    Unavailable(String),
}
