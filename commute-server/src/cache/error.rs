//! Journey cache error types.

/// Errors reading or writing the journey cache.
///
/// Any cache error aborts the resolve that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Store unreachable or query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded
    #[error("malformed cache row: {0}")]
    MalformedRow(String),
}
