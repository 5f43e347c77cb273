//! Shared error taxonomy
//!
//! Only `Config` and `DuplicateSource` are fatal, and only at startup.
//! Per-source failures are recovered locally and surfaced as outcomes;
//! cache backend failures degrade to a miss.

use thiserror::Error;

/// Result alias over [`PivotError`]
pub type Result<T> = std::result::Result<T, PivotError>;

/// Errors that can occur across the Pivot service
#[derive(Debug, Error)]
pub enum PivotError {
    /// Startup configuration is unreadable or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Two source drivers registered the same id
    #[error("duplicate integration source: {id}")]
    DuplicateSource {
        /// The colliding source id
        id: String,
    },

    /// A single source exceeded its configured timeout
    #[error("source {id} timed out after {millis}ms")]
    SourceTimeout {
        /// The source that timed out
        id: String,
        /// The timeout that elapsed, in milliseconds
        millis: u64,
    },

    /// A source driver call failed
    #[error("source {id} fetch failed: {detail}")]
    SourceFetch {
        /// The source that failed
        id: String,
        /// Driver-reported failure detail
        detail: String,
    },

    /// The cache backend is unreachable or misbehaving
    #[error("cache backend error: {0}")]
    CacheBackend(String),

    /// The caller lacks the role required for the operation
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Malformed indicator or request parameters
    #[error("invalid request: {0}")]
    Validation(String),
}

impl PivotError {
    /// True for errors that must abort process startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PivotError::Config(_) | PivotError::DuplicateSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_fatal() {
        assert!(PivotError::Config("bad".into()).is_fatal());
        assert!(PivotError::DuplicateSource { id: "x".into() }.is_fatal());
        assert!(!PivotError::SourceTimeout {
            id: "x".into(),
            millis: 200
        }
        .is_fatal());
        assert!(!PivotError::CacheBackend("down".into()).is_fatal());
    }
}
