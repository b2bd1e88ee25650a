//! Error types for canoniq.
//!
//! All errors are strongly typed using thiserror. Routine untrusted input
//! (empty strings, malformed phones, zero matches) never surfaces here:
//! those outcomes are typed result values (`PhoneResolution::Invalid`,
//! `ResolutionResult::Unresolved`, ...), not errors.

use thiserror::Error;

/// Validation errors that occur when constructing engine inputs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Confidence value {value} is out of range [0.0, 1.0]")]
    ConfidenceOutOfRange {
        value: f32,
    },

    #[error("Alias cannot be empty")]
    EmptyAlias,

    #[error("Canonical name cannot be empty")]
    EmptyCanonical,

    #[error("Owner name cannot be empty")]
    EmptyName,

    #[error("Building '{building}' has no parent community in the location directory")]
    DanglingBuilding {
        building: String,
    },
}

/// Failures of the external property-store hook.
///
/// The location resolver degrades gracefully on these: a tie-break lookup
/// that fails falls back to returning all tied candidates as ambiguous
/// rather than failing the whole call.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Property store unavailable: {message}")]
    Unavailable {
        message: String,
    },

    #[error("Property store lookup timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Errors raised by the owner clustering batch engine.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A batch run is already executing. Merge decisions depend on the full
    /// visible record set, so two concurrent runs could apply conflicting
    /// merges.
    #[error("A clustering run is already in progress")]
    RunInProgress,

    /// The run was cancelled cooperatively; no merges were committed.
    #[error("Clustering run cancelled at shard boundary {shard}")]
    Cancelled {
        shard: usize,
    },
}

/// Top-level error type for canoniq.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Clustering error: {0}")]
    Cluster(#[from] ClusterError),
}

impl EngineError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error is retryable.
    ///
    /// Validation errors will not change on retry; store outages and
    /// in-progress runs can.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Lookup(_) => true,
            Self::Cluster(e) => matches!(e, ClusterError::RunInProgress),
        }
    }
}

/// Result type alias for canoniq operations.
pub type EngineResult<T> = Result<T, EngineError>;
