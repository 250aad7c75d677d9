//! Error types shared by the extractor, the combiners and the engine.
//!
//! Engine entry points return [`anyhow::Result`]; the variants below travel
//! inside the `anyhow::Error` and can be recovered with
//! `err.downcast_ref::<TallyError>()`.

use thiserror::Error;

/// Result type for operations that only fail with a [`TallyError`].
pub type TallyResult<T> = Result<T, TallyError>;

/// Failures named by the counting and top-K jobs.
#[derive(Error, Debug)]
pub enum TallyError {
    /// An opening tag marker with no closing marker after it.
    ///
    /// Recoverable: the extractor drops the record and the job goes on.
    #[error("malformed record: found <{tag}> without a following </{tag}>")]
    MalformedRecord {
        /// Tag whose closing marker is missing.
        tag: String,
    },

    /// An intermediate value that does not decode as the expected shape.
    ///
    /// Fatal for the task: intermediate state is corrupted, so the whole task
    /// has to be re-run from its inputs.
    #[error("invalid partial result in {stage}: {reason}")]
    InvalidPartialResult {
        /// Step that rejected the value (`"combine merge"`, `"count line"`, ...).
        stage: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A top-K selector configured with a capacity of zero.
    #[error("top-k capacity must be at least 1, got {k}")]
    CapacityViolation {
        /// The rejected capacity.
        k: usize,
    },

    /// Reading inputs or writing results failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TallyError {
    pub(crate) fn partial(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPartialResult {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
