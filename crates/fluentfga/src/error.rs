//! Error types.

use thiserror::Error;

/// Failures reported by, or while talking to, the authorization engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The engine answered with a non-success status.
    #[error("engine returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode engine response: {message}")]
    Decode { message: String },

    /// The request could not be built from the given input.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// No store is configured for an operation that needs one.
    #[error("no store configured; set engine.store_id or create a store first")]
    MissingStore,

    /// One check inside a batch failed.
    #[error("check {index} in batch failed: {message}")]
    BatchItem { index: usize, message: String },

    /// The engine did not return a result for one check in a batch.
    #[error("missing result for check {index} in batch")]
    MissingBatchResult { index: usize },
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EngineError::Decode {
                message: err.to_string(),
            }
        } else {
            EngineError::Transport {
                message: err.to_string(),
            }
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by builders and the introspector.
#[derive(Debug, Error)]
pub enum FgaError {
    /// A call was made in a state that does not allow it: a continuation with
    /// no remembered accessor, or a commit with nothing pending.
    #[error("invalid operation sequence: {message}")]
    OperationSequence { message: String },

    /// The engine rejected or failed the request. Passed through unchanged.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl FgaError {
    pub(crate) fn sequence(message: impl Into<String>) -> Self {
        FgaError::OperationSequence {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FgaError::Cancelled)
    }

    pub fn is_operation_sequence(&self) -> bool {
        matches!(self, FgaError::OperationSequence { .. })
    }
}

/// Result type for builder and introspector operations.
pub type FgaResult<T> = Result<T, FgaError>;
