//! The error type shared by every fallible accumulator operation.
//!
//! All operations are deterministic, so retrying a failed call with the same input always
//! fails the same way. [UtreexoError::InvalidArgument] and [UtreexoError::InvalidProof] are
//! caller-side conditions (a malformed request, a stale proof, a double spend) that the caller
//! may fix and retry with different input. [UtreexoError::Accumulator] means an internal
//! invariant broke, and should be treated as fatal for the operation at hand.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtreexoError {
    /// Malformed, mismatched or out of range inputs
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The proof doesn't reconcile with the accumulator it was checked against
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// An internal invariant was violated. This is a bug, not a caller error.
    #[error("accumulator invariant violated: {0}")]
    Accumulator(String),
    /// Malformed bytes while parsing, or a value that can't be put on the wire
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl UtreexoError {
    /// Whether this error signals a defect rather than a bad input. Callers should log
    /// these loudly and stop, instead of asking for different input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UtreexoError::Accumulator(_))
    }
}

impl From<std::io::Error> for UtreexoError {
    fn from(err: std::io::Error) -> Self {
        UtreexoError::Serialization(err.to_string())
    }
}
