//! Structured error taxonomy for the engine's command surface.
//!
//! Grounded on `boxkv-common::config`'s `thiserror`-derived error style: a
//! flat enum with one variant per failure category, plus a `code()` accessor
//! so callers can match on [`ErrorCode`] without matching the full error
//! variant (useful for a host that maps errors onto a wire protocol).

use thiserror::Error;

/// The category of an [`EngineError`], stable across error-message wording
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed command arguments; safe to retry with corrected input.
    Validation,
    /// An internal invariant violation or resource fault.
    Storage,
    /// Caller-side only; the engine never constructs this itself.
    Timeout,
    /// A value's size oracle failed.
    Serialization,
    /// Residual category.
    Unknown,
}

/// An error surfaced by the engine's command surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed command arguments (empty key, non-positive TTL, missing
    /// required field). Never mutates state.
    #[error("validation error: {0}")]
    Validation(String),
    /// An internal invariant violation, e.g. the per-key version counter
    /// overflowing `u64::MAX`.
    #[error("storage error: {0}")]
    Storage(String),
    /// Reserved for hosts that want to round-trip a timeout through this
    /// error type; the engine never constructs this variant.
    #[error("timeout")]
    Timeout,
    /// A value's size oracle failed. Modeled for a future pluggable value
    /// codec; effectively unreachable for `Vec<u8>`/`.len()`.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Residual category for anything that doesn't fit the above.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl EngineError {
    /// Returns this error's stable [`ErrorCode`].
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::Validation,
            EngineError::Storage(_) => ErrorCode::Storage,
            EngineError::Timeout => ErrorCode::Timeout,
            EngineError::Serialization(_) => ErrorCode::Serialization,
            EngineError::Unknown(_) => ErrorCode::Unknown,
        }
    }
}
