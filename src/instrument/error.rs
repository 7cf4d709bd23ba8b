//! Instrumentation error types.
//!
//! None of these ever reach the caller of an instrumented operation. They are
//! produced internally, logged, and replaced by a coarser rendering.

use thiserror::Error;

/// Internal failures of the instrumentation layer itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error("Sensitivity lookup failed for {operation}: {reason}")]
    SensitivityResolution { operation: String, reason: String },

    #[error("Cannot serialize result of type {type_tag}: {reason}")]
    ResultSerialization { type_tag: String, reason: String },
}

impl InstrumentError {
    /// Returns true if the failure was absorbed by treating every parameter as non-sensitive.
    pub fn is_fail_open(&self) -> bool {
        matches!(self, Self::SensitivityResolution { .. })
    }

    /// Returns true if the failure was absorbed by degrading to a type tag.
    pub fn is_fail_soft(&self) -> bool {
        matches!(self, Self::ResultSerialization { .. })
    }
}
