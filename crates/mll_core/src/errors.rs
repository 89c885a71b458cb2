//! Error Types
//!
//! This module defines the error type shared by every MLL crate.
//!
//! # Overview
//!
//! The error domain that crosses the binding boundary is a small closed set:
//! - [`MllError::InvalidArgs`]: a caller-supplied description cannot be satisfied
//! - [`MllError::InvalidOperation`]: the backend refused an otherwise well-formed request
//! - [`MllError::OutOfMemory`]: pool capacity is exhausted and growth failed, or a true
//!   allocation failure
//!
//! Code that talks to a C-style caller can collapse any result into a
//! [`ResultCode`] with [`ResultCode::of`].
//!
//! ```rust,ignore
//! use mll_core::errors::{MllError, Result};
//!
//! fn create_thing() -> Result<()> {
//!     Err(MllError::invalid_args("width must be non-zero"))
//! }
//! ```

use thiserror::Error;

/// The main error type for MLL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MllError {
    /// The request description cannot be satisfied (conflicting flags, zero sizes...).
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The backend refused an otherwise well-formed request.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Capacity exhausted and growth failed, or the allocation itself failed.
    #[error("Out of memory: requested {requested} units ({context})")]
    OutOfMemory {
        /// Number of units that were requested
        requested: u64,
        /// What was being allocated
        context: String,
    },
}

impl MllError {
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn out_of_memory(requested: u64, context: impl Into<String>) -> Self {
        Self::OutOfMemory {
            requested,
            context: context.into(),
        }
    }

    /// The boundary code for this error.
    #[must_use]
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidArgs(_) => ResultCode::InvalidArgs,
            Self::InvalidOperation(_) => ResultCode::InvalidOperation,
            Self::OutOfMemory { .. } => ResultCode::OutOfMemory,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

/// Flat status code exposed to the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    InvalidArgs,
    InvalidOperation,
    OutOfMemory,
}

impl ResultCode {
    /// Collapses a result into its status code.
    #[must_use]
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => e.code(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    #[inline]
    #[must_use]
    pub fn is_failed(self) -> bool {
        self != Self::Ok
    }
}

/// Alias for `Result<T, MllError>`.
pub type Result<T> = std::result::Result<T, MllError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_variants() {
        assert_eq!(MllError::invalid_args("x").code(), ResultCode::InvalidArgs);
        assert_eq!(
            MllError::invalid_operation("x").code(),
            ResultCode::InvalidOperation
        );
        assert_eq!(
            MllError::out_of_memory(4, "slab").code(),
            ResultCode::OutOfMemory
        );
    }

    #[test]
    fn result_code_of_ok_and_err() {
        let ok: Result<u32> = Ok(1);
        let err: Result<u32> = Err(MllError::out_of_memory(100, "slab"));
        assert!(ResultCode::of(&ok).is_ok());
        assert!(ResultCode::of(&err).is_failed());
        assert_eq!(ResultCode::of(&err), ResultCode::OutOfMemory);
    }

    #[test]
    fn out_of_memory_message_names_request() {
        let err = MllError::out_of_memory(100, "descriptor slab");
        assert_eq!(
            err.to_string(),
            "Out of memory: requested 100 units (descriptor slab)"
        );
    }
}
