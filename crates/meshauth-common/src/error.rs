// ============================================
// File: crates/meshauth-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Base error type shared by every meshauth crate. Higher layers wrap it
//! with `#[from]` in their own error enums.
//!
//! ## Main Functionality
//! - `CommonError`: input validation, I/O, decoding and clock failures
//! - `Result<T>`: alias over `CommonError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never put key bytes or passphrases into error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result alias over [`CommonError`].
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Failures shared by every layer.
///
/// # Example
/// ```
/// use meshauth_common::error::{CommonError, Result};
///
/// fn check_rounds(rounds: u32) -> Result<()> {
///     if rounds == 0 {
///         return Err(CommonError::invalid_input("rounds", "must be positive"));
///     }
///     Ok(())
/// }
///
/// assert!(check_rounds(0).is_err());
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    // ========================================
    // Validation Errors
    // ========================================

    /// A value was rejected before use.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Rejected field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A buffer had the wrong size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required size
        expected: usize,
        /// Size seen
        actual: usize,
    },

    // ========================================
    // IO Errors
    // ========================================

    /// Operating system I/O failure.
    #[error("I/O error: {context}")]
    Io {
        /// Operation in progress
        context: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    // ========================================
    // Encoding Errors
    // ========================================

    /// Text or binary input could not be decoded.
    #[error("Decoding error: {context}: {details}")]
    Decoding {
        /// Input being decoded
        context: String,
        /// Error details
        details: String,
    },

    // ========================================
    // Clock Errors
    // ========================================

    /// The wall clock cannot produce a container timestamp.
    #[error("System clock error: {reason}")]
    Clock {
        /// What went wrong
        reason: String,
    },
}

impl CommonError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Shorthand for [`CommonError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CommonError::InvalidLength`].
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Wraps an I/O error with the operation it interrupted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a `Decoding` error.
    pub fn decoding(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decoding {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Creates a `Clock` error.
    pub fn clock(reason: impl Into<String>) -> Self {
        Self::Clock {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error was caused by caller-supplied data.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::InvalidLength { .. } | Self::Decoding { .. }
        )
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            context: "I/O".into(),
            source: err,
        }
    }
}

impl From<base64::DecodeError> for CommonError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decoding {
            context: "base64 key text".into(),
            details: err.to_string(),
        }
    }
}

// ============================================
// Tests
// ============================================
