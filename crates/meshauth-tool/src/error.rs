// ============================================
// File: crates/meshauth-tool/src/error.rs
// ============================================
//! # Tool Error Types
//!
//! ## Error Categories
//! 1. **Configuration**: config file load and validation
//! 2. **Usage**: bad flag combinations and missing prerequisites
//! 3. **Input/Output**: key files, containers, output file
//! 4. **Sync**: deadline expiry
//! 5. **Wrapped**: core, transport and common errors
//!
//! ## ⚠️ Important Note for Next Developer
//! - Usage messages are shown to operators as-is; keep them short and
//!   name the flag that is missing
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::time::Duration;

use thiserror::Error;

use meshauth_common::error::CommonError;
use meshauth_core::error::CoreError;
use meshauth_transport::error::TransportError;

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Tool error types.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Config path
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Bad flags or a missing prerequisite.
    #[error("{reason}")]
    InvalidArgument {
        /// Operator-facing message
        reason: String,
    },

    /// File or stream failure.
    #[error("{context}: {source}")]
    Io {
        /// What was being accessed
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Interactive passphrase entries differ.
    #[error("Passwords do not match")]
    PassphraseMismatch,

    /// No usable reply before the sync deadline.
    #[error("No response from peer within {}ms", .waited.as_millis())]
    Timeout {
        /// How long we waited
        waited: Duration,
    },

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from transport crate.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ToolError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` for errors caused by how the tool was invoked.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if the peer never answered in time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if a container was rejected during validation.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation(_)))
    }
}
