// ============================================
// File: crates/meshauth-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Error type for key handling, container validation and PEX message
//! processing in the core crate.
//!
//! ## Error Categories
//! 1. **Crypto Errors**: key generation, signing, sealing, derivation
//! 2. **Key Material Errors**: parsing, scheme lengths, XOR pads, passphrases
//! 3. **Container Errors**: validation failures, missing payload fields
//! 4. **Protocol Errors**: PEX decoding failures
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - Container validation has its own enum (`ValidationError`) because
//!   callers branch on its three outcomes
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use meshauth_common::error::CommonError;

use crate::auth::ValidationError;

// ============================================
// Result Type Alias
// ============================================

/// Result alias over [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for key, container and protocol operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Random or post-quantum key generation failed.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// Key kind
        context: String,
    },

    /// Ed25519 signature did not verify.
    #[error("Signature verification failed")]
    SignatureVerification,

    /// Update data could not be sealed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// Data being sealed
        context: String,
    },

    /// Update data failed its Poly1305 tag.
    #[error("Decryption failed: authentication error")]
    Decryption,

    /// HKDF or seed derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    // ========================================
    // Key Material Errors
    // ========================================

    /// Key text could not be parsed.
    #[error("Failed to parse key data: {reason}")]
    KeyParse {
        /// What part failed
        reason: String,
    },

    /// A post-quantum key does not have its scheme's length.
    #[error("Invalid {scheme} key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Scheme name
        scheme: &'static str,
        /// Length required by the scheme
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// XOR pad does not match the key it is applied to.
    #[error("PQ xor key length mismatch: key has {expected} bytes, pad has {actual}")]
    LengthMismatch {
        /// Length of the post-quantum secret (0 if absent)
        expected: usize,
        /// Length of the pad
        actual: usize,
    },

    /// Passphrase shorter than the minimum.
    #[error("Passphrase too short: need at least {min} bytes, got {actual}")]
    PassphraseTooShort {
        /// Minimum length
        min: usize,
        /// Supplied length
        actual: usize,
    },

    // ========================================
    // Container Errors
    // ========================================

    /// Container validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Payload lacks a required field.
    #[error("network data is missing the {field} attribute")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// PEX opcode we do not handle.
    #[error("Unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    /// PEX version byte other than ours.
    #[error("Unsupported protocol version: {got}, expected {expected}")]
    UnsupportedVersion {
        /// Version received
        got: u8,
        /// Version expected
        expected: u8,
    },

    /// PEX message or update stream is inconsistent.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// Inconsistency found
        reason: String,
    },

    /// Datagram shorter than its header or declared payload.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Bytes needed
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// Datagram or update data above its limit.
    #[error("Message too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size received
        actual: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Shared failure from `meshauth-common`.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Shorthand for [`CoreError::KeyGeneration`].
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `KeyParse` error.
    pub fn key_parse(reason: impl Into<String>) -> Self {
        Self::KeyParse {
            reason: reason.into(),
        }
    }

    /// Creates a `KeyDerivation` error.
    pub fn key_derivation(reason: impl Into<String>) -> Self {
        Self::KeyDerivation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CoreError::MalformedMessage`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CoreError::MessageTooShort`].
    #[must_use]
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Signature, sealing or derivation failure.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::KeyGeneration { .. }
                | Self::SignatureVerification
                | Self::Encryption { .. }
                | Self::Decryption
                | Self::KeyDerivation { .. }
        )
    }

    /// Returns `true` if this is a PEX decoding error.
    ///
    /// Datagrams failing with these are dropped without a reply.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownMessageType(_)
                | Self::UnsupportedVersion { .. }
                | Self::MalformedMessage { .. }
                | Self::MessageTooShort { .. }
                | Self::MessageTooLarge { .. }
        )
    }

    /// Returns `true` if this error came from operator-supplied key material.
    #[must_use]
    pub const fn is_key_material_error(&self) -> bool {
        matches!(
            self,
            Self::KeyParse { .. }
                | Self::InvalidKeyLength { .. }
                | Self::LengthMismatch { .. }
                | Self::PassphraseTooShort { .. }
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::too_short(28, 5);
        assert!(err.to_string().contains("28"));
        assert!(err.to_string().contains('5'));

        let err = CoreError::MissingField { field: "hosts" };
        assert_eq!(err.to_string(), "network data is missing the hosts attribute");
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::Decryption.is_crypto_error());
        assert!(CoreError::UnknownMessageType(0xff).is_protocol_error());
        assert!(CoreError::LengthMismatch { expected: 0, actual: 4 }.is_key_material_error());
        assert!(!CoreError::Decryption.is_protocol_error());
    }

    #[test]
    fn test_validation_error_conversion() {
        let core: CoreError = ValidationError::KeyMismatch.into();
        assert!(matches!(core, CoreError::Validation(ValidationError::KeyMismatch)));
        assert_eq!(core.to_string(), "Public key does not match");
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_input("rounds", "must be positive");
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
    }
}
