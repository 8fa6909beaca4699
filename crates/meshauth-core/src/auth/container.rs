// ============================================
// File: crates/meshauth-core/src/auth/container.rs
// ============================================
//! # Signed Network-Data Container
//!
//! ## Creation Reason
//! Network configuration travels between nodes as one signed blob. Any
//! node can check it against the network's signing key without trusting
//! the peer that delivered it.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ magic      4 bytes  0x754e6574 (big-endian)          │ header
//! │ signature 64 bytes  Ed25519 over the data section    │
//! ├──────────────────────────────────────────────────────┤
//! │ timestamp  8 bytes  unix seconds, big-endian         │ data
//! │ public key 32 bytes signing key of the network       │ (signed)
//! │ payload    N bytes  UTF-8 JSON                       │
//! │ 0x00       1 byte   terminator                       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validation Order
//! 1. size > 108, magic, terminator → `Malformed`
//! 2. embedded key vs expected key  → `KeyMismatch`
//! 3. signature                     → `BadSignature`
//! 4. payload UTF-8                 → `Malformed`
//!
//! ## ⚠️ Important Note for Next Developer
//! - The terminator is inside the signed region
//! - Containers are immutable once signed; re-sign to change anything
//!
//! ## Last Modified
//! v0.1.0 - Initial container codec

use std::fmt;

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tracing::debug;

use meshauth_common::Timestamp;

use crate::crypto::{PublicKey, SecretKey, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::Result;

// ============================================
// Constants
// ============================================

/// Container magic, "uNet".
pub const CONTAINER_MAGIC: u32 = 0x754e_6574;

/// Magic plus signature.
pub const HEADER_SIZE: usize = 4 + SIGNATURE_SIZE;

/// Timestamp plus public key.
pub const DATA_HEADER_SIZE: usize = 8 + PUBLIC_KEY_SIZE;

/// Containers must be strictly longer than this.
pub const MIN_CONTAINER_SIZE: usize = HEADER_SIZE + DATA_HEADER_SIZE;

/// Largest container accepted from a file or a peer.
pub const MAX_CONTAINER_SIZE: usize = 128 * 1024;

// ============================================
// ValidationError
// ============================================

/// Why a container was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Structurally invalid container.
    #[error("Malformed network data: {reason}")]
    Malformed {
        /// What is wrong
        reason: &'static str,
    },

    /// Signed by a different key than expected.
    #[error("Public key does not match")]
    KeyMismatch,

    /// Signature does not verify.
    #[error("Signature verification failed")]
    BadSignature,
}

impl ValidationError {
    const fn malformed(reason: &'static str) -> Self {
        Self::Malformed { reason }
    }
}

// ============================================
// ValidatedContainer
// ============================================

/// Fields of a container that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedContainer<'a> {
    /// Version (signing time).
    pub version: Timestamp,
    /// Signing key embedded in the container.
    pub public_key: PublicKey,
    /// Payload text without the terminator.
    pub payload: &'a str,
}

/// Validates a container.
///
/// # Arguments
/// * `expected` - Required signing key, or `None` to trust the embedded key
/// * `bytes` - Complete container
///
/// # Errors
/// See the module-level validation order.
pub fn validate<'a>(
    expected: Option<&PublicKey>,
    bytes: &'a [u8],
) -> std::result::Result<ValidatedContainer<'a>, ValidationError> {
    if bytes.len() <= MIN_CONTAINER_SIZE {
        return Err(ValidationError::malformed("Input file too small"));
    }
    if bytes.len() > MAX_CONTAINER_SIZE {
        return Err(ValidationError::malformed("Input file too large"));
    }

    let (header, data) = bytes.split_at(HEADER_SIZE);
    let (magic, signature) = header.split_at(4);
    if magic != CONTAINER_MAGIC.to_be_bytes() {
        return Err(ValidationError::malformed("Invalid magic"));
    }
    let Some((&0, body)) = data.split_last() else {
        return Err(ValidationError::malformed("Missing terminator"));
    };

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&body[..8]);
    let mut key = [0u8; PUBLIC_KEY_SIZE];
    key.copy_from_slice(&body[8..DATA_HEADER_SIZE]);
    let public_key = PublicKey::from_bytes(key);

    if expected.is_some_and(|expected| *expected != public_key) {
        return Err(ValidationError::KeyMismatch);
    }

    let mut sig = [0u8; SIGNATURE_SIZE];
    sig.copy_from_slice(signature);
    public_key
        .verify(data, &sig)
        .map_err(|_| ValidationError::BadSignature)?;

    let payload = std::str::from_utf8(&body[DATA_HEADER_SIZE..])
        .map_err(|_| ValidationError::malformed("Payload is not UTF-8"))?;

    Ok(ValidatedContainer {
        version: Timestamp::from_be_bytes(ts),
        public_key,
        payload,
    })
}

// ============================================
// AuthContainer
// ============================================

/// A signed container as raw bytes.
///
/// # Example
/// ```
/// use meshauth_common::Timestamp;
/// use meshauth_core::auth::{validate, AuthContainer};
/// use meshauth_core::crypto::SecretKey;
///
/// let key = SecretKey::generate();
/// let container = AuthContainer::sign("{}", &key, Timestamp::from_secs(1_700_000_000));
/// let checked = validate(Some(&key.signing_public_key()), container.as_bytes()).unwrap();
/// assert_eq!(checked.payload, "{}");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContainer {
    bytes: Vec<u8>,
}

impl AuthContainer {
    /// Signs `payload` with `secret`, stamped with `timestamp`.
    #[must_use]
    pub fn sign(payload: &str, secret: &SecretKey, timestamp: Timestamp) -> Self {
        let mut data = BytesMut::with_capacity(DATA_HEADER_SIZE + payload.len() + 1);
        data.put_slice(&timestamp.to_be_bytes());
        data.put_slice(secret.signing_public_key().as_bytes());
        data.put_slice(payload.as_bytes());
        data.put_u8(0);

        let signature = secret.sign(&data);

        let mut bytes = BytesMut::with_capacity(HEADER_SIZE + data.len());
        bytes.put_u32(CONTAINER_MAGIC);
        bytes.put_slice(&signature);
        bytes.put_slice(&data);

        debug!(version = %timestamp, size = bytes.len(), "signed network data");
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Signs `payload` stamped with the current time.
    ///
    /// # Errors
    /// `Clock` if the system clock is before the epoch.
    pub fn sign_now(payload: &str, secret: &SecretKey) -> Result<Self> {
        Ok(Self::sign(payload, secret, Timestamp::try_now()?))
    }

    /// Returns the encoded container.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Unwraps into the encoded container.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for AuthContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContainer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
