// ============================================
// File: crates/meshauth-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Key material of variable length (post-quantum secrets, XOR pads,
//! passphrases) needs one owner that wipes it on drop, and the PEX
//! protocol identifies hosts by an 8-byte key prefix.
//!
//! ## Main Functionality
//! - `SensitiveBuffer`: owned bytes, zeroed on drop, redacted in `Debug`
//! - `PexId`: 8-byte host identifier, foldable with a 64-bit mask
//!
//! ## ⚠️ Important Note for Next Developer
//! - `SensitiveBuffer::xor` returns a new buffer; inputs stay untouched
//! - `PexId` is not secret, it travels on the wire masked by the
//!   network hash
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;

use zeroize::Zeroize;

use crate::error::{CommonError, Result};

// ============================================
// Constants
// ============================================

/// Size of a PEX host identifier in bytes.
pub const PEX_ID_SIZE: usize = 8;

// ============================================
// SensitiveBuffer
// ============================================

/// Heap buffer for secret bytes of arbitrary length.
///
/// # Example
/// ```
/// use meshauth_common::types::SensitiveBuffer;
///
/// let share = SensitiveBuffer::from_slice(&[0x0f, 0xf0]);
/// let pad = SensitiveBuffer::from_slice(&[0xff, 0xff]);
/// let combined = share.xor(&pad).unwrap();
/// assert_eq!(combined.as_bytes(), &[0xf0, 0x0f]);
/// ```
#[derive(Clone, Default, Zeroize)]
pub struct SensitiveBuffer(Vec<u8>);

impl Drop for SensitiveBuffer {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl SensitiveBuffer {
    /// Takes ownership of `bytes`.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Copies `bytes` into a new buffer.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Returns the contained bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// XORs with a pad of the same length into a new buffer.
    ///
    /// # Errors
    /// `CommonError::InvalidLength` if the lengths differ.
    pub fn xor(&self, pad: &Self) -> Result<Self> {
        if pad.len() != self.len() {
            return Err(CommonError::invalid_length(self.len(), pad.len()));
        }
        Ok(Self(
            self.0.iter().zip(pad.0.iter()).map(|(a, b)| a ^ b).collect(),
        ))
    }
}

impl fmt::Debug for SensitiveBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBuffer([REDACTED; {}])", self.0.len())
    }
}

impl From<Vec<u8>> for SensitiveBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// ============================================
// PexId
// ============================================

/// Host identifier used by the PEX protocol: the first 8 bytes of a
/// host public key.
///
/// # Wire Format
/// ```text
/// ┌──────────────────────────────┐
/// │  key[0..8] XOR network hash  │  (8 bytes, header `id` field)
/// └──────────────────────────────┘
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PexId([u8; PEX_ID_SIZE]);

impl PexId {
    /// Creates an id from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PEX_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Takes the first 8 bytes of a 32-byte key.
    #[must_use]
    pub fn from_key(key: &[u8; 32]) -> Self {
        let mut id = [0u8; PEX_ID_SIZE];
        id.copy_from_slice(&key[..PEX_ID_SIZE]);
        Self(id)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PEX_ID_SIZE] {
        &self.0
    }

    /// Big-endian integer view of the id.
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// XORs the id with a 64-bit mask. Applying the same mask twice
    /// restores the original id.
    #[must_use]
    pub const fn fold(self, mask: u64) -> Self {
        Self((self.to_u64() ^ mask).to_be_bytes())
    }
}

impl fmt::Debug for PexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PexId({})", hex::encode(self.0))
    }
}

impl fmt::Display for PexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_length_mismatch() {
        let a = SensitiveBuffer::from_slice(&[1, 2, 3]);
        let b = SensitiveBuffer::from_slice(&[1, 2]);
        assert!(matches!(
            a.xor(&b),
            Err(CommonError::InvalidLength { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_xor_self_inverse() {
        let key = SensitiveBuffer::from_slice(b"secret material!");
        let pad = SensitiveBuffer::from_slice(b"0123456789abcdef");
        let share = key.xor(&pad).unwrap();
        assert_ne!(share.as_bytes(), key.as_bytes());
        assert_eq!(share.xor(&pad).unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_debug_is_redacted() {
        let buf = SensitiveBuffer::from_slice(b"hunter2");
        let dbg = format!("{buf:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn test_pex_id_from_key() {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let id = PexId::from_key(&key);
        assert_eq!(id.to_u64(), 0x0102_0304_0506_0708);
        assert_eq!(id.to_string(), "0102030405060708");
    }

    #[test]
    fn test_pex_id_fold_roundtrip() {
        let id = PexId::from_bytes([9; 8]);
        let mask = 0xdead_beef_cafe_f00d;
        let folded = id.fold(mask);
        assert_ne!(folded, id);
        assert_eq!(folded.fold(mask), id);
    }
}
