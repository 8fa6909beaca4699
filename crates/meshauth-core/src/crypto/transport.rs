// ============================================
// File: crates/meshauth-core/src/crypto/transport.rs
// ============================================
//! # Update Payload Encryption
//!
//! ## Creation Reason
//! Network data is signed but not secret-free (host names, addresses), so
//! a PEX transfer seals the whole container with ChaCha20-Poly1305 under
//! a key only the requesting host can derive.
//!
//! ## Sealed Layout
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ ChaCha20 ciphertext (container length)             │
//! │ Poly1305 tag (16 bytes)                            │
//! └────────────────────────────────────────────────────┘
//! nonce (12 bytes) = req_id (8 bytes BE) || 0x00000000
//! aad             = req_id (8 bytes BE)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The key is fresh per transfer (ephemeral responder key), so a
//!   request-id nonce never repeats under one key
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};

use super::keys::SessionKey;
use super::{CHACHA20_NONCE_SIZE, POLY1305_TAG_SIZE};
use crate::error::{CoreError, Result};

/// Bytes added by sealing.
pub const ENCRYPTION_OVERHEAD: usize = POLY1305_TAG_SIZE;

fn make_nonce(req_id: u64) -> Nonce {
    let mut nonce = [0u8; CHACHA20_NONCE_SIZE];
    nonce[..8].copy_from_slice(&req_id.to_be_bytes());
    Nonce::from(nonce)
}

fn cipher(key: &SessionKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Seals an update payload for request `req_id`.
///
/// # Errors
/// `Encryption` if the AEAD refuses the input.
pub fn seal_update(key: &SessionKey, req_id: u64, plaintext: &[u8]) -> Result<Vec<u8>> {
    let aad = req_id.to_be_bytes();
    cipher(key)
        .encrypt(&make_nonce(req_id), Payload { msg: plaintext, aad: &aad })
        .map_err(|_| CoreError::Encryption {
            context: "update payload".into(),
        })
}

/// Opens a sealed update payload for request `req_id`.
///
/// # Errors
/// `Decryption` if the tag does not verify or the input is shorter
/// than a tag.
pub fn open_update(key: &SessionKey, req_id: u64, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < POLY1305_TAG_SIZE {
        return Err(CoreError::Decryption);
    }
    let aad = req_id.to_be_bytes();
    cipher(key)
        .decrypt(&make_nonce(req_id), Payload { msg: ciphertext, aad: &aad })
        .map_err(|_| CoreError::Decryption)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SessionKey {
        SessionKey::from_bytes([0x42; 32])
    }

    #[test]
    fn test_seal_open() {
        let sealed = seal_update(&test_key(), 7, b"network data").unwrap();
        assert_eq!(sealed.len(), 12 + ENCRYPTION_OVERHEAD);
        assert_eq!(open_update(&test_key(), 7, &sealed).unwrap(), b"network data");
    }

    #[test]
    fn test_wrong_request_id_fails() {
        let sealed = seal_update(&test_key(), 7, b"network data").unwrap();
        assert!(matches!(
            open_update(&test_key(), 8, &sealed),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn test_tampered_fails() {
        let mut sealed = seal_update(&test_key(), 7, b"network data").unwrap();
        sealed[0] ^= 1;
        assert!(open_update(&test_key(), 7, &sealed).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal_update(&test_key(), 7, b"network data").unwrap();
        let other = SessionKey::from_bytes([0x43; 32]);
        assert!(open_update(&other, 7, &sealed).is_err());
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            open_update(&test_key(), 7, &[0u8; 15]),
            Err(CoreError::Decryption)
        ));
    }
}
