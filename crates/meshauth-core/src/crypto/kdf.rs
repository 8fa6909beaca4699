// ============================================
// File: crates/meshauth-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Main Functionality
//! - `hmac_sha512`: single HMAC-SHA512 block
//! - `pbkdf_hmac_sha512`: iterated HMAC used for passphrase seeds
//! - `network_hash`: 64-bit mask folded into PEX sender ids
//! - `derive_session_key`: HKDF-SHA256 transfer key bound to both sides
//!
//! ## Iterated HMAC
//! ```text
//! D = HMAC(P, salt)
//! repeat rounds-1 times:  D ^= HMAC(P, D)
//! ```
//! Each round MACs the accumulator itself, not the previous round's
//! output. Keys derived elsewhere from the same passphrase depend on this.
//!
//! ## Last Modified
//! v0.1.0 - Initial KDF set

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

use super::keys::{PublicKey, SessionKey};
use super::{CHACHA20_KEY_SIZE, HKDF_INFO_PREFIX, HKDF_SALT, PUBLIC_KEY_SIZE, SHA512_HASH_SIZE};
use crate::error::{CoreError, Result};

type HmacSha512 = Hmac<Sha512>;

// ============================================
// HMAC-SHA512
// ============================================

/// Computes `HMAC-SHA512(key, message)`.
///
/// # Errors
/// `KeyDerivation` if the MAC cannot be keyed.
pub fn hmac_sha512(key: &[u8], message: &[u8]) -> Result<Zeroizing<[u8; SHA512_HASH_SIZE]>> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|_| CoreError::key_derivation("HMAC-SHA512 key setup failed"))?;
    mac.update(message);
    let mut out = Zeroizing::new([0u8; SHA512_HASH_SIZE]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Iterated HMAC-SHA512 over `rounds` rounds (see module docs).
///
/// # Errors
/// `KeyDerivation` if `rounds` is zero or the MAC cannot be keyed.
pub fn pbkdf_hmac_sha512(
    password: &[u8],
    salt: &[u8],
    rounds: u32,
) -> Result<Zeroizing<[u8; SHA512_HASH_SIZE]>> {
    if rounds == 0 {
        return Err(CoreError::key_derivation("rounds must be positive"));
    }

    let mut dest = hmac_sha512(password, salt)?;
    for _ in 1..rounds {
        let block = hmac_sha512(password, dest.as_ref())?;
        for (d, b) in dest.iter_mut().zip(block.iter()) {
            *d ^= b;
        }
    }
    trace!(rounds, "iterated HMAC derivation complete");
    Ok(dest)
}

// ============================================
// Network Hash
// ============================================

/// 64-bit mask for PEX ids: the first 8 bytes of
/// `HMAC-SHA512(network_key, nonce_be)` as a big-endian integer.
///
/// # Errors
/// `KeyDerivation` if the MAC cannot be keyed.
pub fn network_hash(network_key: &PublicKey, nonce: u64) -> Result<u64> {
    let digest = hmac_sha512(network_key.as_bytes(), &nonce.to_be_bytes())?;
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    Ok(u64::from_be_bytes(head))
}

// ============================================
// Transfer Key Derivation
// ============================================

/// Derives the transfer key from an X25519 shared secret.
///
/// # Arguments
/// * `shared_secret` - X25519 output between responder ephemeral and
///   requester host key
/// * `requester_public` - Requester's host public key
/// * `responder_public` - Responder's ephemeral public key
///
/// # Key Binding
/// Both public keys go into the HKDF info, so a key derived for one
/// requester/ephemeral pair is useless for any other.
///
/// # Errors
/// `KeyDerivation` if HKDF expansion fails.
pub fn derive_session_key(
    shared_secret: &[u8; 32],
    requester_public: &[u8; PUBLIC_KEY_SIZE],
    responder_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<SessionKey> {
    let mut info = Vec::with_capacity(HKDF_INFO_PREFIX.len() + PUBLIC_KEY_SIZE * 2);
    info.extend_from_slice(HKDF_INFO_PREFIX);
    info.extend_from_slice(requester_public);
    info.extend_from_slice(responder_public);

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), shared_secret);
    let mut key_bytes = [0u8; CHACHA20_KEY_SIZE];
    hk.expand(&info, &mut key_bytes)
        .map_err(|_| CoreError::key_derivation("HKDF expansion failed"))?;

    info.zeroize();
    let key = SessionKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha512_rfc4231_case2() {
        let out = hmac_sha512(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(&out[..16]),
            "164b7a7bfcf819e2e395fbe73b56e0a3"
        );
    }

    #[test]
    fn test_pbkdf_single_round_is_hmac() {
        let one = pbkdf_hmac_sha512(b"password", b"salt", 1).unwrap();
        let hmac = hmac_sha512(b"password", b"salt").unwrap();
        assert_eq!(*one, *hmac);
    }

    #[test]
    fn test_pbkdf_chains_accumulator() {
        let d1 = hmac_sha512(b"password", b"salt").unwrap();
        let h2 = hmac_sha512(b"password", d1.as_ref()).unwrap();
        let d2: Vec<u8> = d1.iter().zip(h2.iter()).map(|(a, b)| a ^ b).collect();
        let h3 = hmac_sha512(b"password", &d2).unwrap();
        let d3: Vec<u8> = d2.iter().zip(h3.iter()).map(|(a, b)| a ^ b).collect();

        let two = pbkdf_hmac_sha512(b"password", b"salt", 2).unwrap();
        let three = pbkdf_hmac_sha512(b"password", b"salt", 3).unwrap();
        assert_eq!(two.to_vec(), d2);
        assert_eq!(three.to_vec(), d3);
    }

    #[test]
    fn test_pbkdf_rejects_zero_rounds() {
        assert!(matches!(
            pbkdf_hmac_sha512(b"password", b"salt", 0),
            Err(CoreError::KeyDerivation { .. })
        ));
    }

    #[test]
    fn test_network_hash_depends_on_nonce_and_key() {
        let a = PublicKey::from_bytes([1; 32]);
        let b = PublicKey::from_bytes([2; 32]);
        let h = network_hash(&a, 42).unwrap();
        assert_eq!(h, network_hash(&a, 42).unwrap());
        assert_ne!(h, network_hash(&a, 43).unwrap());
        assert_ne!(h, network_hash(&b, 42).unwrap());
    }

    #[test]
    fn test_derive_session_key_deterministic() {
        let key1 = derive_session_key(&[0x42; 32], &[1; 32], &[2; 32]).unwrap();
        let key2 = derive_session_key(&[0x42; 32], &[1; 32], &[2; 32]).unwrap();
        assert_eq!(key1, key2);
        assert_ne!(key1.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_derive_session_key_binds_public_keys() {
        let key1 = derive_session_key(&[0x42; 32], &[1; 32], &[2; 32]).unwrap();
        let swapped = derive_session_key(&[0x42; 32], &[2; 32], &[1; 32]).unwrap();
        assert_ne!(key1, swapped);
    }
}
