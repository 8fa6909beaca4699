// ============================================
// File: crates/meshauth-core/src/crypto/seed.rs
// ============================================
//! # Passphrase Seed Derivation
//!
//! ## Creation Reason
//! Operators can rebuild a signing key from a passphrase instead of
//! storing it. The derivation is deterministic: the same passphrase,
//! salt and round count always yield the same key.
//!
//! ## Main Logical Flow
//! ```text
//! D      = pbkdf(passphrase, salt, rounds)
//! secret = D[0..32]
//!
//! with PQ:
//!   salt2 = HMAC-SHA512(secret, salt)
//!   D2    = pbkdf(passphrase, salt2, rounds)
//!   ML-DSA-44 key pair from seed D2[0..32]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The derived secret is NOT clamped; it is clamped at use like any
//!   loaded key
//! - Only ML-DSA-44 supports seeded generation, so seeded PQ keys are
//!   always signing companions
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use tracing::debug;
use zeroize::Zeroizing;

use meshauth_common::CommonError;

use super::kdf::{hmac_sha512, pbkdf_hmac_sha512};
use super::keys::SecretKey;
use super::material::SecretKeyMaterial;
use super::pq::MlDsa44;
use super::SECRET_KEY_SIZE;
use crate::error::{CoreError, Result};

/// Minimum passphrase length in bytes.
pub const MIN_PASSPHRASE_LEN: usize = 12;

/// Derives secret key material from a passphrase.
///
/// # Arguments
/// * `passphrase` - Raw passphrase bytes, at least 12
/// * `salt` - Salt bytes (the CLI passes its whole `rounds,salt` argument)
/// * `rounds` - Iteration count, must be positive
/// * `pq` - Also derive an ML-DSA-44 companion
///
/// # Errors
/// - `PassphraseTooShort` below the minimum length
/// - `CommonError::InvalidInput` for zero rounds
///
/// # Example
/// ```
/// use meshauth_core::crypto::derive_from_seed;
///
/// let a = derive_from_seed(b"correct horse battery", b"10,salt", 10, false).unwrap();
/// let b = derive_from_seed(b"correct horse battery", b"10,salt", 10, false).unwrap();
/// assert_eq!(a.secret.as_bytes(), b.secret.as_bytes());
/// ```
pub fn derive_from_seed(
    passphrase: &[u8],
    salt: &[u8],
    rounds: u32,
    pq: bool,
) -> Result<SecretKeyMaterial> {
    if passphrase.len() < MIN_PASSPHRASE_LEN {
        return Err(CoreError::PassphraseTooShort {
            min: MIN_PASSPHRASE_LEN,
            actual: passphrase.len(),
        });
    }
    if rounds == 0 {
        return Err(CommonError::invalid_input("rounds", "Invalid number of rounds").into());
    }

    let hash = pbkdf_hmac_sha512(passphrase, salt, rounds)?;
    let secret = SecretKey::from_slice(&hash[..SECRET_KEY_SIZE])?;

    let pq = if pq {
        let pq_salt = hmac_sha512(secret.as_bytes(), salt)?;
        let pq_hash = pbkdf_hmac_sha512(passphrase, pq_salt.as_ref(), rounds)?;
        let mut seed = Zeroizing::new([0u8; MlDsa44::SEED_SIZE]);
        seed.copy_from_slice(&pq_hash[..MlDsa44::SEED_SIZE]);
        let (_, pq_secret) = MlDsa44::from_seed(&seed);
        Some(pq_secret.into_buffer())
    } else {
        None
    };

    debug!(rounds, pq = pq.is_some(), "derived key from passphrase");
    Ok(SecretKeyMaterial { secret, pq })
}
