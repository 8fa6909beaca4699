// ============================================
// File: crates/meshauth-core/src/crypto/pq.rs
// ============================================
//! # Post-Quantum Key Companions
//!
//! ## Creation Reason
//! A classical key may carry a post-quantum companion: ML-DSA-44 next to
//! a signing key, sntrup761 next to a host key. The two schemes have
//! different sizes, so the buffers are typed by scheme and their lengths
//! checked whenever raw bytes are bound to a scheme.
//!
//! ## Main Functionality
//! - `PqScheme`: sizes plus key-pair generation and public derivation
//! - `MlDsa44`: signing companion (`fips204`), also seedable
//! - `Sntrup761`: host companion (`pqcrypto-ntruprime`)
//! - `PqPublicKey<S>` / `PqSecretKey<S>`: length-checked buffers
//!
//! ## Sizes
//! ```text
//! ┌────────────┬────────────┬────────────┐
//! │ scheme     │ public     │ secret     │
//! ├────────────┼────────────┼────────────┤
//! │ ML-DSA-44  │ 1312       │ 2560       │
//! │ sntrup761  │ 1158       │ 1763       │
//! └────────────┴────────────┴────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - sntrup761 has no seeded key generation; the public key is read out
//!   of the secret key layout (`f | ginv | pk | rho | hash`)
//! - The scheme per role is fixed at build time; there is no negotiation
//!
//! ## Last Modified
//! v0.1.0 - Initial post-quantum support

use std::fmt;
use std::marker::PhantomData;

use fips204::ml_dsa_44;
use fips204::traits::{KeyGen, SerDes, Signer};
use pqcrypto_ntruprime::sntrup761;
use pqcrypto_traits::kem::{PublicKey as _, SecretKey as _};

use meshauth_common::SensitiveBuffer;

use crate::error::{CoreError, Result};

// ============================================
// PqScheme
// ============================================

/// A post-quantum key scheme usable as a key companion.
pub trait PqScheme: Sized {
    /// Human-readable scheme name for errors and logs.
    const NAME: &'static str;
    /// Public key length in bytes.
    const PUBLIC_KEY_SIZE: usize;
    /// Secret key length in bytes.
    const SECRET_KEY_SIZE: usize;

    /// Generates a fresh random key pair.
    ///
    /// # Errors
    /// `KeyGeneration` if the underlying generator fails.
    fn generate() -> Result<(PqPublicKey<Self>, PqSecretKey<Self>)>;

    /// Derives the public key belonging to `secret`.
    ///
    /// # Errors
    /// `KeyGeneration` if the secret bytes are not a valid key.
    fn public_from_secret(secret: &PqSecretKey<Self>) -> Result<PqPublicKey<Self>>;
}

// ============================================
// PqPublicKey / PqSecretKey
// ============================================

/// Post-quantum public key bound to scheme `S`.
pub struct PqPublicKey<S> {
    bytes: Vec<u8>,
    _scheme: PhantomData<S>,
}

impl<S: PqScheme> PqPublicKey<S> {
    /// Binds raw bytes to the scheme.
    ///
    /// # Errors
    /// `InvalidKeyLength` unless `bytes.len() == S::PUBLIC_KEY_SIZE`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != S::PUBLIC_KEY_SIZE {
            return Err(CoreError::InvalidKeyLength {
                scheme: S::NAME,
                expected: S::PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            _scheme: PhantomData,
        })
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Unwraps into the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<S> Clone for PqPublicKey<S> {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            _scheme: PhantomData,
        }
    }
}

impl<S> PartialEq for PqPublicKey<S> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<S> Eq for PqPublicKey<S> {}

impl<S: PqScheme> fmt::Debug for PqPublicKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PqPublicKey<{}>({} bytes)", S::NAME, self.bytes.len())
    }
}

/// Post-quantum secret key bound to scheme `S`. Zeroed on drop.
pub struct PqSecretKey<S> {
    bytes: SensitiveBuffer,
    _scheme: PhantomData<S>,
}

impl<S: PqScheme> PqSecretKey<S> {
    /// Binds raw bytes to the scheme.
    ///
    /// # Errors
    /// `InvalidKeyLength` unless `bytes.len() == S::SECRET_KEY_SIZE`.
    pub fn from_bytes(bytes: SensitiveBuffer) -> Result<Self> {
        if bytes.len() != S::SECRET_KEY_SIZE {
            return Err(CoreError::InvalidKeyLength {
                scheme: S::NAME,
                expected: S::SECRET_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            _scheme: PhantomData,
        })
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    /// Unwraps into the sensitive buffer.
    #[must_use]
    pub fn into_buffer(self) -> SensitiveBuffer {
        self.bytes
    }

    /// Derives the matching public key.
    ///
    /// # Errors
    /// See [`PqScheme::public_from_secret`].
    pub fn public_key(&self) -> Result<PqPublicKey<S>> {
        S::public_from_secret(self)
    }
}

impl<S: PqScheme> fmt::Debug for PqSecretKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PqSecretKey<{}>([REDACTED])", S::NAME)
    }
}

// ============================================
// ML-DSA-44 (signing companion)
// ============================================

/// ML-DSA-44 signature scheme (FIPS 204).
#[derive(Debug, Clone, Copy)]
pub struct MlDsa44;

impl MlDsa44 {
    /// Size of the deterministic key generation seed.
    pub const SEED_SIZE: usize = 32;

    /// Deterministic key pair from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; Self::SEED_SIZE]) -> (PqPublicKey<Self>, PqSecretKey<Self>) {
        let (pk, sk) = ml_dsa_44::KG::keygen_from_seed(seed);
        Self::wrap(pk, sk)
    }

    fn wrap(
        pk: ml_dsa_44::PublicKey,
        sk: ml_dsa_44::PrivateKey,
    ) -> (PqPublicKey<Self>, PqSecretKey<Self>) {
        (
            PqPublicKey {
                bytes: pk.into_bytes().to_vec(),
                _scheme: PhantomData,
            },
            PqSecretKey {
                bytes: SensitiveBuffer::new(sk.into_bytes().to_vec()),
                _scheme: PhantomData,
            },
        )
    }
}

impl PqScheme for MlDsa44 {
    const NAME: &'static str = "ML-DSA-44";
    const PUBLIC_KEY_SIZE: usize = ml_dsa_44::PK_LEN;
    const SECRET_KEY_SIZE: usize = ml_dsa_44::SK_LEN;

    fn generate() -> Result<(PqPublicKey<Self>, PqSecretKey<Self>)> {
        let (pk, sk) = ml_dsa_44::KG::try_keygen()
            .map_err(|e| CoreError::key_generation(format!("{}: {e}", Self::NAME)))?;
        Ok(Self::wrap(pk, sk))
    }

    fn public_from_secret(secret: &PqSecretKey<Self>) -> Result<PqPublicKey<Self>> {
        let bytes: [u8; ml_dsa_44::SK_LEN] = secret
            .as_bytes()
            .try_into()
            .map_err(|_| CoreError::key_generation("ML-DSA-44 secret length"))?;
        let sk = ml_dsa_44::PrivateKey::try_from_bytes(bytes)
            .map_err(|e| CoreError::key_generation(format!("{}: {e}", Self::NAME)))?;
        Ok(PqPublicKey {
            bytes: sk.get_public_key().into_bytes().to_vec(),
            _scheme: PhantomData,
        })
    }
}

// ============================================
// sntrup761 (host companion)
// ============================================

/// Streamlined NTRU Prime 761 key encapsulation.
#[derive(Debug, Clone, Copy)]
pub struct Sntrup761;

impl Sntrup761 {
    /// Offset of the embedded public key inside a secret key.
    const SECRET_PUBLIC_OFFSET: usize = 382;
}

impl PqScheme for Sntrup761 {
    const NAME: &'static str = "sntrup761";
    const PUBLIC_KEY_SIZE: usize = 1158;
    const SECRET_KEY_SIZE: usize = 1763;

    fn generate() -> Result<(PqPublicKey<Self>, PqSecretKey<Self>)> {
        let (pk, sk) = sntrup761::keypair();
        Ok((
            PqPublicKey::from_bytes(pk.as_bytes().to_vec())?,
            PqSecretKey::from_bytes(SensitiveBuffer::from_slice(sk.as_bytes()))?,
        ))
    }

    fn public_from_secret(secret: &PqSecretKey<Self>) -> Result<PqPublicKey<Self>> {
        let start = Self::SECRET_PUBLIC_OFFSET;
        let public = secret
            .as_bytes()
            .get(start..start + Self::PUBLIC_KEY_SIZE)
            .ok_or_else(|| CoreError::key_generation("sntrup761 secret too short"))?;
        PqPublicKey::from_bytes(public.to_vec())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_sizes() {
        assert_eq!(MlDsa44::PUBLIC_KEY_SIZE, 1312);
        assert_eq!(MlDsa44::SECRET_KEY_SIZE, 2560);
        assert_eq!(Sntrup761::PUBLIC_KEY_SIZE, sntrup761::public_key_bytes());
        assert_eq!(Sntrup761::SECRET_KEY_SIZE, sntrup761::secret_key_bytes());
    }

    #[test]
    fn test_ml_dsa_seed_is_deterministic() {
        let (pk1, sk1) = MlDsa44::from_seed(&[7u8; 32]);
        let (pk2, sk2) = MlDsa44::from_seed(&[7u8; 32]);
        let (pk3, _) = MlDsa44::from_seed(&[8u8; 32]);
        assert_eq!(pk1, pk2);
        assert_eq!(sk1.as_bytes(), sk2.as_bytes());
        assert_ne!(pk1, pk3);
    }

    #[test]
    fn test_ml_dsa_public_from_secret() {
        let (pk, sk) = MlDsa44::generate().unwrap();
        assert_eq!(sk.public_key().unwrap(), pk);
    }

    #[test]
    fn test_sntrup_public_from_secret() {
        let (pk, sk) = Sntrup761::generate().unwrap();
        assert_eq!(sk.public_key().unwrap(), pk);
    }

    #[test]
    fn test_length_checks() {
        let err = PqPublicKey::<MlDsa44>::from_bytes(vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidKeyLength { scheme: "ML-DSA-44", expected: 1312, actual: 10 }
        ));

        let err = PqSecretKey::<Sntrup761>::from_bytes(SensitiveBuffer::new(vec![0; 2560]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidKeyLength { expected: 1763, .. }));
    }
}
