// ============================================
// File: crates/meshauth-core/src/crypto/material.rs
// ============================================
//! # Key Material Bundles
//!
//! ## Creation Reason
//! Key text loaded from a file does not say which role it plays. The same
//! 32 bytes become a signing key under `-P` and a host key under `-H`, and
//! the post-quantum half only gets a scheme once the role is known. This
//! module holds scheme-agnostic bundles and binds them to a role on demand.
//!
//! ## Main Functionality
//! - `KeyRole`: `Signing` (Ed25519 + ML-DSA-44) or `Host` (X25519 + sntrup761)
//! - `SecretKeyMaterial`: classical secret + optional raw PQ secret
//! - `PublicKeyMaterial`: classical public + optional raw PQ public
//! - `combine_xor`: one-time-pad split / recombine
//!
//! ## Main Logical Flow
//! ```text
//! key text ──► DecodedKey ──► SecretKeyMaterial ──┬─► combine_xor(pad)
//!                                                 ├─► public_key::<Role>()
//!                                                 └─► ensure_generated::<Role>()
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `combine_xor` checks the PQ pad before touching anything
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use meshauth_common::SensitiveBuffer;

use super::encoding::DecodedKey;
use super::keys::{PublicKey, SecretKey};
use super::pq::{MlDsa44, PqPublicKey, PqScheme, PqSecretKey, Sntrup761};
use crate::error::{CoreError, Result};

// ============================================
// KeyRole
// ============================================

/// What a key is used for; fixes the classical derivation and PQ scheme.
pub trait KeyRole {
    /// Post-quantum companion scheme for this role.
    type Pq: PqScheme;

    /// Derives the classical public key for this role.
    fn classical_public(secret: &SecretKey) -> PublicKey;
}

/// Network signing keys: Ed25519 + ML-DSA-44.
#[derive(Debug, Clone, Copy)]
pub struct Signing;

impl KeyRole for Signing {
    type Pq = MlDsa44;

    fn classical_public(secret: &SecretKey) -> PublicKey {
        secret.signing_public_key()
    }
}

/// Host keys: X25519 + sntrup761.
#[derive(Debug, Clone, Copy)]
pub struct Host;

impl KeyRole for Host {
    type Pq = Sntrup761;

    fn classical_public(secret: &SecretKey) -> PublicKey {
        secret.host_public_key()
    }
}

// ============================================
// PQ public resolution
// ============================================

/// Resolves the post-quantum public half for role `R`.
///
/// A PQ secret, when present, must have the scheme's secret length and
/// the public key is derived from it. Otherwise a supplied PQ public key,
/// or `want_pq`, demands a public of the scheme's public length.
///
/// # Errors
/// `InvalidKeyLength` on any length mismatch; `KeyGeneration` if the
/// secret cannot be parsed by the scheme.
pub fn resolve_pq_public<R: KeyRole>(
    secret_pq: Option<&SensitiveBuffer>,
    supplied_pq: Option<&[u8]>,
    want_pq: bool,
) -> Result<Option<PqPublicKey<R::Pq>>> {
    if let Some(secret) = secret_pq {
        let secret = PqSecretKey::<R::Pq>::from_bytes(secret.clone())?;
        return secret.public_key().map(Some);
    }
    if want_pq || supplied_pq.is_some() {
        let bytes = supplied_pq.unwrap_or_default();
        return PqPublicKey::<R::Pq>::from_bytes(bytes.to_vec()).map(Some);
    }
    Ok(None)
}

// ============================================
// SecretKeyMaterial
// ============================================

/// Classical secret plus an optional post-quantum secret of unknown scheme.
#[derive(Debug, Clone)]
pub struct SecretKeyMaterial {
    /// Classical 32-byte secret.
    pub secret: SecretKey,
    /// Raw post-quantum secret, bound to a scheme by role at use.
    pub pq: Option<SensitiveBuffer>,
}

impl SecretKeyMaterial {
    /// Wraps a classical secret without a PQ half.
    #[must_use]
    pub const fn classical(secret: SecretKey) -> Self {
        Self { secret, pq: None }
    }

    /// Generates a fresh key for role `R`, with a PQ pair when `pq` is set.
    ///
    /// # Errors
    /// `KeyGeneration` from the PQ generator.
    pub fn generate<R: KeyRole>(pq: bool) -> Result<Self> {
        let mut material = Self::classical(SecretKey::generate());
        if pq {
            material.ensure_pq::<R>()?;
        }
        Ok(material)
    }

    /// Returns existing material unchanged, or generates fresh material.
    /// With `pq`, adds a PQ secret for role `R` if none is present.
    ///
    /// # Errors
    /// `KeyGeneration` from the PQ generator.
    pub fn ensure_generated<R: KeyRole>(existing: Option<Self>, pq: bool) -> Result<Self> {
        let Some(mut material) = existing else {
            return Self::generate::<R>(pq);
        };
        if pq {
            material.ensure_pq::<R>()?;
        }
        Ok(material)
    }

    fn ensure_pq<R: KeyRole>(&mut self) -> Result<()> {
        if self.pq.is_none() {
            let (_, secret) = R::Pq::generate()?;
            self.pq = Some(secret.into_buffer());
        }
        Ok(())
    }

    /// Combines with a one-time pad into new material.
    ///
    /// The classical part is always XORed. The PQ part is XORed only if
    /// the pad carries one, in which case the key must carry a PQ secret
    /// of the same length.
    ///
    /// # Errors
    /// `LengthMismatch` if the pad's PQ half does not match; nothing is
    /// combined in that case.
    pub fn combine_xor(&self, pad: &Self) -> Result<Self> {
        let pq = match (&self.pq, &pad.pq) {
            (_, None) => self.pq.clone(),
            (Some(key), Some(pad_pq)) if key.len() == pad_pq.len() => Some(key.xor(pad_pq)?),
            (key, Some(pad_pq)) => {
                return Err(CoreError::LengthMismatch {
                    expected: key.as_ref().map_or(0, SensitiveBuffer::len),
                    actual: pad_pq.len(),
                })
            }
        };
        Ok(Self {
            secret: self.secret.xor(&pad.secret),
            pq,
        })
    }

    /// Derives the public half for role `R`.
    ///
    /// # Errors
    /// See [`resolve_pq_public`].
    pub fn public_key<R: KeyRole>(&self, want_pq: bool) -> Result<PublicKeyMaterial> {
        let pq = resolve_pq_public::<R>(self.pq.as_ref(), None, want_pq)?;
        Ok(PublicKeyMaterial {
            key: R::classical_public(&self.secret),
            pq: pq.map(PqPublicKey::into_bytes),
        })
    }

    /// Returns the PQ secret checked against role `R`'s scheme.
    ///
    /// # Errors
    /// `InvalidKeyLength` if the stored PQ secret has the wrong length.
    pub fn pq_secret<R: KeyRole>(&self) -> Result<Option<PqSecretKey<R::Pq>>> {
        self.pq
            .as_ref()
            .map(|pq| PqSecretKey::from_bytes(pq.clone()))
            .transpose()
    }
}

impl TryFrom<DecodedKey> for SecretKeyMaterial {
    type Error = CoreError;

    fn try_from(decoded: DecodedKey) -> Result<Self> {
        Ok(Self {
            secret: SecretKey::from_slice(decoded.key.as_bytes())?,
            pq: decoded.pq,
        })
    }
}

// ============================================
// PublicKeyMaterial
// ============================================

/// Classical public key plus an optional post-quantum public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    /// Classical 32-byte public key.
    pub key: PublicKey,
    /// Raw post-quantum public key.
    pub pq: Option<Vec<u8>>,
}

impl PublicKeyMaterial {
    /// Wraps a classical public key without a PQ half.
    #[must_use]
    pub const fn classical(key: PublicKey) -> Self {
        Self { key, pq: None }
    }

    /// Checks an externally supplied key against role `R`.
    ///
    /// # Errors
    /// `InvalidKeyLength` if a PQ half is present or wanted and does not
    /// have the scheme's public length.
    pub fn checked<R: KeyRole>(self, want_pq: bool) -> Result<Self> {
        let pq = resolve_pq_public::<R>(None, self.pq.as_deref(), want_pq)?;
        Ok(Self {
            key: self.key,
            pq: pq.map(PqPublicKey::into_bytes),
        })
    }
}

impl TryFrom<DecodedKey> for PublicKeyMaterial {
    type Error = CoreError;

    fn try_from(decoded: DecodedKey) -> Result<Self> {
        Ok(Self {
            key: PublicKey::from_slice(decoded.key.as_bytes())?,
            pq: decoded.pq.map(|pq| pq.as_bytes().to_vec()),
        })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn material(pq_len: Option<usize>) -> SecretKeyMaterial {
        SecretKeyMaterial {
            secret: SecretKey::from_bytes([0x33; 32]),
            pq: pq_len.map(|len| SensitiveBuffer::new(vec![0xa5; len])),
        }
    }

    #[test]
    fn test_generate_without_pq() {
        let key = SecretKeyMaterial::generate::<Host>(false).unwrap();
        assert!(key.pq.is_none());
    }

    #[test]
    fn test_generate_host_with_pq() {
        let key = SecretKeyMaterial::generate::<Host>(true).unwrap();
        assert_eq!(key.pq.as_ref().unwrap().len(), Sntrup761::SECRET_KEY_SIZE);
        let public = key.public_key::<Host>(true).unwrap();
        assert_eq!(public.pq.unwrap().len(), Sntrup761::PUBLIC_KEY_SIZE);
    }

    #[test]
    fn test_ensure_generated_keeps_existing() {
        let existing = material(None);
        let kept = SecretKeyMaterial::ensure_generated::<Signing>(Some(existing.clone()), false)
            .unwrap();
        assert_eq!(kept.secret.as_bytes(), existing.secret.as_bytes());
        assert!(kept.pq.is_none());

        let with_pq =
            SecretKeyMaterial::ensure_generated::<Signing>(Some(existing.clone()), true).unwrap();
        assert_eq!(with_pq.secret.as_bytes(), existing.secret.as_bytes());
        assert_eq!(with_pq.pq.unwrap().len(), MlDsa44::SECRET_KEY_SIZE);
    }

    #[test]
    fn test_combine_xor_classical() {
        let key = material(None);
        let pad = SecretKeyMaterial::classical(SecretKey::from_bytes([0xff; 32]));
        let combined = key.combine_xor(&pad).unwrap();
        assert_eq!(combined.secret.as_bytes(), &[0xcc; 32]);
        let restored = combined.combine_xor(&pad).unwrap();
        assert_eq!(restored.secret.as_bytes(), key.secret.as_bytes());
    }

    #[test]
    fn test_combine_xor_keeps_pq_without_pad() {
        let key = material(Some(16));
        let pad = SecretKeyMaterial::classical(SecretKey::from_bytes([1; 32]));
        let combined = key.combine_xor(&pad).unwrap();
        assert_eq!(combined.pq.unwrap().as_bytes(), &[0xa5; 16]);
    }

    #[test]
    fn test_combine_xor_pq_length_mismatch() {
        let key = material(Some(16));
        let pad = material(Some(15));
        assert!(matches!(
            key.combine_xor(&pad),
            Err(CoreError::LengthMismatch { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_combine_xor_pad_without_pq_secret() {
        let key = material(None);
        let pad = material(Some(8));
        assert!(matches!(
            key.combine_xor(&pad),
            Err(CoreError::LengthMismatch { expected: 0, actual: 8 })
        ));
    }

    #[test]
    fn test_public_key_roles() {
        let key = material(None);
        let signing = key.public_key::<Signing>(false).unwrap();
        let host = key.public_key::<Host>(false).unwrap();
        assert_eq!(signing.key, key.secret.signing_public_key());
        assert_eq!(host.key, key.secret.host_public_key());
        assert!(signing.pq.is_none());
    }

    #[test]
    fn test_public_key_rejects_wrong_pq_secret() {
        let key = material(Some(100));
        assert!(matches!(
            key.public_key::<Signing>(false),
            Err(CoreError::InvalidKeyLength { scheme: "ML-DSA-44", .. })
        ));
    }

    #[test]
    fn test_checked_requires_pq_when_wanted() {
        let public = PublicKeyMaterial::classical(PublicKey::from_bytes([2; 32]));
        assert!(public.clone().checked::<Signing>(false).is_ok());
        assert!(matches!(
            public.checked::<Signing>(true),
            Err(CoreError::InvalidKeyLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_checked_accepts_matching_pq() {
        let public = PublicKeyMaterial {
            key: PublicKey::from_bytes([2; 32]),
            pq: Some(vec![0; Sntrup761::PUBLIC_KEY_SIZE]),
        };
        assert!(public.clone().checked::<Host>(false).is_ok());
        assert!(public.checked::<Signing>(false).is_err());
    }
}
