// ============================================
// File: crates/meshauth-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! One 32-byte secret serves a node both as its Ed25519 signing key and as
//! its X25519 host key. This module owns that secret and the public keys
//! derived from it, plus the short-lived keys used during a PEX transfer.
//!
//! ## Main Functionality
//! - `SecretKey`: raw 32-byte secret, clamped at every scalar use
//! - `PublicKey`: 32-byte public key (signing or host, by context)
//! - `EphemeralKeyPair`: single-use X25519 key for a transfer
//! - `SessionKey`: symmetric key derived for one transfer
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  SecretKey (long-term)                                     │
//! │  ├─ generated clamped, or loaded raw from key text         │
//! │  ├─ signs containers (edsign: scalar = clamp(secret))      │
//! │  └─ answers X25519 exchanges as the host key               │
//! │                                                            │
//! │  EphemeralKeyPair (per transfer)                           │
//! │  ├─ created by the responder for one update response       │
//! │  └─ consumed by the exchange                               │
//! │                                                            │
//! │  SessionKey (per transfer)                                 │
//! │  └─ seals the container while it crosses the wire          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL secret types zero themselves on drop
//! - Do NOT clamp in `from_bytes`: XOR shares are arbitrary bytes and must
//!   combine back to the exact original secret
//! - Signatures are standard Ed25519 and verify with any Ed25519 verifier,
//!   but the scalar is not SHA-512 expanded from the secret
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use curve25519_dalek::scalar::clamp_integer;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use meshauth_common::{CommonError, PexId};

use super::{CHACHA20_KEY_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// SecretKey
// ============================================

/// Long-term 32-byte secret key.
///
/// # Security
/// - Zeroed on drop
/// - Stored exactly as loaded; clamped copies are made per operation
///
/// # Example
/// ```
/// use meshauth_core::crypto::SecretKey;
///
/// let secret = SecretKey::generate();
/// let signature = secret.sign(b"network data");
/// assert!(secret.signing_public_key().verify(b"network data", &signature).is_ok());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    /// Generates a fresh random secret, stored clamped.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        let key = Self(clamp_integer(bytes));
        bytes.zeroize();
        key
    }

    /// Wraps raw secret bytes without modification.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Wraps a slice that must be exactly 32 bytes.
    ///
    /// # Errors
    /// `CommonError::InvalidLength` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SECRET_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CommonError::invalid_length(SECRET_KEY_SIZE, bytes.len()))?;
        Ok(Self(arr))
    }

    /// Returns the raw secret bytes.
    ///
    /// # Security Warning
    /// Only for encoding the key back to text. Never log.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }

    /// XORs with a pad into a new key.
    #[must_use]
    pub fn xor(&self, pad: &Self) -> Self {
        let mut out = [0u8; SECRET_KEY_SIZE];
        for (o, (a, b)) in out.iter_mut().zip(self.0.iter().zip(pad.0.iter())) {
            *o = a ^ b;
        }
        Self(out)
    }

    fn clamped(&self) -> Zeroizing<[u8; SECRET_KEY_SIZE]> {
        Zeroizing::new(clamp_integer(self.0))
    }

    fn expanded(&self) -> ExpandedSecretKey {
        let mut bytes = Zeroizing::new([0u8; 64]);
        bytes.copy_from_slice(&Sha512::digest(self.0));
        bytes[..32].copy_from_slice(self.clamped().as_ref());
        ExpandedSecretKey::from_bytes(&bytes)
    }

    fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(*self.clamped())
    }

    /// Ed25519 public key: `clamp(secret) * B`.
    #[must_use]
    pub fn signing_public_key(&self) -> PublicKey {
        PublicKey(VerifyingKey::from(&self.expanded()).to_bytes())
    }

    /// X25519 public key: `X25519(clamp(secret), 9)`.
    #[must_use]
    pub fn host_public_key(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.static_secret()).to_bytes())
    }

    /// Signs `message`, producing a standard 64-byte Ed25519 signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        let esk = self.expanded();
        let verifying_key = VerifyingKey::from(&esk);
        let signature: Signature = raw_sign::<Sha512>(&esk, message, &verifying_key);
        signature.to_bytes()
    }

    /// X25519 exchange using this secret as the host key.
    #[must_use]
    pub fn diffie_hellman(&self, peer_public: &PublicKey) -> Zeroizing<[u8; 32]> {
        let peer = X25519PublicKey::from(peer_public.0);
        let shared = self.static_secret().diffie_hellman(&peer);
        Zeroizing::new(*shared.as_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

// ============================================
// PublicKey
// ============================================

/// 32-byte public key, either an Ed25519 signing key or an X25519 host key.
///
/// Safe to share publicly. Text form is standard base64.
#[derive(Clone, Copy, Default, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// All-zero key, used as the sender placeholder when serving an upload.
    pub const EMPTY: Self = Self([0u8; PUBLIC_KEY_SIZE]);

    /// Creates a public key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a public key from a slice that must be exactly 32 bytes.
    ///
    /// # Errors
    /// `CommonError::InvalidLength` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CommonError::invalid_length(PUBLIC_KEY_SIZE, bytes.len()))?;
        Ok(Self(arr))
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Returns the raw public key bytes (owned).
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// The 8-byte PEX identifier of this key.
    #[must_use]
    pub fn pex_id(&self) -> PexId {
        PexId::from_key(&self.0)
    }

    /// Verifies an Ed25519 signature made by this key.
    ///
    /// # Errors
    /// `SignatureVerification` if the key is not a valid point or the
    /// signature does not verify.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::SignatureVerification)?;
        let sig = Signature::from_bytes(signature);
        key.verify(message, &sig)
            .map_err(|_| CoreError::SignatureVerification)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

impl FromStr for PublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CoreError::key_parse(e.to_string()))?;
        Self::from_slice(&bytes).map_err(|_| CoreError::key_parse("public key must be 32 bytes"))
    }
}

// ============================================
// EphemeralKeyPair (X25519)
// ============================================

/// Ephemeral X25519 key pair for one update transfer.
///
/// The responder generates one per response, sends its public half as the
/// response `e_key`, and derives the transfer key against the requester's
/// host key. `exchange` consumes the pair so the secret cannot be reused.
///
/// # Example
/// ```
/// use meshauth_core::crypto::{EphemeralKeyPair, SecretKey};
///
/// let host = SecretKey::generate();
/// let ephemeral = EphemeralKeyPair::generate();
/// let ephemeral_public = ephemeral.public_key();
///
/// let responder_shared = ephemeral.exchange(&host.host_public_key());
/// let requester_shared = host.diffie_hellman(&ephemeral_public);
/// assert_eq!(*responder_shared, *requester_shared);
/// ```
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: X25519PublicKey,
}

impl EphemeralKeyPair {
    /// Generates a new random ephemeral key pair.
    #[must_use]
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Returns the public half.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.public.to_bytes())
    }

    /// Performs the exchange with a peer's host key, consuming the pair.
    #[must_use]
    pub fn exchange(self, peer_public: &PublicKey) -> Zeroizing<[u8; 32]> {
        let peer = X25519PublicKey::from(peer_public.0);
        let shared = self.secret.diffie_hellman(&peer);
        Zeroizing::new(*shared.as_bytes())
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

// ============================================
// SessionKey
// ============================================

/// Symmetric key sealing one update transfer.
///
/// # Derivation
/// ```text
/// shared      = X25519(responder_ephemeral, requester_host_key)
/// session_key = HKDF-SHA256(
///     ikm:  shared,
///     salt: "meshauth-pex-v0",
///     info: prefix || requester_host_key || responder_ephemeral_public
/// )
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; CHACHA20_KEY_SIZE]);

impl SessionKey {
    /// Creates a session key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHACHA20_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHACHA20_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SessionKey {}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
    use curve25519_dalek::Scalar;

    #[test]
    fn test_generated_key_is_clamped() {
        let key = SecretKey::generate();
        let bytes = key.as_bytes();
        assert_eq!(bytes[0] & 0x07, 0);
        assert_eq!(bytes[31] & 0x80, 0);
        assert_eq!(bytes[31] & 0x40, 0x40);
    }

    #[test]
    fn test_from_bytes_keeps_raw_value() {
        let key = SecretKey::from_bytes([0xff; 32]);
        assert_eq!(key.as_bytes(), &[0xff; 32]);
    }

    #[test]
    fn test_signing_public_is_clamped_scalar_image() {
        let key = SecretKey::from_bytes([0x11; 32]);
        let scalar = Scalar::from_bytes_mod_order(clamp_integer([0x11; 32]));
        let expected = (&scalar * ED25519_BASEPOINT_TABLE).compress().to_bytes();
        assert_eq!(key.signing_public_key().as_bytes(), &expected);
    }

    #[test]
    fn test_sign_verify() {
        let key = SecretKey::generate();
        let public = key.signing_public_key();
        let signature = key.sign(b"test message");

        assert!(public.verify(b"test message", &signature).is_ok());
        assert!(matches!(
            public.verify(b"wrong message", &signature),
            Err(CoreError::SignatureVerification)
        ));
    }

    #[test]
    fn test_signature_verifies_with_plain_ed25519() {
        let key = SecretKey::generate();
        let signature = key.sign(b"interop");
        let verifying = VerifyingKey::from_bytes(key.signing_public_key().as_bytes()).unwrap();
        assert!(verifying
            .verify_strict(b"interop", &Signature::from_bytes(&signature))
            .is_ok());
    }

    #[test]
    fn test_unclamped_and_clamped_secret_share_public_keys() {
        let raw = [0xff; 32];
        let raw_key = SecretKey::from_bytes(raw);
        let clamped_key = SecretKey::from_bytes(clamp_integer(raw));
        assert_eq!(raw_key.host_public_key(), clamped_key.host_public_key());
        assert_eq!(raw_key.signing_public_key(), clamped_key.signing_public_key());
    }

    #[test]
    fn test_host_and_signing_keys_differ() {
        let key = SecretKey::generate();
        assert_ne!(key.host_public_key(), key.signing_public_key());
    }

    #[test]
    fn test_static_exchange_agrees() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let ab = alice.diffie_hellman(&bob.host_public_key());
        let ba = bob.diffie_hellman(&alice.host_public_key());
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_ephemeral_key_exchange() {
        let host = SecretKey::generate();
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let responder = ephemeral.exchange(&host.host_public_key());
        let requester = host.diffie_hellman(&ephemeral_public);
        assert_eq!(*responder, *requester);
    }

    #[test]
    fn test_xor_roundtrip() {
        let key = SecretKey::generate();
        let pad = SecretKey::from_bytes([0x5a; 32]);
        let share = key.xor(&pad);
        assert_ne!(share.as_bytes(), key.as_bytes());
        assert_eq!(share.xor(&pad).as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_public_key_text_roundtrip() {
        let public = SecretKey::generate().host_public_key();
        let parsed: PublicKey = public.to_string().parse().unwrap();
        assert_eq!(parsed, public);

        assert!(matches!(
            "AAAA".parse::<PublicKey>(),
            Err(CoreError::KeyParse { .. })
        ));
    }

    #[test]
    fn test_from_slice_length() {
        assert!(SecretKey::from_slice(&[0u8; 31]).is_err());
        assert!(PublicKey::from_slice(&[0u8; 33]).is_err());
        assert!(PublicKey::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = SecretKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{key:?}"), "SecretKey([REDACTED])");
        let session = SessionKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{session:?}"), "SessionKey([REDACTED])");
    }
}
