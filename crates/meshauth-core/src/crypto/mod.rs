// ============================================
// File: crates/meshauth-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes all key handling for meshauth, built on audited RustCrypto
//! and dalek implementations plus the ML-DSA / sntrup761 crates.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: `SecretKey` / `PublicKey`, edsign signing, X25519 host keys,
//!   ephemeral exchange keys and `SessionKey`
//! - [`pq`]: scheme-typed post-quantum keys (`MlDsa44`, `Sntrup761`)
//! - [`material`]: classical + post-quantum bundles, key roles, XOR combine
//! - [`seed`]: passphrase-to-key derivation
//! - [`encoding`]: `base64[:base64]` key text
//! - [`kdf`]: HMAC-SHA512 PBKDF, network hash, HKDF session keys
//! - [`transport`]: ChaCha20-Poly1305 sealing of PEX update payloads
//!
//! ## Key Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │   32-byte secret (stored raw)                               │
//! │        │                                                    │
//! │        ├──► clamp ──► Ed25519 scalar ──► signing public key │
//! │        ├──► SHA512(raw)[32..64] ──► signing nonce prefix    │
//! │        │                                                    │
//! │        └──► clamp ──► X25519 scalar  ──► host public key    │
//! │                                                             │
//! │   optional PQ secret ──► ML-DSA-44 (signing) / sntrup761    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER roll your own primitives; only compose the audited ones
//! - ALL secret key types zero themselves on drop
//! - Clamping happens at scalar use, never when storing a loaded key
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod encoding;
pub mod kdf;
pub mod keys;
pub mod material;
pub mod pq;
pub mod seed;
pub mod transport;

pub use encoding::{decode_key, encode_key, DecodedKey};
pub use keys::{EphemeralKeyPair, PublicKey, SecretKey, SessionKey};
pub use material::{Host, KeyRole, PublicKeyMaterial, SecretKeyMaterial, Signing};
pub use pq::{MlDsa44, PqPublicKey, PqScheme, PqSecretKey, Sntrup761};
pub use seed::{derive_from_seed, MIN_PASSPHRASE_LEN};

// ============================================
// Constants
// ============================================

/// Size of classical public keys (Ed25519 and X25519) in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of classical secret keys in bytes.
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Size of an HMAC-SHA512 output in bytes.
pub const SHA512_HASH_SIZE: usize = 64;

/// Size of ChaCha20-Poly1305 key in bytes.
pub const CHACHA20_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 nonce in bytes.
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// Size of Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// HKDF salt for PEX transfer key derivation.
pub const HKDF_SALT: &[u8] = b"meshauth-pex-v0";

/// HKDF info prefix for PEX transfer key derivation.
pub const HKDF_INFO_PREFIX: &[u8] = b"meshauth-update-key";
