// ============================================
// File: crates/meshauth-core/src/lib.rs
// ============================================
//! # meshauth Core - Keys, Signed Network Data & PEX Protocol
//!
//! ## Creation Reason
//! Everything in meshauth that is pure computation lives here: key
//! handling, the signed network-data container, and the PEX peer
//! exchange messages. No sockets, no files.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Classical keys (`SecretKey`, `PublicKey`) with edsign-style signing
//!   and X25519 host keys derived from the same secret
//! - Post-quantum companions typed by scheme (ML-DSA-44, sntrup761)
//! - Passphrase seed derivation, XOR key splitting, base64 key text
//! - HKDF session keys and ChaCha20-Poly1305 sealing for PEX transfers
//!
//! ### Auth Module ([`auth`])
//! - `AuthContainer` signing and `validate`
//! - Host table extraction from the JSON payload
//! - `NetworkData`: a validated container with its hosts
//!
//! ### Protocol Module ([`protocol`])
//! - PEX message types and binary codec
//! - Id folding / authentication envelope
//! - Update response streaming and reassembly
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               meshauth-tool                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   meshauth-core  ◄──   meshauth-transport           │
//! │   You are here                │                     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             meshauth-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Container and PEX layouts are wire formats shared with other nodes;
//!   any change is a protocol break
//! - Secret keys are stored raw and clamped at use; do not clamp on load
//!   or XOR splitting stops being self-inverse
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod crypto;
pub mod error;
pub mod protocol;

pub use auth::{validate, AuthContainer, HostTable, NetworkData, ValidatedContainer, ValidationError};
pub use crypto::{
    decode_key, derive_from_seed, encode_key, Host, KeyRole, PublicKey, PublicKeyMaterial,
    SecretKey, SecretKeyMaterial, Signing,
};
pub use error::{CoreError, Result};
pub use protocol::{PexBody, PexEnvelope, PexMessage, UpdateProgress, UpdateReassembly, UpdateResponseStream};
