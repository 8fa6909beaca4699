// ============================================
// File: crates/meshauth-core/src/protocol/envelope.rs
// ============================================
//! # PEX Envelope
//!
//! ## Creation Reason
//! Every PEX datagram names its sender and its network, but the sender
//! id must not be linkable across messages by outsiders. The id is
//! XOR-folded with a per-nonce hash of the network key, so only nodes
//! that know the network key can unfold it.
//!
//! ## Main Logical Flow
//! ```text
//! seal:  nonce   = random u64
//!        id      = sender_key[0..8] XOR network_hash(network_key, nonce)
//!        auth_id = network_key[0..8]
//!
//! open:  auth_id == network_key[0..8] ?  else drop
//!        sender  = id XOR network_hash(network_key, nonce)
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use rand::RngCore;
use rand::rngs::OsRng;

use meshauth_common::PexId;

use crate::crypto::kdf::network_hash;
use crate::crypto::PublicKey;
use crate::error::Result;
use crate::protocol::messages::{PexBody, PexMessage};

/// Seals and opens PEX messages for one network and one sender key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PexEnvelope {
    network_key: PublicKey,
    sender_key: PublicKey,
}

impl PexEnvelope {
    /// Creates an envelope.
    ///
    /// # Arguments
    /// * `network_key` - Network signing key (auth id and id mask)
    /// * `sender_key` - Key whose id is placed in outgoing headers
    #[must_use]
    pub const fn new(network_key: PublicKey, sender_key: PublicKey) -> Self {
        Self {
            network_key,
            sender_key,
        }
    }

    /// Network key this envelope authenticates against.
    #[must_use]
    pub const fn network_key(&self) -> &PublicKey {
        &self.network_key
    }

    /// Wraps `body` with a fresh nonce and folded sender id.
    ///
    /// # Errors
    /// `KeyDerivation` if the network hash cannot be computed.
    pub fn seal(&self, body: PexBody) -> Result<PexMessage> {
        self.seal_with_nonce(body, OsRng.next_u64())
    }

    fn seal_with_nonce(&self, body: PexBody, nonce: u64) -> Result<PexMessage> {
        let mask = network_hash(&self.network_key, nonce)?;
        Ok(PexMessage {
            id: self.sender_key.pex_id().fold(mask),
            nonce,
            auth_id: self.network_key.pex_id(),
            body,
        })
    }

    /// Checks that `msg` belongs to our network and returns the
    /// unfolded sender id, or `None` if it does not.
    #[must_use]
    pub fn open(&self, msg: &PexMessage) -> Option<PexId> {
        if msg.auth_id != self.network_key.pex_id() {
            return None;
        }
        let mask = network_hash(&self.network_key, msg.nonce).ok()?;
        Some(msg.id.fold(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::UpdateResponseNoData;
    use meshauth_common::Timestamp;

    fn body() -> PexBody {
        PexBody::UpdateResponseNoData(UpdateResponseNoData {
            req_id: 1,
            cur_version: Timestamp::ZERO,
        })
    }

    #[test]
    fn test_seal_open() {
        let network = PublicKey::from_bytes([5; 32]);
        let sender = PublicKey::from_bytes([6; 32]);
        let envelope = PexEnvelope::new(network, sender);

        let msg = envelope.seal(body()).unwrap();
        assert_eq!(msg.auth_id, network.pex_id());
        assert_eq!(envelope.open(&msg), Some(sender.pex_id()));

        let receiver = PexEnvelope::new(network, PublicKey::EMPTY);
        assert_eq!(receiver.open(&msg), Some(sender.pex_id()));
    }

    #[test]
    fn test_id_is_folded() {
        let network = PublicKey::from_bytes([5; 32]);
        let sender = PublicKey::from_bytes([6; 32]);
        let envelope = PexEnvelope::new(network, sender);
        let a = envelope.seal_with_nonce(body(), 1).unwrap();
        let b = envelope.seal_with_nonce(body(), 2).unwrap();
        assert_ne!(a.id, sender.pex_id());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_foreign_network_rejected() {
        let sender = PublicKey::from_bytes([6; 32]);
        let msg = PexEnvelope::new(PublicKey::from_bytes([5; 32]), sender)
            .seal(body())
            .unwrap();
        let other = PexEnvelope::new(PublicKey::from_bytes([7; 32]), sender);
        assert_eq!(other.open(&msg), None);
    }
}
