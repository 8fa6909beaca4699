// ============================================
// File: crates/meshauth-tool/src/handlers/pex.rs
// ============================================
//! # PEX Datagram Handler
//!
//! ## Creation Reason
//! The requester and the responder share the same first steps for every
//! datagram (decode, check the network, unfold the sender) and the same
//! rules for answering an update request. Both live here.
//!
//! ## Receive Path
//! ```text
//! datagram ──► decode_message ──► envelope.open ──► InboundMessage
//!                 │ error             │ foreign auth_id
//!                 ▼                   ▼
//!              dropped             dropped
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Drops are logged at debug and never answered; answering would tell
//!   an unauthenticated sender that we exist
//! - Update data is only encrypted to a host key that is both in the
//!   host table and equal to the request's `e_key`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use meshauth_common::PexId;
use meshauth_core::auth::{HostEntry, HostTable};
use meshauth_core::crypto::PublicKey;
use meshauth_core::protocol::{
    decode_message, encode_message, PexBody, PexEnvelope, UpdateRequest,
};
use meshauth_transport::Transport;

use crate::error::Result;

/// A datagram that decoded and belongs to our network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Unfolded sender id.
    pub sender: PexId,
    /// Message body.
    pub body: PexBody,
    /// Source address.
    pub source: SocketAddr,
}

/// Decodes inbound and seals outbound PEX messages for one envelope.
#[derive(Debug, Clone, Copy)]
pub struct PexHandler {
    envelope: PexEnvelope,
}

impl PexHandler {
    /// Creates a handler for `network_key`, sending as `sender_key`.
    #[must_use]
    pub const fn new(network_key: PublicKey, sender_key: PublicKey) -> Self {
        Self {
            envelope: PexEnvelope::new(network_key, sender_key),
        }
    }

    /// A handler for the same network that sends with the all-zero
    /// placeholder key, used for update responses.
    #[must_use]
    pub const fn responder(&self) -> Self {
        Self::new(*self.envelope.network_key(), PublicKey::EMPTY)
    }

    /// Network key of this handler.
    #[must_use]
    pub const fn network_key(&self) -> &PublicKey {
        self.envelope.network_key()
    }

    /// Decodes and authenticates a datagram. Returns `None` if it must be
    /// dropped.
    #[must_use]
    pub fn accept(&self, datagram: &[u8], source: SocketAddr) -> Option<InboundMessage> {
        let msg = match decode_message(datagram) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(%source, error = %e, "dropping undecodable datagram");
                return None;
            }
        };
        let Some(sender) = self.envelope.open(&msg) else {
            debug!(%source, auth_id = %msg.auth_id, "dropping datagram for another network");
            return None;
        };
        trace!(%source, %sender, opcode = ?msg.body.opcode(), "accepted datagram");
        Some(InboundMessage {
            sender,
            body: msg.body,
            source,
        })
    }

    /// Seals and encodes `body`.
    ///
    /// # Errors
    /// `Core` if the id mask cannot be computed.
    pub fn encode(&self, body: PexBody) -> Result<Bytes> {
        let msg = self.envelope.seal(body)?;
        Ok(encode_message(&msg))
    }

    /// Sends each body as its own datagram to `dest`.
    ///
    /// # Errors
    /// `Transport` on the first send failure; the rest are not sent.
    pub async fn send_all<T, I>(&self, transport: &T, bodies: I, dest: SocketAddr) -> Result<usize>
    where
        T: Transport + ?Sized,
        I: IntoIterator<Item = PexBody>,
    {
        let mut sent = 0;
        for body in bodies {
            let datagram = self.encode(body)?;
            transport.send(&datagram, &dest).await?;
            sent += 1;
        }
        Ok(sent)
    }
}

/// Finds the host entry allowed to receive data for `request`.
///
/// The sender must be listed in `hosts` and its key must be the key the
/// request asks us to encrypt to.
#[must_use]
pub fn authorize_request<'a>(
    hosts: &'a HostTable,
    sender: &PexId,
    request: &UpdateRequest,
    source: SocketAddr,
) -> Option<&'a HostEntry> {
    let Some(entry) = hosts.resolve(sender) else {
        warn!(%source, %sender, "Could not find public key");
        return None;
    };
    if entry.key != request.e_key {
        warn!(%source, host = %entry.name, "request key does not match host table");
        return None;
    }
    Some(entry)
}
