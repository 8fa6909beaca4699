// ============================================
// File: crates/meshauth-core/src/protocol/messages.rs
// ============================================
//! # PEX Message Definitions
//!
//! ## Creation Reason
//! Defines the messages two nodes exchange to bring their network data
//! up to date with each other.
//!
//! ## Main Functionality
//! - `Opcode`: body type identifier
//! - One struct per body (`UpdateRequest`, `UpdateResponse`,
//!   `UpdateResponseData`, `UpdateResponseNoData`)
//! - `PexBody`: tagged union over the bodies
//! - `PexMessage`: headers plus body, as decoded from one datagram
//!
//! ## Message Sizes
//! | Part | Size (bytes) |
//! |------|--------------|
//! | Common header | 12 |
//! | Extension header | 16 |
//! | UpdateRequest | 48 |
//! | UpdateResponse | 44 |
//! | UpdateResponseData | 12 + chunk |
//! | UpdateResponseNoData | 16 |
//!
//! ## Wire Format (Big Endian)
//! ```text
//! ┌─────────┬────────┬──────────┬──────────┐
//! │ version │ opcode │ body_len │ id       │  common header
//! │ 1       │ 1      │ 2        │ 8        │
//! ├─────────┴────────┴──┬───────┴──────────┤
//! │ nonce               │ auth_id          │  extension header
//! │ 8                   │ 8                │
//! ├─────────────────────┴──────────────────┤
//! │ body (body_len bytes)                  │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Field order is wire format; do not reorder
//! - Opcode values are shared with other nodes
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use bytes::Bytes;

use meshauth_common::{PexId, Timestamp};

use crate::crypto::PublicKey;

// ============================================
// Size Constants
// ============================================

/// Common header: version, opcode, body length, id.
pub const PEX_HEADER_SIZE: usize = 12;

/// Extension header: nonce, auth id.
pub const PEX_EXT_HEADER_SIZE: usize = 16;

/// Both headers.
pub const PEX_HEADERS_SIZE: usize = PEX_HEADER_SIZE + PEX_EXT_HEADER_SIZE;

/// Largest datagram a node sends.
pub const PEX_MAX_DATAGRAM: usize = 1024;

/// Body size of an update request.
pub const UPDATE_REQUEST_SIZE: usize = 8 + 8 + 32;

/// Body size of an update response.
pub const UPDATE_RESPONSE_SIZE: usize = 8 + 4 + 32;

/// Body size of a data chunk, excluding the chunk.
pub const UPDATE_DATA_HEADER_SIZE: usize = 8 + 4;

/// Body size of a no-data response.
pub const UPDATE_NO_DATA_SIZE: usize = 8 + 8;

/// Largest chunk carried by one data message.
pub const UPDATE_CHUNK_SIZE: usize = PEX_MAX_DATAGRAM - PEX_HEADERS_SIZE - UPDATE_DATA_HEADER_SIZE;

// ============================================
// Opcode
// ============================================

/// PEX body type.
///
/// | Value | Type |
/// |-------|------|
/// | 0x01 | UpdateRequest |
/// | 0x02 | UpdateResponse |
/// | 0x03 | UpdateResponseData |
/// | 0x04 | UpdateResponseNoData |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Ask a peer for newer network data.
    UpdateRequest = 0x01,
    /// Announces an encrypted transfer (or "unchanged" when empty).
    UpdateResponse = 0x02,
    /// One chunk of the encrypted transfer.
    UpdateResponseData = 0x03,
    /// The responder has nothing newer.
    UpdateResponseNoData = 0x04,
}

impl Opcode {
    /// Converts a byte to an opcode.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::UpdateRequest),
            0x02 => Some(Self::UpdateResponse),
            0x03 => Some(Self::UpdateResponseData),
            0x04 => Some(Self::UpdateResponseNoData),
            _ => None,
        }
    }

    /// Byte representation.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the three response opcodes.
    #[must_use]
    pub const fn is_response(self) -> bool {
        !matches!(self, Self::UpdateRequest)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(value)
    }
}

// ============================================
// Bodies
// ============================================

/// Request for network data newer than `cur_version`.
///
/// # Wire Format (48 bytes)
/// ```text
/// req_id u64 | cur_version u64 | e_key [32]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Random id tying responses to this request.
    pub req_id: u64,
    /// Version the requester already has (0 for none).
    pub cur_version: Timestamp,
    /// Requester host key; responses are encrypted to it.
    pub e_key: PublicKey,
}

/// Start of an encrypted transfer.
///
/// # Wire Format (44 bytes)
/// ```text
/// req_id u64 | data_len u32 | e_key [32]
/// ```
/// `data_len == 0` means the requester is up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponse {
    /// Request being answered.
    pub req_id: u64,
    /// Ciphertext length including the tag.
    pub data_len: u32,
    /// Responder ephemeral key.
    pub e_key: PublicKey,
}

/// One ciphertext chunk.
///
/// # Wire Format
/// ```text
/// req_id u64 | offset u32 | chunk (1..=984 bytes)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponseData {
    /// Request being answered.
    pub req_id: u64,
    /// Position of the chunk in the ciphertext.
    pub offset: u32,
    /// Ciphertext bytes.
    pub chunk: Bytes,
}

/// The responder has nothing newer than the request.
///
/// # Wire Format (16 bytes)
/// ```text
/// req_id u64 | cur_version u64
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponseNoData {
    /// Request being answered.
    pub req_id: u64,
    /// Responder's own version.
    pub cur_version: Timestamp,
}

/// Any PEX body, tagged by opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PexBody {
    /// Opcode 1
    UpdateRequest(UpdateRequest),
    /// Opcode 2
    UpdateResponse(UpdateResponse),
    /// Opcode 3
    UpdateResponseData(UpdateResponseData),
    /// Opcode 4
    UpdateResponseNoData(UpdateResponseNoData),
}

impl PexBody {
    /// Opcode of this body.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::UpdateRequest(_) => Opcode::UpdateRequest,
            Self::UpdateResponse(_) => Opcode::UpdateResponse,
            Self::UpdateResponseData(_) => Opcode::UpdateResponseData,
            Self::UpdateResponseNoData(_) => Opcode::UpdateResponseNoData,
        }
    }

    /// Request id carried by every body.
    #[must_use]
    pub const fn req_id(&self) -> u64 {
        match self {
            Self::UpdateRequest(b) => b.req_id,
            Self::UpdateResponse(b) => b.req_id,
            Self::UpdateResponseData(b) => b.req_id,
            Self::UpdateResponseNoData(b) => b.req_id,
        }
    }

    /// Encoded body length.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::UpdateRequest(_) => UPDATE_REQUEST_SIZE,
            Self::UpdateResponse(_) => UPDATE_RESPONSE_SIZE,
            Self::UpdateResponseData(b) => UPDATE_DATA_HEADER_SIZE + b.chunk.len(),
            Self::UpdateResponseNoData(_) => UPDATE_NO_DATA_SIZE,
        }
    }
}

// ============================================
// PexMessage
// ============================================

/// A complete PEX datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PexMessage {
    /// Sender id, folded with the network hash of `nonce`.
    pub id: PexId,
    /// Per-message random nonce.
    pub nonce: u64,
    /// First 8 bytes of the network key.
    pub auth_id: PexId,
    /// Message body.
    pub body: PexBody,
}

impl PexMessage {
    /// Encoded datagram length.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        PEX_HEADERS_SIZE + self.body.encoded_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(PEX_HEADERS_SIZE, 28);
        assert_eq!(UPDATE_REQUEST_SIZE, 48);
        assert_eq!(UPDATE_RESPONSE_SIZE, 44);
        assert_eq!(UPDATE_CHUNK_SIZE, 984);
    }

    #[test]
    fn test_opcode_roundtrip() {
        for byte in 1..=4u8 {
            assert_eq!(Opcode::from_byte(byte).unwrap().as_byte(), byte);
        }
        assert_eq!(Opcode::try_from(0), Err(0));
        assert_eq!(Opcode::try_from(5), Err(5));
        assert!(!Opcode::UpdateRequest.is_response());
        assert!(Opcode::UpdateResponseNoData.is_response());
    }

    #[test]
    fn test_body_accessors() {
        let body = PexBody::UpdateResponseData(UpdateResponseData {
            req_id: 9,
            offset: 0,
            chunk: Bytes::from_static(&[1, 2, 3]),
        });
        assert_eq!(body.opcode(), Opcode::UpdateResponseData);
        assert_eq!(body.req_id(), 9);
        assert_eq!(body.encoded_len(), 15);
    }
}
