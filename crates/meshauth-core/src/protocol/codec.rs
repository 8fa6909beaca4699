// ============================================
// File: crates/meshauth-core/src/protocol/codec.rs
// ============================================
//! # PEX Codec
//!
//! ## Creation Reason
//! Binary encoding of PEX datagrams.
//!
//! ## Parsing Strategy
//! 1. Check the datagram is between the header size and the max datagram
//! 2. Read and check the version byte
//! 3. Read the opcode, body length, id and extension header
//! 4. Check the body length matches what is left
//! 5. Dispatch on opcode to the body parser
//!
//! ## ⚠️ Important Note for Next Developer
//! - Big-endian everywhere
//! - Always check lengths before `get_*`; the `Buf` getters panic on
//!   short input
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use meshauth_common::{PexId, Timestamp};

use crate::crypto::{PublicKey, PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::messages::{
    Opcode, PexBody, PexMessage, UpdateRequest, UpdateResponse, UpdateResponseData,
    UpdateResponseNoData, PEX_HEADERS_SIZE, PEX_MAX_DATAGRAM, UPDATE_DATA_HEADER_SIZE,
    UPDATE_NO_DATA_SIZE, UPDATE_REQUEST_SIZE, UPDATE_RESPONSE_SIZE,
};
use crate::protocol::version::{is_supported, PEX_PROTOCOL_VERSION};

// ============================================
// Codec Trait
// ============================================

/// Encode/decode interface for one message type.
pub trait Codec<T> {
    /// Appends the encoding of `msg` to `buf`.
    fn encode(&self, msg: &T, buf: &mut BytesMut);

    /// Decodes a message, consuming `buf`.
    ///
    /// # Errors
    /// Any decode failure; the datagram should be dropped.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// PexCodec
// ============================================

/// Codec for PEX datagrams.
#[derive(Debug, Default, Clone, Copy)]
pub struct PexCodec;

impl PexCodec {
    /// Creates a codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn get_id(buf: &mut Bytes) -> PexId {
        let mut id = [0u8; 8];
        buf.copy_to_slice(&mut id);
        PexId::from_bytes(id)
    }

    fn get_key(buf: &mut Bytes) -> PublicKey {
        let mut key = [0u8; PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut key);
        PublicKey::from_bytes(key)
    }

    fn expect_len(buf: &Bytes, expected: usize) -> Result<()> {
        if buf.len() == expected {
            Ok(())
        } else {
            Err(CoreError::malformed(format!(
                "body length {} does not match opcode size {expected}",
                buf.len()
            )))
        }
    }

    fn decode_body(opcode: Opcode, buf: &mut Bytes) -> Result<PexBody> {
        let body = match opcode {
            Opcode::UpdateRequest => {
                Self::expect_len(buf, UPDATE_REQUEST_SIZE)?;
                PexBody::UpdateRequest(UpdateRequest {
                    req_id: buf.get_u64(),
                    cur_version: Timestamp::from_secs(buf.get_u64()),
                    e_key: Self::get_key(buf),
                })
            }
            Opcode::UpdateResponse => {
                Self::expect_len(buf, UPDATE_RESPONSE_SIZE)?;
                PexBody::UpdateResponse(UpdateResponse {
                    req_id: buf.get_u64(),
                    data_len: buf.get_u32(),
                    e_key: Self::get_key(buf),
                })
            }
            Opcode::UpdateResponseData => {
                if buf.len() <= UPDATE_DATA_HEADER_SIZE {
                    return Err(CoreError::too_short(UPDATE_DATA_HEADER_SIZE + 1, buf.len()));
                }
                let req_id = buf.get_u64();
                let offset = buf.get_u32();
                let chunk = buf.split_to(buf.len());
                PexBody::UpdateResponseData(UpdateResponseData {
                    req_id,
                    offset,
                    chunk,
                })
            }
            Opcode::UpdateResponseNoData => {
                Self::expect_len(buf, UPDATE_NO_DATA_SIZE)?;
                PexBody::UpdateResponseNoData(UpdateResponseNoData {
                    req_id: buf.get_u64(),
                    cur_version: Timestamp::from_secs(buf.get_u64()),
                })
            }
        };
        Ok(body)
    }
}

impl Codec<PexMessage> for PexCodec {
    fn encode(&self, msg: &PexMessage, buf: &mut BytesMut) {
        let body_len = msg.body.encoded_len();
        buf.reserve(PEX_HEADERS_SIZE + body_len);

        buf.put_u8(PEX_PROTOCOL_VERSION);
        buf.put_u8(msg.body.opcode().as_byte());
        buf.put_u16(u16::try_from(body_len).unwrap_or(u16::MAX));
        buf.put_slice(msg.id.as_bytes());
        buf.put_u64(msg.nonce);
        buf.put_slice(msg.auth_id.as_bytes());

        match &msg.body {
            PexBody::UpdateRequest(b) => {
                buf.put_u64(b.req_id);
                buf.put_u64(b.cur_version.as_secs());
                buf.put_slice(b.e_key.as_bytes());
            }
            PexBody::UpdateResponse(b) => {
                buf.put_u64(b.req_id);
                buf.put_u32(b.data_len);
                buf.put_slice(b.e_key.as_bytes());
            }
            PexBody::UpdateResponseData(b) => {
                buf.put_u64(b.req_id);
                buf.put_u32(b.offset);
                buf.put_slice(&b.chunk);
            }
            PexBody::UpdateResponseNoData(b) => {
                buf.put_u64(b.req_id);
                buf.put_u64(b.cur_version.as_secs());
            }
        }
    }

    fn decode(&self, buf: &mut Bytes) -> Result<PexMessage> {
        if buf.len() < PEX_HEADERS_SIZE {
            return Err(CoreError::too_short(PEX_HEADERS_SIZE, buf.len()));
        }
        if buf.len() > PEX_MAX_DATAGRAM {
            return Err(CoreError::MessageTooLarge {
                max: PEX_MAX_DATAGRAM,
                actual: buf.len(),
            });
        }

        let version = buf.get_u8();
        if !is_supported(version) {
            return Err(CoreError::UnsupportedVersion {
                got: version,
                expected: PEX_PROTOCOL_VERSION,
            });
        }
        let op_byte = buf.get_u8();
        let opcode = Opcode::from_byte(op_byte).ok_or(CoreError::UnknownMessageType(op_byte))?;
        let body_len = usize::from(buf.get_u16());
        let id = Self::get_id(buf);
        let nonce = buf.get_u64();
        let auth_id = Self::get_id(buf);

        if body_len != buf.len() {
            return Err(CoreError::malformed(format!(
                "header says {body_len} body bytes, datagram has {}",
                buf.len()
            )));
        }

        let body = Self::decode_body(opcode, buf)?;
        Ok(PexMessage {
            id,
            nonce,
            auth_id,
            body,
        })
    }
}

// ============================================
// Helpers
// ============================================

/// Encodes one datagram.
#[must_use]
pub fn encode_message(msg: &PexMessage) -> Bytes {
    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    PexCodec.encode(msg, &mut buf);
    buf.freeze()
}

/// Decodes one datagram.
///
/// # Errors
/// Short, oversized, wrong-version, unknown-opcode or inconsistent
/// datagrams.
pub fn decode_message(datagram: &[u8]) -> Result<PexMessage> {
    let mut buf = Bytes::copy_from_slice(datagram);
    PexCodec.decode(&mut buf)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::UPDATE_CHUNK_SIZE;

    fn message(body: PexBody) -> PexMessage {
        PexMessage {
            id: PexId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]),
            nonce: 0x0102_0304_0506_0708,
            auth_id: PexId::from_bytes([9; 8]),
            body,
        }
    }

    fn request() -> PexMessage {
        message(PexBody::UpdateRequest(UpdateRequest {
            req_id: 77,
            cur_version: Timestamp::from_secs(1_700_000_000),
            e_key: PublicKey::from_bytes([0xab; 32]),
        }))
    }

    #[test]
    fn test_request_layout() {
        let bytes = encode_message(&request());
        assert_eq!(bytes.len(), PEX_HEADERS_SIZE + UPDATE_REQUEST_SIZE);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[2..4], &48u16.to_be_bytes());
        assert_eq!(&bytes[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[12..20], &0x0102_0304_0506_0708u64.to_be_bytes());
        assert_eq!(&bytes[28..36], &77u64.to_be_bytes());
    }

    #[test]
    fn test_decode_each_opcode() {
        let bodies = [
            request().body,
            PexBody::UpdateResponse(UpdateResponse {
                req_id: 1,
                data_len: 500,
                e_key: PublicKey::from_bytes([3; 32]),
            }),
            PexBody::UpdateResponseData(UpdateResponseData {
                req_id: 1,
                offset: 984,
                chunk: Bytes::from(vec![7u8; UPDATE_CHUNK_SIZE]),
            }),
            PexBody::UpdateResponseNoData(UpdateResponseNoData {
                req_id: 1,
                cur_version: Timestamp::from_secs(5),
            }),
        ];
        for body in bodies {
            let msg = message(body);
            let bytes = encode_message(&msg);
            assert!(bytes.len() <= PEX_MAX_DATAGRAM);
            assert_eq!(decode_message(&bytes).unwrap(), msg);
        }
    }

    #[test]
    fn test_rejects_bad_version() {
        let mut bytes = encode_message(&request()).to_vec();
        bytes[0] = 1;
        assert!(matches!(
            decode_message(&bytes),
            Err(CoreError::UnsupportedVersion { got: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_opcode() {
        let mut bytes = encode_message(&request()).to_vec();
        bytes[1] = 9;
        assert!(matches!(decode_message(&bytes), Err(CoreError::UnknownMessageType(9))));
    }

    #[test]
    fn test_rejects_short_and_truncated() {
        assert!(matches!(
            decode_message(&[0u8; 10]),
            Err(CoreError::MessageTooShort { .. })
        ));
        let bytes = encode_message(&request());
        assert!(decode_message(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        assert!(matches!(
            decode_message(&[0u8; PEX_MAX_DATAGRAM + 1]),
            Err(CoreError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_fixed_body_length() {
        let mut bytes = encode_message(&request()).to_vec();
        bytes.push(0);
        bytes[2..4].copy_from_slice(&49u16.to_be_bytes());
        assert!(matches!(
            decode_message(&bytes),
            Err(CoreError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_chunk() {
        let mut buf = BytesMut::new();
        buf.put_u8(0);
        buf.put_u8(3);
        buf.put_u16(12);
        buf.put_slice(&[0u8; 24]);
        buf.put_u64(1);
        buf.put_u32(0);
        assert!(decode_message(&buf).is_err());
    }
}
