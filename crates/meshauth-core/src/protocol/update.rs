// ============================================
// File: crates/meshauth-core/src/protocol/update.rs
// ============================================
//! # Update Transfer
//!
//! ## Creation Reason
//! A container does not fit in one datagram. The responder seals it to
//! the requester's host key and streams the ciphertext in chunks; the
//! requester collects chunks until the ciphertext is complete and opens
//! it.
//!
//! ## Main Logical Flow
//! ```text
//! Responder                                   Requester
//!   EphemeralKeyPair::generate()
//!   K = HKDF(X25519(eph, requester_host_key))
//!   C = seal(K, req_id, container)
//!   UpdateResponse { data_len = |C|, e_key = eph_pub } ──►  allocate |C|
//!   UpdateResponseData { offset 0,   C[0..984]     } ──►  copy
//!   UpdateResponseData { offset 984, C[984..1968]  } ──►  copy
//!   ...                                                    all chunks?
//!                                                          K = HKDF(X25519(host, eph_pub))
//!                                                          open(K, req_id, C)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Data chunks that arrive before their `UpdateResponse` are dropped;
//!   UDP may reorder, and the deadline covers the resulting stall
//! - `data_len` is capped so a peer cannot make us allocate more than a
//!   maximum-size container plus tag
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use bytes::Bytes;
use tracing::{debug, trace};

use meshauth_common::Timestamp;

use crate::auth::MAX_CONTAINER_SIZE;
use crate::crypto::kdf::derive_session_key;
use crate::crypto::transport::{open_update, seal_update, ENCRYPTION_OVERHEAD};
use crate::crypto::{EphemeralKeyPair, PublicKey, SecretKey};
use crate::error::{CoreError, Result};
use crate::protocol::messages::{
    PexBody, UpdateResponse, UpdateResponseData, UpdateResponseNoData, UPDATE_CHUNK_SIZE,
};

/// Largest `data_len` accepted in an update response.
pub const MAX_UPDATE_DATA_LEN: usize = MAX_CONTAINER_SIZE + ENCRYPTION_OVERHEAD;

// ============================================
// UpdateResponseStream
// ============================================

/// Bodies that answer one update request, in sending order.
///
/// # Example
/// ```
/// use meshauth_core::crypto::SecretKey;
/// use meshauth_core::protocol::{UpdateProgress, UpdateReassembly, UpdateResponseStream};
///
/// let host = SecretKey::generate();
/// let stream = UpdateResponseStream::new(7, &host.host_public_key(), &[0x55; 3000]).unwrap();
///
/// let mut rx = UpdateReassembly::new(7, host);
/// let mut result = None;
/// for body in stream {
///     if let UpdateProgress::Complete(data) = rx.accept(&body).unwrap() {
///         result = Some(data);
///     }
/// }
/// assert_eq!(result.unwrap(), vec![0x55; 3000]);
/// ```
#[derive(Debug)]
pub struct UpdateResponseStream {
    req_id: u64,
    e_key: PublicKey,
    sealed: Bytes,
    offset: usize,
    header_sent: bool,
}

impl UpdateResponseStream {
    /// Seals `data` to `peer_host_key` for request `req_id`.
    ///
    /// # Errors
    /// - `MessageTooLarge` if `data` exceeds the container limit
    /// - `KeyDerivation` / `Encryption` from the sealing step
    pub fn new(req_id: u64, peer_host_key: &PublicKey, data: &[u8]) -> Result<Self> {
        if data.len() > MAX_CONTAINER_SIZE {
            return Err(CoreError::MessageTooLarge {
                max: MAX_CONTAINER_SIZE,
                actual: data.len(),
            });
        }

        let ephemeral = EphemeralKeyPair::generate();
        let e_key = ephemeral.public_key();
        let shared = ephemeral.exchange(peer_host_key);
        let key = derive_session_key(&shared, peer_host_key.as_bytes(), e_key.as_bytes())?;
        let sealed = seal_update(&key, req_id, data)?;

        debug!(req_id, data_len = sealed.len(), "prepared update response");
        Ok(Self {
            req_id,
            e_key,
            sealed: Bytes::from(sealed),
            offset: 0,
            header_sent: false,
        })
    }

    /// A single empty response: the requester is already current.
    #[must_use]
    pub fn unchanged(req_id: u64) -> Self {
        Self {
            req_id,
            e_key: PublicKey::EMPTY,
            sealed: Bytes::new(),
            offset: 0,
            header_sent: false,
        }
    }

    /// Ciphertext length announced in the header.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.sealed.len()
    }
}

impl Iterator for UpdateResponseStream {
    type Item = PexBody;

    fn next(&mut self) -> Option<PexBody> {
        if !self.header_sent {
            self.header_sent = true;
            return Some(PexBody::UpdateResponse(UpdateResponse {
                req_id: self.req_id,
                data_len: u32::try_from(self.sealed.len()).ok()?,
                e_key: self.e_key,
            }));
        }

        if self.offset >= self.sealed.len() {
            return None;
        }
        let end = (self.offset + UPDATE_CHUNK_SIZE).min(self.sealed.len());
        let body = PexBody::UpdateResponseData(UpdateResponseData {
            req_id: self.req_id,
            offset: u32::try_from(self.offset).ok()?,
            chunk: self.sealed.slice(self.offset..end),
        });
        self.offset = end;
        Some(body)
    }
}

/// A no-data answer carrying the responder's version.
#[must_use]
pub const fn no_data(req_id: u64, cur_version: Timestamp) -> PexBody {
    PexBody::UpdateResponseNoData(UpdateResponseNoData { req_id, cur_version })
}

// ============================================
// UpdateReassembly
// ============================================

/// What a response body did to the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateProgress {
    /// More bodies needed (or the body was not for us).
    Pending,
    /// The responder says we are current.
    Unchanged,
    /// The responder has nothing newer; its version is attached.
    NoData {
        /// Responder's version
        peer_version: Timestamp,
    },
    /// All chunks arrived and decrypted.
    Complete(Vec<u8>),
}

struct Transfer {
    e_key: PublicKey,
    buffer: Vec<u8>,
    received: Vec<bool>,
    remaining: usize,
}

/// Collects one update transfer addressed to `local_secret`'s host key.
pub struct UpdateReassembly {
    req_id: u64,
    local_secret: SecretKey,
    transfer: Option<Transfer>,
    finished: bool,
}

impl std::fmt::Debug for UpdateReassembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateReassembly")
            .field("req_id", &self.req_id)
            .field("started", &self.transfer.is_some())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl UpdateReassembly {
    /// Starts waiting for responses to `req_id`.
    #[must_use]
    pub const fn new(req_id: u64, local_secret: SecretKey) -> Self {
        Self {
            req_id,
            local_secret,
            transfer: None,
            finished: false,
        }
    }

    /// Request id this reassembly belongs to.
    #[must_use]
    pub const fn req_id(&self) -> u64 {
        self.req_id
    }

    /// Feeds one received body.
    ///
    /// # Errors
    /// - `MessageTooLarge` for an announced length above the limit
    /// - `MalformedMessage` for a misaligned, overlong or wrongly sized chunk
    /// - `Decryption` if the completed ciphertext does not open
    pub fn accept(&mut self, body: &PexBody) -> Result<UpdateProgress> {
        if self.finished || body.req_id() != self.req_id {
            return Ok(UpdateProgress::Pending);
        }

        match body {
            PexBody::UpdateRequest(_) => Ok(UpdateProgress::Pending),
            PexBody::UpdateResponseNoData(b) => {
                self.finished = true;
                Ok(UpdateProgress::NoData {
                    peer_version: b.cur_version,
                })
            }
            PexBody::UpdateResponse(b) => self.start(b),
            PexBody::UpdateResponseData(b) => self.chunk(b),
        }
    }

    fn start(&mut self, response: &UpdateResponse) -> Result<UpdateProgress> {
        if self.transfer.is_some() {
            trace!(req_id = self.req_id, "duplicate update response ignored");
            return Ok(UpdateProgress::Pending);
        }

        let data_len = response.data_len as usize;
        if data_len == 0 {
            self.finished = true;
            return Ok(UpdateProgress::Unchanged);
        }
        if data_len > MAX_UPDATE_DATA_LEN {
            return Err(CoreError::MessageTooLarge {
                max: MAX_UPDATE_DATA_LEN,
                actual: data_len,
            });
        }
        if data_len <= ENCRYPTION_OVERHEAD {
            return Err(CoreError::malformed("update shorter than its tag"));
        }

        let chunks = data_len.div_ceil(UPDATE_CHUNK_SIZE);
        self.transfer = Some(Transfer {
            e_key: response.e_key,
            buffer: vec![0u8; data_len],
            received: vec![false; chunks],
            remaining: chunks,
        });
        debug!(req_id = self.req_id, data_len, chunks, "receiving update");
        Ok(UpdateProgress::Pending)
    }

    fn chunk(&mut self, data: &UpdateResponseData) -> Result<UpdateProgress> {
        let Some(transfer) = self.transfer.as_mut() else {
            trace!(req_id = self.req_id, "data before update response dropped");
            return Ok(UpdateProgress::Pending);
        };

        let offset = data.offset as usize;
        if offset % UPDATE_CHUNK_SIZE != 0 {
            return Err(CoreError::malformed("misaligned update chunk"));
        }
        let total = transfer.buffer.len();
        if offset >= total {
            return Err(CoreError::malformed("update chunk beyond announced length"));
        }
        let expected = UPDATE_CHUNK_SIZE.min(total - offset);
        if data.chunk.len() != expected {
            return Err(CoreError::malformed("update chunk has wrong size"));
        }

        let index = offset / UPDATE_CHUNK_SIZE;
        if transfer.received[index] {
            return Ok(UpdateProgress::Pending);
        }
        transfer.buffer[offset..offset + expected].copy_from_slice(&data.chunk);
        transfer.received[index] = true;
        transfer.remaining -= 1;
        if transfer.remaining > 0 {
            return Ok(UpdateProgress::Pending);
        }

        self.finished = true;
        let host_public = self.local_secret.host_public_key();
        let shared = self.local_secret.diffie_hellman(&transfer.e_key);
        let key = derive_session_key(&shared, host_public.as_bytes(), transfer.e_key.as_bytes())?;
        let plaintext = open_update(&key, self.req_id, &transfer.buffer)?;
        debug!(req_id = self.req_id, len = plaintext.len(), "update complete");
        Ok(UpdateProgress::Complete(plaintext))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(stream: UpdateResponseStream, rx: &mut UpdateReassembly) -> Result<Vec<UpdateProgress>> {
        stream.map(|body| rx.accept(&body)).collect()
    }

    #[test]
    fn test_multi_chunk_transfer() {
        let host = SecretKey::generate();
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let stream = UpdateResponseStream::new(3, &host.host_public_key(), &data).unwrap();
        assert_eq!(stream.data_len(), 5000 + ENCRYPTION_OVERHEAD);

        let bodies: Vec<PexBody> = stream.collect();
        assert_eq!(bodies.len(), 1 + (5000 + ENCRYPTION_OVERHEAD).div_ceil(UPDATE_CHUNK_SIZE));

        let mut rx = UpdateReassembly::new(3, host);
        let mut progress = Vec::new();
        for body in &bodies {
            progress.push(rx.accept(body).unwrap());
        }
        assert_eq!(progress.last(), Some(&UpdateProgress::Complete(data)));
        assert!(progress[..progress.len() - 1]
            .iter()
            .all(|p| *p == UpdateProgress::Pending));
    }

    #[test]
    fn test_out_of_order_chunks() {
        let host = SecretKey::generate();
        let data = vec![9u8; 3000];
        let mut bodies: Vec<PexBody> =
            UpdateResponseStream::new(4, &host.host_public_key(), &data).unwrap().collect();
        let header = bodies.remove(0);
        bodies.reverse();

        let mut rx = UpdateReassembly::new(4, host);
        assert_eq!(rx.accept(&header).unwrap(), UpdateProgress::Pending);
        let last = bodies.iter().map(|b| rx.accept(b).unwrap()).last();
        assert_eq!(last, Some(UpdateProgress::Complete(data)));
    }

    #[test]
    fn test_unchanged() {
        let mut rx = UpdateReassembly::new(5, SecretKey::generate());
        let progress = run(UpdateResponseStream::unchanged(5), &mut rx).unwrap();
        assert_eq!(progress, vec![UpdateProgress::Unchanged]);
    }

    #[test]
    fn test_no_data() {
        let mut rx = UpdateReassembly::new(6, SecretKey::generate());
        let progress = rx.accept(&no_data(6, Timestamp::from_secs(42))).unwrap();
        assert_eq!(
            progress,
            UpdateProgress::NoData {
                peer_version: Timestamp::from_secs(42)
            }
        );
    }

    #[test]
    fn test_other_request_ignored() {
        let host = SecretKey::generate();
        let stream = UpdateResponseStream::new(1, &host.host_public_key(), b"abc").unwrap();
        let mut rx = UpdateReassembly::new(2, host);
        let progress = run(stream, &mut rx).unwrap();
        assert!(progress.iter().all(|p| *p == UpdateProgress::Pending));
    }

    #[test]
    fn test_wrong_recipient_fails_decryption() {
        let intended = SecretKey::generate();
        let stream = UpdateResponseStream::new(1, &intended.host_public_key(), b"abc").unwrap();
        let mut rx = UpdateReassembly::new(1, SecretKey::generate());
        assert!(matches!(run(stream, &mut rx), Err(CoreError::Decryption)));
    }

    #[test]
    fn test_oversized_announcement() {
        let mut rx = UpdateReassembly::new(1, SecretKey::generate());
        let body = PexBody::UpdateResponse(UpdateResponse {
            req_id: 1,
            data_len: u32::try_from(MAX_UPDATE_DATA_LEN + 1).unwrap(),
            e_key: PublicKey::from_bytes([1; 32]),
        });
        assert!(matches!(rx.accept(&body), Err(CoreError::MessageTooLarge { .. })));
    }

    #[test]
    fn test_misaligned_chunk() {
        let mut rx = UpdateReassembly::new(1, SecretKey::generate());
        rx.accept(&PexBody::UpdateResponse(UpdateResponse {
            req_id: 1,
            data_len: 2000,
            e_key: PublicKey::from_bytes([1; 32]),
        }))
        .unwrap();
        let body = PexBody::UpdateResponseData(UpdateResponseData {
            req_id: 1,
            offset: 10,
            chunk: Bytes::from(vec![0u8; 100]),
        });
        assert!(matches!(rx.accept(&body), Err(CoreError::MalformedMessage { .. })));
    }

    #[test]
    fn test_data_before_response_dropped() {
        let mut rx = UpdateReassembly::new(1, SecretKey::generate());
        let body = PexBody::UpdateResponseData(UpdateResponseData {
            req_id: 1,
            offset: 0,
            chunk: Bytes::from_static(b"x"),
        });
        assert_eq!(rx.accept(&body).unwrap(), UpdateProgress::Pending);
    }

    #[test]
    fn test_rejects_oversized_container() {
        let host = SecretKey::generate().host_public_key();
        assert!(matches!(
            UpdateResponseStream::new(1, &host, &vec![0u8; MAX_CONTAINER_SIZE + 1]),
            Err(CoreError::MessageTooLarge { .. })
        ));
    }
}
