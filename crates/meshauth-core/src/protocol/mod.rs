// ============================================
// File: crates/meshauth-core/src/protocol/mod.rs
// ============================================
//! # PEX Protocol Module
//!
//! ## Creation Reason
//! Defines the peer exchange (PEX) used to pull or push signed network
//! data between two nodes over UDP.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: header and body structures
//! - [`codec`]: binary encoding and decoding
//! - [`envelope`]: sender id folding and network authentication
//! - [`update`]: chunked, encrypted transfer of a container
//! - [`version`]: protocol version
//!
//! ## Protocol Overview
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Requester ── UpdateRequest(cur_version, e_key) ─────► Peer   │
//! │                                                              │
//! │ peer newer:   ◄── UpdateResponse(data_len, eph) ──           │
//! │               ◄── UpdateResponseData × n ──                  │
//! │ equal:        ◄── UpdateResponse(data_len = 0) ──            │
//! │ peer older:   ◄── UpdateResponseNoData(peer_version) ──      │
//! │               ◄── UpdateRequest (peer asks us back) ──       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ANY wire change requires a version bump
//! - Undecodable datagrams are dropped, never answered
//!
//! ## Last Modified
//! v0.1.0 - Initial PEX protocol

pub mod codec;
pub mod envelope;
pub mod messages;
pub mod update;
pub mod version;

pub use codec::{decode_message, encode_message, Codec, PexCodec};
pub use envelope::PexEnvelope;
pub use messages::{
    Opcode, PexBody, PexMessage, UpdateRequest, UpdateResponse, UpdateResponseData,
    UpdateResponseNoData, PEX_HEADERS_SIZE, PEX_MAX_DATAGRAM, UPDATE_CHUNK_SIZE,
};
pub use update::{no_data, UpdateProgress, UpdateReassembly, UpdateResponseStream};
pub use version::PEX_PROTOCOL_VERSION;
