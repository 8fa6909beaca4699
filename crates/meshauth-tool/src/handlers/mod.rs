// ============================================
// File: crates/meshauth-tool/src/handlers/mod.rs
// ============================================
//! # Datagram Handlers
//!
//! ## Main Functionality
//! - [`pex`]: PEX decode/authenticate, sealing, and the rule for which
//!   peers may receive update data
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod pex;

pub use pex::{authorize_request, InboundMessage, PexHandler};
