// ============================================
// File: crates/meshauth-transport/src/lib.rs
// ============================================
//! # meshauth Transport - Datagram I/O
//!
//! ## Creation Reason
//! Socket handling for the PEX services, kept apart from the protocol so
//! the services can be driven by any `Transport`.
//!
//! ## Main Functionality
//! - [`traits`]: the `Transport` trait
//! - [`udp`]: Tokio UDP implementation
//! - [`endpoint`]: `host[:port]` parsing and resolution
//! - [`error`]: transport error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               meshauth-tool                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   meshauth-core        meshauth-transport           │
//! │         │              You are here ◄──             │
//! │         ▼                                           │
//! │   meshauth-common                                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod error;
pub mod traits;
pub mod udp;

pub use endpoint::resolve_endpoint;
pub use error::{Result, TransportError};
pub use traits::Transport;
pub use udp::UdpTransport;
