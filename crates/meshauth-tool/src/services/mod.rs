// ============================================
// File: crates/meshauth-tool/src/services/mod.rs
// ============================================
//! # PEX Services
//!
//! ## Main Functionality
//! - [`pex_client`]: one download or upload exchange with a single peer
//! - [`pex_server`]: long-running responder for `-L`
//!
//! ```text
//! PexClient ──UpdateRequest──► PexServer
//!           ◄──response stream──
//!           ◄──UpdateRequest──   (server is older: it fetches the upload)
//!           ──response stream──►
//! ```
//!
//! Both sides share [`crate::handlers::pex`] for decoding and host-key
//! authorization.
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod pex_client;
pub mod pex_server;

pub use pex_client::{PexClient, SyncOutcome};
pub use pex_server::PexServer;
