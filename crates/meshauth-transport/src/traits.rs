// ============================================
// File: crates/meshauth-transport/src/traits.rs
// ============================================
//! # Datagram Transport
//!
//! The seam between the PEX services and the socket. `PexClient` and
//! `PexServer` are generic over it so their loops never name UDP.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `recv` is awaited inside `select!`/`timeout_at`; it must be cancel
//!   safe (dropping the future loses no datagram already returned)
//! - The caller owns the receive buffer and sizes it from `max_datagram`
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::Result;

/// One socket that sends and receives whole datagrams.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Waits for the next datagram, copying it into `buf`.
    ///
    /// Returns its length and the peer it came from.
    ///
    /// # Errors
    /// `ReceiveFailed` or `ShuttingDown`.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    /// Sends `buf` as one datagram to `dest`.
    ///
    /// # Errors
    /// `SendFailed` or `ShuttingDown`.
    async fn send(&self, buf: &[u8], dest: &SocketAddr) -> Result<usize>;

    /// The bound address, with the port the OS picked.
    ///
    /// # Errors
    /// If the address cannot be determined.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Refuses further `recv`/`send` with `ShuttingDown`.
    ///
    /// # Errors
    /// If shutdown fails.
    async fn shutdown(&self) -> Result<()>;
}
