// ============================================
// File: crates/meshauth-transport/src/udp.rs
// ============================================
//! # UDP Transport
//!
//! ## Creation Reason
//! PEX runs over plain UDP datagrams. `UdpTransport` is the only
//! [`Transport`] the tool ships.
//!
//! ## Main Functionality
//! - `UdpTransport::bind_addr`: fixed address, used by the `-L` responder
//! - `UdpTransport::bind_for`: ephemeral port matching a peer's family,
//!   used by the one-shot requester
//!
//! ```text
//! socket2::Socket ── reuse addr, dual-stack for [::] ──► tokio UdpSocket
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Closing only flips a flag. The socket itself is released on drop
//! - An IPv6 wildcard bind also accepts IPv4-mapped peers
//!
//! ## Last Modified
//! v0.1.0 - Initial UDP transport implementation

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Datagram transport on a single UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    closed: AtomicBool,
}

impl UdpTransport {
    /// Binds a literal socket address such as `127.0.0.1:0`.
    ///
    /// # Errors
    /// - `InvalidAddress` if `addr` is not a literal socket address
    /// - `BindFailed` / `AddressInUse` if binding fails
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self> {
        let text = addr.as_ref();
        let addr = text
            .parse::<SocketAddr>()
            .map_err(|_| TransportError::invalid_address(text))?;
        Self::bind_addr(addr).await
    }

    /// Binds an ephemeral port on the wildcard address of `peer`'s family.
    ///
    /// # Errors
    /// `BindFailed` if binding fails.
    pub async fn bind_for(peer: &SocketAddr) -> Result<Self> {
        let wildcard = match peer {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let transport = Self::bind_addr(wildcard).await?;
        debug!(%peer, local_addr = %transport.local_addr, "bound requester socket");
        Ok(transport)
    }

    /// Binds `addr`.
    ///
    /// # Errors
    /// - `AddressInUse` if the port is taken
    /// - `BindFailed` for other bind failures
    /// - `Io` if socket options cannot be set
    #[allow(clippy::unused_async)]
    pub async fn bind_addr(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::from_std(open_socket(addr)?.into())
            .map_err(|e| TransportError::io("registering socket with runtime", e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::io("reading bound address", e))?;

        info!(%local_addr, "UDP socket bound");
        Ok(Self {
            socket,
            local_addr,
            closed: AtomicBool::new(false),
        })
    }

    /// Whether [`Transport::shutdown`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(TransportError::ShuttingDown)
        } else {
            Ok(())
        }
    }
}

/// Creates a non-blocking socket bound to `addr`.
fn open_socket(addr: SocketAddr) -> Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| TransportError::io("opening UDP socket", e))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| TransportError::io("enabling address reuse", e))?;
    if let SocketAddr::V6(v6) = addr {
        if v6.ip().is_unspecified() {
            socket
                .set_only_v6(false)
                .map_err(|e| TransportError::io("enabling dual-stack", e))?;
        }
    }
    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::io("switching to non-blocking mode", e))?;

    socket.bind(&addr.into()).map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => TransportError::AddressInUse { addr },
        _ => TransportError::bind_failed(addr, e.to_string()),
    })?;
    Ok(socket)
}

#[async_trait]
impl Transport for UdpTransport {
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.ensure_open()?;
        let (len, from) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed {
                reason: e.to_string(),
            })?;
        trace!(len, %from, "datagram in");
        Ok((len, from))
    }

    async fn send(&self, buf: &[u8], dest: &SocketAddr) -> Result<usize> {
        self.ensure_open()?;
        let len = self
            .socket
            .send_to(buf, dest)
            .await
            .map_err(|e| TransportError::SendFailed {
                dest: *dest,
                reason: e.to_string(),
            })?;
        trace!(len, %dest, "datagram out");
        Ok(len)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(local_addr = %self.local_addr, "UDP socket closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("local_addr", &self.local_addr)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
