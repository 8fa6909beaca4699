// ============================================
// File: crates/meshauth-transport/src/error.rs
// ============================================
//! # Transport Errors
//!
//! Socket setup, endpoint parsing and datagram I/O failures.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Only `ReceiveFailed` is transient: an ICMP port-unreachable from an
//!   earlier send surfaces as a receive error on some platforms, and the
//!   PEX loops keep waiting past it
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Binding the socket failed.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Requested local address
        addr: SocketAddr,
        /// OS error text
        reason: String,
    },

    /// The local port is taken.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// Requested local address
        addr: SocketAddr,
    },

    /// `host[:port]` text did not parse or resolve.
    #[error("Invalid hostname/port {addr}")]
    InvalidAddress {
        /// Endpoint as given
        addr: String,
    },

    /// A datagram could not be sent.
    #[error("Failed to send to {dest}: {reason}")]
    SendFailed {
        /// Peer address
        dest: SocketAddr,
        /// OS error text
        reason: String,
    },

    /// Receiving failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// OS error text
        reason: String,
    },

    /// The transport was shut down.
    #[error("Transport is shutting down")]
    ShuttingDown,

    /// Socket option or runtime registration failed.
    #[error("Socket setup failed while {context}")]
    Io {
        /// Step that failed
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidAddress` error.
    pub fn invalid_address(addr: impl Into<String>) -> Self {
        Self::InvalidAddress { addr: addr.into() }
    }

    /// Creates an `Io` error for a setup step.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for failures a receive loop can skip past.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ReceiveFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_failure_names_address() {
        let err = TransportError::bind_failed("127.0.0.1:51819".parse().unwrap(), "permission denied");
        let text = err.to_string();
        assert!(text.contains("127.0.0.1:51819"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn test_invalid_address_message() {
        let err = TransportError::invalid_address("nowhere:99999");
        assert_eq!(err.to_string(), "Invalid hostname/port nowhere:99999");
    }

    #[test]
    fn test_only_receive_failures_are_transient() {
        let recv = TransportError::ReceiveFailed {
            reason: "connection refused".into(),
        };
        assert!(recv.is_transient());

        let send = TransportError::SendFailed {
            dest: "127.0.0.1:51819".parse().unwrap(),
            reason: "unreachable".into(),
        };
        assert!(!send.is_transient());
        assert!(!TransportError::ShuttingDown.is_transient());
    }
}
