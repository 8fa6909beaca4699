// ============================================
// File: crates/meshauth-transport/src/endpoint.rs
// ============================================
//! # Endpoint Resolution
//!
//! Turns `host[:port]` text into a socket address.
//!
//! | Input | Host | Port |
//! |-------|------|------|
//! | `node.example` | `node.example` | default |
//! | `10.0.0.1:4000` | `10.0.0.1` | 4000 |
//! | `[fd00::1]:4000` | `fd00::1` | 4000 |
//! | `[fd00::1]` | `fd00::1` | default |
//! | `fd00::1` | `fd00::1` | default |

use std::net::SocketAddr;

use tokio::net::lookup_host;
use tracing::debug;

use crate::error::{Result, TransportError};

/// Splits endpoint text into host and port.
///
/// # Errors
/// `InvalidAddress` for an empty host, an unclosed bracket or a bad port.
pub fn split_endpoint(text: &str, default_port: u16) -> Result<(&str, u16)> {
    let invalid = || TransportError::invalid_address(text);

    let (host, port) = if let Some(rest) = text.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        match tail {
            "" => (host, None),
            _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
        }
    } else {
        match text.rsplit_once(':') {
            // More than one colon without brackets: a bare IPv6 literal.
            Some((host, _)) if host.contains(':') => (text, None),
            Some((host, port)) => (host, Some(port)),
            None => (text, None),
        }
    };

    if host.is_empty() {
        return Err(invalid());
    }
    let port = match port {
        Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
        None => default_port,
    };
    Ok((host, port))
}

/// Resolves `host[:port]`, taking the first address returned.
///
/// # Errors
/// `InvalidAddress` if the text is malformed or the name does not resolve.
pub async fn resolve_endpoint(text: &str, default_port: u16) -> Result<SocketAddr> {
    let (host, port) = split_endpoint(text, default_port)?;
    let addr = lookup_host((host, port))
        .await
        .map_err(|_| TransportError::invalid_address(text))?
        .next()
        .ok_or_else(|| TransportError::invalid_address(text))?;
    debug!(endpoint = text, %addr, "resolved endpoint");
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_forms() {
        assert_eq!(split_endpoint("node", 51819).unwrap(), ("node", 51819));
        assert_eq!(split_endpoint("10.0.0.1:4000", 1).unwrap(), ("10.0.0.1", 4000));
        assert_eq!(split_endpoint("[fd00::1]:4000", 1).unwrap(), ("fd00::1", 4000));
        assert_eq!(split_endpoint("[fd00::1]", 7).unwrap(), ("fd00::1", 7));
        assert_eq!(split_endpoint("fd00::1", 7).unwrap(), ("fd00::1", 7));
    }

    #[test]
    fn test_split_rejects() {
        for text in ["", ":80", "[fd00::1", "[fd00::1]x", "host:port", "host:70000", "[]:1"] {
            assert!(split_endpoint(text, 1).is_err(), "{text}");
        }
    }

    #[tokio::test]
    async fn test_resolve_literals() {
        let v4 = resolve_endpoint("127.0.0.1", 51819).await.unwrap();
        assert_eq!(v4, "127.0.0.1:51819".parse().unwrap());

        let v6 = resolve_endpoint("[::1]:9", 51819).await.unwrap();
        assert_eq!(v6, "[::1]:9".parse().unwrap());
    }
}
