// ============================================
// File: crates/meshauth-tool/src/services/pex_client.rs
// ============================================
//! # PEX Requester
//!
//! ## Creation Reason
//! Runs one download or upload exchange against a single peer and
//! reports how it ended.
//!
//! ## Main Logical Flow
//! ```text
//! download:                              upload:
//!   UpdateRequest(local version) ──►       UpdateRequest(our version) ──►
//!   ◄── NoData / unchanged: UpToDate       ◄── response/data: PeerHasNewer
//!   ◄── response + data chunks             ◄── NoData: keep waiting
//!       reassemble, validate:              ◄── peer's UpdateRequest
//!       Downloaded                             authorize, stream data:
//!                                              Uploaded
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The deadline is fixed when the request is sent. Dropped datagrams
//!   do not extend it
//! - Downloaded data is validated against the network key before it is
//!   returned
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use meshauth_common::Timestamp;
use meshauth_core::auth::validate;
use meshauth_core::crypto::{PublicKey, SecretKey};
use meshauth_core::error::CoreError;
use meshauth_core::protocol::{
    PexBody, UpdateProgress, UpdateReassembly, UpdateRequest, UpdateResponseStream,
};
use meshauth_core::NetworkData;
use meshauth_transport::{resolve_endpoint, Transport, UdpTransport};

use crate::config::SyncConfig;
use crate::error::{Result, ToolError};
use crate::handlers::{authorize_request, InboundMessage, PexHandler};

/// How a sync exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Newer network data was downloaded and validated.
    Downloaded(Vec<u8>),
    /// The peer has nothing newer than we do.
    UpToDate,
    /// The peer already has data at least as new as ours.
    PeerHasNewer,
    /// The peer fetched our data.
    Uploaded,
}

impl SyncOutcome {
    /// Returns `true` if network data changed hands.
    #[must_use]
    pub const fn transferred(&self) -> bool {
        matches!(self, Self::Downloaded(_) | Self::Uploaded)
    }
}

/// One-shot PEX requester bound to a single peer.
#[derive(Debug)]
pub struct PexClient<T> {
    transport: T,
    peer: SocketAddr,
    timeout: Duration,
    max_datagram: usize,
}

impl PexClient<UdpTransport> {
    /// Resolves `endpoint` and binds an ephemeral UDP socket for it.
    ///
    /// # Errors
    /// `Transport` if the endpoint is invalid or binding fails.
    pub async fn connect(endpoint: &str, config: &SyncConfig) -> Result<Self> {
        let peer = resolve_endpoint(endpoint, config.default_port).await?;
        let transport = UdpTransport::bind_for(&peer).await?;
        Ok(Self::new(transport, peer, config))
    }
}

impl<T: Transport> PexClient<T> {
    /// Creates a requester over an existing transport.
    pub fn new(transport: T, peer: SocketAddr, config: &SyncConfig) -> Self {
        Self {
            transport,
            peer,
            timeout: config.timeout(),
            max_datagram: config.max_datagram,
        }
    }

    /// Peer address.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Requests network data newer than `cur_version`.
    ///
    /// # Arguments
    /// * `network_key` - Signing key the data must validate against
    /// * `host_secret` - Our host key; data is encrypted to its public half
    /// * `cur_version` - Version we already have (zero for none)
    ///
    /// # Errors
    /// - `Timeout` if no answer completes before the deadline
    /// - `Core` if the transfer is malformed or the data fails validation
    /// - `Transport` if sending fails
    pub async fn download(
        &self,
        network_key: PublicKey,
        host_secret: &SecretKey,
        cur_version: Timestamp,
    ) -> Result<SyncOutcome> {
        let host_key = host_secret.host_public_key();
        let handler = PexHandler::new(network_key, host_key);
        let req_id = rand::random::<u64>();
        let deadline = self
            .send_request(&handler, req_id, cur_version, host_key)
            .await?;

        let mut reassembly = UpdateReassembly::new(req_id, host_secret.clone());
        let mut buf = vec![0u8; self.max_datagram];
        loop {
            let inbound = self.next_message(&handler, &mut buf, deadline).await?;
            if !inbound.body.opcode().is_response() {
                continue;
            }

            match reassembly.accept(&inbound.body)? {
                UpdateProgress::Pending => {}
                UpdateProgress::Unchanged | UpdateProgress::NoData { .. } => {
                    info!("No network data available");
                    return Ok(SyncOutcome::UpToDate);
                }
                UpdateProgress::Complete(data) => {
                    let version = validate(Some(&network_key), &data)
                        .map_err(CoreError::from)?
                        .version;
                    info!(%version, size = data.len(), peer = %self.peer, "downloaded network data");
                    return Ok(SyncOutcome::Downloaded(data));
                }
            }
        }
    }

    /// Offers `data` to the peer and serves it if the peer asks for it.
    ///
    /// # Arguments
    /// * `data` - Network data to upload
    /// * `host_secret` - Our host key, used as the request sender
    ///
    /// # Errors
    /// - `Timeout` if the exchange does not finish before the deadline
    /// - `Core` if the response stream cannot be built
    /// - `Transport` if sending fails
    pub async fn upload(&self, data: &NetworkData, host_secret: &SecretKey) -> Result<SyncOutcome> {
        let host_key = host_secret.host_public_key();
        let handler = PexHandler::new(*data.network_key(), host_key);
        let req_id = rand::random::<u64>();
        let deadline = self
            .send_request(&handler, req_id, data.version(), host_key)
            .await?;

        let mut buf = vec![0u8; self.max_datagram];
        loop {
            let inbound = self.next_message(&handler, &mut buf, deadline).await?;
            match &inbound.body {
                PexBody::UpdateRequest(request) => {
                    if authorize_request(data.hosts(), &inbound.sender, request, inbound.source)
                        .is_none()
                    {
                        continue;
                    }
                    let stream =
                        UpdateResponseStream::new(request.req_id, &request.e_key, data.as_bytes())?;
                    let sent = handler
                        .responder()
                        .send_all(&self.transport, stream, inbound.source)
                        .await?;
                    info!(peer = %inbound.source, datagrams = sent, "uploaded network data");
                    return Ok(SyncOutcome::Uploaded);
                }
                body if body.req_id() != req_id => {}
                PexBody::UpdateResponseNoData(no_data) => {
                    debug!(peer_version = %no_data.cur_version, "peer has older data, waiting for its request");
                }
                _ => {
                    info!("Server has newer network data");
                    return Ok(SyncOutcome::PeerHasNewer);
                }
            }
        }
    }

    async fn send_request(
        &self,
        handler: &PexHandler,
        req_id: u64,
        cur_version: Timestamp,
        e_key: PublicKey,
    ) -> Result<Instant> {
        let datagram = handler.encode(PexBody::UpdateRequest(UpdateRequest {
            req_id,
            cur_version,
            e_key,
        }))?;
        self.transport.send(&datagram, &self.peer).await?;
        debug!(peer = %self.peer, req_id, version = %cur_version, "sent update request");
        Ok(Instant::now() + self.timeout)
    }

    /// Waits for the next datagram that passes the handler.
    async fn next_message(
        &self,
        handler: &PexHandler,
        buf: &mut [u8],
        deadline: Instant,
    ) -> Result<InboundMessage> {
        loop {
            let received = timeout_at(deadline, self.transport.recv(buf))
                .await
                .map_err(|_| ToolError::Timeout {
                    waited: self.timeout,
                })?;
            let (len, source) = match received {
                Ok(received) => received,
                Err(e) if e.is_transient() => {
                    debug!(error = %e, "receive failed, still waiting");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(inbound) = handler.accept(&buf[..len], source) {
                return Ok(inbound);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(timeout_ms: u64) -> SyncConfig {
        SyncConfig {
            timeout_ms,
            ..SyncConfig::default()
        }
    }

    #[test]
    fn test_outcome_transferred() {
        assert!(SyncOutcome::Downloaded(vec![1]).transferred());
        assert!(SyncOutcome::Uploaded.transferred());
        assert!(!SyncOutcome::UpToDate.transferred());
        assert!(!SyncOutcome::PeerHasNewer.transferred());
    }

    #[tokio::test]
    async fn test_download_times_out() {
        let silent = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let client = PexClient::connect(&silent.local_addr().unwrap().to_string(), &config(100))
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let err = client
            .download(
                SecretKey::generate().signing_public_key(),
                &SecretKey::generate(),
                Timestamp::ZERO,
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_foreign_traffic_does_not_extend_deadline() {
        let peer = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let client = PexClient::connect(&peer.local_addr().unwrap().to_string(), &config(300))
            .await
            .unwrap();
        let client_addr = client.transport.local_addr().unwrap();

        let noise = tokio::spawn(async move {
            for _ in 0..20 {
                let _ = peer.send(b"not pex", &client_addr).await;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        });

        let started = std::time::Instant::now();
        let err = client
            .download(
                SecretKey::generate().signing_public_key(),
                &SecretKey::generate(),
                Timestamp::ZERO,
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_millis(700));
        noise.abort();
    }
}
