// ============================================
// File: crates/meshauth-tool/src/services/pex_server.rs
// ============================================
//! # PEX Responder
//!
//! ## Creation Reason
//! The serving side of the exchange: holds one signed network data
//! container, hands it to hosts that ask for it, and takes newer data
//! from peers that offer it.
//!
//! ## Request Policy
//! ```text
//! UpdateRequest(cur_version) from host H
//!   H unlisted or e_key != H.key ──► dropped, no answer
//!   cur_version <  ours ──► full data stream
//!   cur_version == ours ──► unchanged
//!   cur_version >  ours ──► NoData(ours)
//!                           UpdateRequest(ours) back to H ──► pending fetch
//!
//! pending fetch completes ──► validate against network key
//!                             strictly newer and has hosts? ──► replace, write -o
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - At most one fetch is pending; a new one replaces it
//! - A pending fetch expires after the sync timeout
//! - Handler errors are logged and the loop keeps serving
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use meshauth_common::PexId;
use meshauth_core::crypto::SecretKey;
use meshauth_core::protocol::{
    no_data, PexBody, UpdateProgress, UpdateReassembly, UpdateRequest, UpdateResponseStream,
};
use meshauth_core::NetworkData;
use meshauth_transport::{resolve_endpoint, Transport, UdpTransport};

use crate::config::SyncConfig;
use crate::error::{Result, ToolError};
use crate::handlers::{authorize_request, InboundMessage, PexHandler};

/// Fetch of newer data from a peer that offered it.
struct PendingFetch {
    reassembly: UpdateReassembly,
    peer: SocketAddr,
    expires: Instant,
}

enum Event {
    Shutdown,
    FetchExpired,
    Datagram(meshauth_transport::Result<(usize, SocketAddr)>),
}

/// Serves network data over PEX until shut down.
pub struct PexServer<T> {
    transport: T,
    handler: PexHandler,
    host_secret: SecretKey,
    data: NetworkData,
    timeout: Duration,
    max_datagram: usize,
    output: Option<PathBuf>,
    pending: Option<PendingFetch>,
}

impl PexServer<UdpTransport> {
    /// Binds `addr` (`host[:port]`, default port from `config`).
    ///
    /// # Errors
    /// `Transport` if the address is invalid or binding fails.
    pub async fn bind(
        addr: &str,
        host_secret: SecretKey,
        data: NetworkData,
        config: &SyncConfig,
    ) -> Result<Self> {
        let local = resolve_endpoint(addr, config.default_port).await?;
        let transport = UdpTransport::bind_addr(local).await?;
        Ok(Self::new(transport, host_secret, data, config))
    }
}

impl<T: Transport> PexServer<T> {
    /// Creates a server over an existing transport.
    pub fn new(transport: T, host_secret: SecretKey, data: NetworkData, config: &SyncConfig) -> Self {
        let handler = PexHandler::new(*data.network_key(), host_secret.host_public_key());
        Self {
            transport,
            handler,
            host_secret,
            data,
            timeout: config.timeout(),
            max_datagram: config.max_datagram,
            output: None,
            pending: None,
        }
    }

    /// Writes every accepted upload to `path`.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Local bound address.
    ///
    /// # Errors
    /// `Transport` if the address cannot be determined.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.transport.local_addr()?)
    }

    /// Network data currently served.
    #[must_use]
    pub const fn data(&self) -> &NetworkData {
        &self.data
    }

    /// Serves until `shutdown` resolves and returns the data held then.
    ///
    /// # Errors
    /// `Transport` on a non-transient receive failure.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<NetworkData>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; self.max_datagram];

        info!(
            local_addr = %self.transport.local_addr()?,
            version = %self.data.version(),
            hosts = self.data.hosts().len(),
            "PEX server started"
        );

        loop {
            let expires = self.pending.as_ref().map(|fetch| fetch.expires);
            let event = tokio::select! {
                () = &mut shutdown => Event::Shutdown,
                () = sleep_until(expires.unwrap_or_else(Instant::now)), if expires.is_some() => {
                    Event::FetchExpired
                }
                received = self.transport.recv(&mut buf) => Event::Datagram(received),
            };

            match event {
                Event::Shutdown => break,
                Event::FetchExpired => {
                    if let Some(fetch) = self.pending.take() {
                        warn!(peer = %fetch.peer, "peer did not deliver its network data in time");
                    }
                }
                Event::Datagram(Ok((len, source))) => {
                    let Some(inbound) = self.handler.accept(&buf[..len], source) else {
                        continue;
                    };
                    if let Err(e) = self.handle(inbound).await {
                        warn!(peer = %source, error = %e, "failed to handle PEX message");
                    }
                }
                Event::Datagram(Err(e)) if e.is_transient() => {
                    debug!(error = %e, "receive failed");
                }
                Event::Datagram(Err(e)) => return Err(e.into()),
            }
        }

        if let Err(e) = self.transport.shutdown().await {
            warn!(error = %e, "transport shutdown error");
        }
        info!(version = %self.data.version(), "PEX server stopped");
        Ok(self.data)
    }

    async fn handle(&mut self, inbound: InboundMessage) -> Result<()> {
        match inbound.body {
            PexBody::UpdateRequest(request) => {
                self.handle_request(inbound.sender, &request, inbound.source)
                    .await
            }
            body => self.handle_response(&body, inbound.source).await,
        }
    }

    async fn handle_request(
        &mut self,
        sender: PexId,
        request: &UpdateRequest,
        source: SocketAddr,
    ) -> Result<()> {
        let Some(host) = authorize_request(self.data.hosts(), &sender, request, source) else {
            return Ok(());
        };
        let host = host.name.clone();

        let local = self.data.version();
        if request.cur_version > local {
            let datagram = self.handler.encode(no_data(request.req_id, local))?;
            self.transport.send(&datagram, &source).await?;
            debug!(peer = %source, %host, "peer is ahead of us");
            return self.start_fetch(source).await;
        }

        let stream = if request.cur_version == local {
            UpdateResponseStream::unchanged(request.req_id)
        } else {
            UpdateResponseStream::new(request.req_id, &request.e_key, self.data.as_bytes())?
        };
        let sent = self
            .handler
            .responder()
            .send_all(&self.transport, stream, source)
            .await?;
        info!(peer = %source, %host, datagrams = sent, "answered update request");
        Ok(())
    }

    async fn start_fetch(&mut self, peer: SocketAddr) -> Result<()> {
        let req_id = rand::random::<u64>();
        let datagram = self.handler.encode(PexBody::UpdateRequest(UpdateRequest {
            req_id,
            cur_version: self.data.version(),
            e_key: self.host_secret.host_public_key(),
        }))?;
        self.transport.send(&datagram, &peer).await?;

        if let Some(previous) = self.pending.take() {
            debug!(peer = %previous.peer, "replacing pending fetch");
        }
        self.pending = Some(PendingFetch {
            reassembly: UpdateReassembly::new(req_id, self.host_secret.clone()),
            peer,
            expires: Instant::now() + self.timeout,
        });
        info!(%peer, "peer has newer network data, requesting it");
        Ok(())
    }

    async fn handle_response(&mut self, body: &PexBody, source: SocketAddr) -> Result<()> {
        let Some(fetch) = self.pending.as_mut() else {
            return Ok(());
        };
        if fetch.peer != source {
            debug!(%source, "response from a peer we are not fetching from");
            return Ok(());
        }

        let progress = fetch.reassembly.accept(body);
        match progress {
            Ok(UpdateProgress::Pending) => Ok(()),
            Ok(UpdateProgress::Unchanged | UpdateProgress::NoData { .. }) => {
                self.pending = None;
                debug!(%source, "peer had nothing newer after all");
                Ok(())
            }
            Ok(UpdateProgress::Complete(bytes)) => {
                self.pending = None;
                self.install(bytes).await
            }
            Err(e) => {
                self.pending = None;
                Err(e.into())
            }
        }
    }

    async fn install(&mut self, bytes: Vec<u8>) -> Result<()> {
        let data = NetworkData::from_bytes(bytes, Some(self.data.network_key()))?;
        if !data.version().is_newer_than(self.data.version()) {
            warn!(
                offered = %data.version(),
                current = %self.data.version(),
                "ignoring uploaded network data that is not newer"
            );
            return Ok(());
        }

        if let Some(path) = &self.output {
            tokio::fs::write(path, data.as_bytes()).await.map_err(|e| {
                ToolError::io(format!("Failed to write {}", path.display()), e)
            })?;
        }
        info!(
            version = %data.version(),
            hosts = data.hosts().len(),
            "accepted uploaded network data"
        );
        self.data = data;
        Ok(())
    }
}

impl<T> std::fmt::Debug for PexServer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PexServer")
            .field("version", &self.data.version())
            .field("output", &self.output)
            .field("pending", &self.pending.as_ref().map(|fetch| fetch.peer))
            .finish_non_exhaustive()
    }
}
