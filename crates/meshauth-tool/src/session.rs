// ============================================
// File: crates/meshauth-tool/src/session.rs
// ============================================
//! # Session Context
//!
//! ## Creation Reason
//! Everything one invocation knows about keys and network data, loaded
//! once from the flags and then handed by reference to the command.
//!
//! ## Load Order
//! ```text
//! -h peer key ─► -k public ─► -K secret ─► -b network data ─► -x pad ─► -s seed
//!                                                                          │
//!      secret present? ── yes ──► secret ^= pad ──► public = signing(secret)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A secret key always wins over `-k` and `-b` as the source of the
//!   signing public key
//! - The XOR pad is only applied to a loaded or derived secret; a key
//!   generated later by `-g`/`-G` is never combined
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use tracing::debug;

use meshauth_common::Timestamp;
use meshauth_core::crypto::{
    derive_from_seed, Host, PublicKey, PublicKeyMaterial, SecretKey, SecretKeyMaterial, Signing,
};
use meshauth_core::NetworkData;

use crate::cli::Cli;
use crate::error::{Result, ToolError};
use crate::keyfile::{parse_rounds, read_key, read_passphrase};

/// Key material and network data for one invocation.
#[derive(Debug, Default)]
pub struct Session {
    pq: bool,
    peer_secret: Option<SecretKey>,
    secret: Option<SecretKeyMaterial>,
    public: Option<PublicKeyMaterial>,
    network: Option<NetworkData>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(pq: bool) -> Self {
        Self {
            pq,
            ..Self::default()
        }
    }

    /// Loads every key source named on the command line.
    ///
    /// # Errors
    /// Any key file, seed, passphrase, network data or XOR failure.
    pub async fn from_cli(cli: &Cli) -> Result<Self> {
        let mut session = Self::new(cli.post_quantum);

        if let Some(source) = &cli.peer_key {
            let decoded = read_key(source).await?;
            session.peer_secret = Some(SecretKey::from_slice(decoded.key.as_bytes())?);
        }
        if let Some(source) = &cli.public_key {
            session.public = Some(PublicKeyMaterial::try_from(read_key(source).await?)?);
        }
        if let Some(source) = &cli.secret_key {
            session.secret = Some(SecretKeyMaterial::try_from(read_key(source).await?)?);
        }
        if let Some(path) = &cli.network_data {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                ToolError::io(format!("failed to read input file {}", path.display()), e)
            })?;
            session.network = Some(NetworkData::from_bytes(bytes, None)?);
        }
        let pad = match &cli.xor_key {
            Some(source) => Some(SecretKeyMaterial::try_from(read_key(source).await?)?),
            None => None,
        };
        if let Some(seed) = &cli.seed {
            let rounds = parse_rounds(seed)?;
            let passphrase = read_passphrase(cli.prompt)?;
            session.secret = Some(derive_from_seed(
                passphrase.as_bytes(),
                seed.as_bytes(),
                rounds,
                cli.post_quantum,
            )?);
        }

        session.finalize(pad.as_ref())?;
        Ok(session)
    }

    /// Applies the XOR pad to the secret and derives the signing key.
    ///
    /// # Errors
    /// `LengthMismatch` if the pad's post-quantum half does not fit.
    pub fn finalize(&mut self, pad: Option<&SecretKeyMaterial>) -> Result<()> {
        let Some(secret) = self.secret.take() else {
            return Ok(());
        };
        let secret = match pad {
            Some(pad) => {
                debug!("combining secret key with xor pad");
                secret.combine_xor(pad)?
            }
            None => secret,
        };
        self.public = Some(PublicKeyMaterial::classical(
            secret.secret.signing_public_key(),
        ));
        self.secret = Some(secret);
        Ok(())
    }

    // ========================================
    // Setters
    // ========================================

    /// Sets the secret key.
    pub fn set_secret(&mut self, secret: SecretKeyMaterial) {
        self.secret = Some(secret);
    }

    /// Sets the public key.
    pub fn set_public(&mut self, public: PublicKeyMaterial) {
        self.public = Some(public);
    }

    /// Sets the peer host secret used for PEX sync.
    pub fn set_peer_secret(&mut self, secret: SecretKey) {
        self.peer_secret = Some(secret);
    }

    /// Sets the loaded network data.
    pub fn set_network(&mut self, network: NetworkData) {
        self.network = Some(network);
    }

    // ========================================
    // Accessors
    // ========================================

    /// Whether post-quantum keys were requested.
    #[must_use]
    pub const fn pq(&self) -> bool {
        self.pq
    }

    /// Secret key material, if loaded or derived.
    #[must_use]
    pub const fn secret(&self) -> Option<&SecretKeyMaterial> {
        self.secret.as_ref()
    }

    /// Removes the secret key material from the session.
    pub fn take_secret(&mut self) -> Option<SecretKeyMaterial> {
        self.secret.take()
    }

    /// Peer host secret (`-h`).
    #[must_use]
    pub const fn peer_secret(&self) -> Option<&SecretKey> {
        self.peer_secret.as_ref()
    }

    /// Network data loaded with `-b`.
    #[must_use]
    pub const fn network(&self) -> Option<&NetworkData> {
        self.network.as_ref()
    }

    /// Removes the loaded network data from the session.
    pub fn take_network(&mut self) -> Option<NetworkData> {
        self.network.take()
    }

    /// Version of the loaded network data, or zero.
    #[must_use]
    pub fn network_version(&self) -> Timestamp {
        self.network.as_ref().map_or(Timestamp::ZERO, NetworkData::version)
    }

    /// Whether any signing public key is known.
    #[must_use]
    pub fn has_public_key(&self) -> bool {
        self.network_key().is_some()
    }

    /// Classical signing public key: derived, `-k`, or from `-b`.
    #[must_use]
    pub fn network_key(&self) -> Option<PublicKey> {
        self.public
            .as_ref()
            .map(|public| public.key)
            .or_else(|| self.network.as_ref().map(|data| *data.network_key()))
    }

    /// Signing public key with its post-quantum half resolved.
    ///
    /// # Errors
    /// - `InvalidArgument` if no public key source was given
    /// - `InvalidKeyLength` if the post-quantum half is missing or wrong
    pub fn signing_public(&self) -> Result<PublicKeyMaterial> {
        if let Some(secret) = &self.secret {
            return Ok(secret.public_key::<Signing>(self.pq)?);
        }
        let public = match (&self.public, &self.network) {
            (Some(public), _) => public.clone(),
            (None, Some(data)) => PublicKeyMaterial::classical(*data.network_key()),
            (None, None) => return Err(ToolError::invalid_argument("Missing -k <key> argument")),
        };
        Ok(public.checked::<Signing>(self.pq)?)
    }

    /// Host public key of the secret key.
    ///
    /// # Errors
    /// - `InvalidArgument` without a secret key
    /// - `InvalidKeyLength` if the post-quantum half is missing or wrong
    pub fn host_public(&self) -> Result<PublicKeyMaterial> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| ToolError::invalid_argument("Missing -K <key> argument"))?;
        Ok(secret.public_key::<Host>(self.pq)?)
    }
}
