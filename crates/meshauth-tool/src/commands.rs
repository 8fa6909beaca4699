// ============================================
// File: crates/meshauth-tool/src/commands.rs
// ============================================
//! # Command Dispatcher
//!
//! ## Creation Reason
//! Turns the parsed flags into exactly one operation: load the session,
//! check what the command needs, run it against the output sink.
//!
//! ## Main Logical Flow
//! ```text
//! Cli ──► Session::from_cli ──► prerequisites ──► OutputSink::open
//!                                                       │
//!                             ┌─────────────────────────┘
//!                             ▼
//!                        run command
//!                     Success │ Incomplete / Err
//!                        finish    discard (-o file removed)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A sync that ends without transferring data (peer up to date, peer
//!   newer) is `Incomplete`: nothing is written and the exit code is 1
//! - Key text is written with a trailing newline; `-T` payloads are not
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use meshauth_core::auth::{validate, AuthContainer, NetworkData};
use meshauth_core::crypto::{
    encode_key, Host, KeyRole, PublicKeyMaterial, SecretKey, SecretKeyMaterial, Signing,
};
use meshauth_core::error::CoreError;

use crate::cli::Cli;
use crate::config::ToolConfig;
use crate::error::{Result, ToolError};
use crate::output::OutputSink;
use crate::services::{PexClient, PexServer, SyncOutcome};
use crate::session::Session;

// ============================================
// Command
// ============================================

/// The single operation an invocation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `-S file`: sign a payload file.
    Sign {
        /// Payload file
        input: PathBuf,
    },
    /// `-V file`: verify a container file.
    Verify {
        /// Container file
        input: PathBuf,
    },
    /// `-P`: print the signing public key.
    Pubkey,
    /// `-H`: print the host public key of the secret key.
    HostPubkey,
    /// `-T`: print the payload of the `-b` container.
    ShowPayload,
    /// `-g`: generate a host key.
    GenerateHost,
    /// `-G`: generate a signing key.
    GenerateSigning,
    /// `-D host`: download network data.
    Download {
        /// `host[:port]`
        endpoint: String,
    },
    /// `-U host file`: upload a container file.
    Upload {
        /// `host[:port]`
        endpoint: String,
        /// Container file
        input: PathBuf,
    },
    /// `-L addr`: serve the `-b` container.
    Listen {
        /// `addr[:port]`
        bind: String,
    },
}

impl Command {
    /// Whether the command needs the `-h` peer key.
    #[must_use]
    pub const fn needs_peer_key(&self) -> bool {
        matches!(self, Self::Download { .. } | Self::Listen { .. })
    }

    /// Whether the command needs a secret key.
    #[must_use]
    pub const fn needs_secret_key(&self) -> bool {
        matches!(self, Self::Sign { .. } | Self::HostPubkey)
    }

    /// Whether the command needs a signing public key.
    #[must_use]
    pub const fn needs_public_key(&self) -> bool {
        matches!(self, Self::Pubkey | Self::Verify { .. } | Self::Download { .. })
    }

    /// Whether the command needs a `-b` container.
    #[must_use]
    pub const fn needs_network_data(&self) -> bool {
        matches!(self, Self::ShowPayload | Self::Listen { .. })
    }

    /// Whether the command writes to the output sink.
    #[must_use]
    pub const fn uses_output(&self) -> bool {
        !matches!(
            self,
            Self::Verify { .. } | Self::Upload { .. } | Self::Listen { .. }
        )
    }

    /// Checks the session holds what this command needs.
    ///
    /// # Errors
    /// `InvalidArgument` naming the missing flag.
    pub fn check(&self, session: &Session) -> Result<()> {
        if self.needs_peer_key() && session.peer_secret().is_none() {
            return Err(ToolError::invalid_argument("Missing -h <key> argument"));
        }
        if self.needs_secret_key() && session.secret().is_none() {
            return Err(ToolError::invalid_argument("Missing -K <key> argument"));
        }
        if self.needs_public_key() && !session.has_public_key() {
            return Err(ToolError::invalid_argument("Missing -k <key> argument"));
        }
        if self.needs_network_data() && session.network().is_none() {
            return Err(ToolError::invalid_argument("Missing network data"));
        }
        Ok(())
    }
}

/// How a command that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Completed; output kept.
    Success,
    /// Ran without error but did not produce its result.
    Incomplete,
}

impl CommandStatus {
    /// Process exit code for this status.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Incomplete => 1,
        }
    }
}

// ============================================
// Dispatch
// ============================================

/// Runs the command selected by `cli`.
///
/// # Errors
/// Any failure of the command; the `-o` file is removed first.
pub async fn run(cli: &Cli, config: &ToolConfig) -> Result<CommandStatus> {
    let command = cli
        .command()
        .ok_or_else(|| ToolError::invalid_argument("No command given"))?;
    let mut session = Session::from_cli(cli).await?;
    command.check(&session)?;
    debug!(?command, "running command");

    let mut output = if command.uses_output() {
        OutputSink::open(cli.output.as_deref()).await?
    } else {
        OutputSink::stdout()
    };

    match execute(&command, &mut session, cli, config, &mut output).await {
        Ok(CommandStatus::Success) => {
            output.finish().await?;
            Ok(CommandStatus::Success)
        }
        Ok(CommandStatus::Incomplete) => {
            output.discard().await;
            Ok(CommandStatus::Incomplete)
        }
        Err(e) => {
            output.discard().await;
            Err(e)
        }
    }
}

async fn execute(
    command: &Command,
    session: &mut Session,
    cli: &Cli,
    config: &ToolConfig,
    output: &mut OutputSink,
) -> Result<CommandStatus> {
    match command {
        Command::Sign { input } => cmd_sign(session, input, output).await,
        Command::Verify { input } => cmd_verify(session, input).await,
        Command::Pubkey => {
            let public = session.signing_public()?;
            write_key(output, &public).await
        }
        Command::HostPubkey => {
            let public = session.host_public()?;
            write_key(output, &public).await
        }
        Command::ShowPayload => cmd_show_payload(session, output).await,
        Command::GenerateHost => cmd_generate::<Host>(session, output).await,
        Command::GenerateSigning => cmd_generate::<Signing>(session, output).await,
        Command::Download { endpoint } => cmd_download(session, endpoint, config, output).await,
        Command::Upload { endpoint, input } => cmd_upload(session, endpoint, input, config).await,
        Command::Listen { bind } => cmd_listen(session, bind, cli.output.as_deref(), config).await,
    }
}

// ============================================
// Commands
// ============================================

/// Signs the payload file with the secret key.
async fn cmd_sign(session: &Session, input: &Path, output: &mut OutputSink) -> Result<CommandStatus> {
    let secret = session
        .secret()
        .ok_or_else(|| ToolError::invalid_argument("Missing -K <key> argument"))?;
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| ToolError::io("Input file not found", e))?;
    let payload = String::from_utf8(bytes).map_err(|_| {
        ToolError::invalid_argument(format!("{} is not valid UTF-8", input.display()))
    })?;

    let container = AuthContainer::sign_now(&payload, &secret.secret)?;
    output.write_all(container.as_bytes()).await?;
    info!(input = %input.display(), size = container.as_bytes().len(), "signed network data");
    Ok(CommandStatus::Success)
}

/// Checks a container file against the signing public key.
async fn cmd_verify(session: &Session, input: &Path) -> Result<CommandStatus> {
    let key = session
        .network_key()
        .ok_or_else(|| ToolError::invalid_argument("Missing -k <key> argument"))?;
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| ToolError::io(format!("Failed to read input file {}", input.display()), e))?;

    let checked = validate(Some(&key), &bytes).map_err(CoreError::from)?;
    info!(version = %checked.version, "network data is valid");
    Ok(CommandStatus::Success)
}

async fn cmd_show_payload(session: &Session, output: &mut OutputSink) -> Result<CommandStatus> {
    let data = session
        .network()
        .ok_or_else(|| ToolError::invalid_argument("Missing network data"))?;
    output.write_all(data.payload().as_bytes()).await?;
    Ok(CommandStatus::Success)
}

/// Prints the secret key, generating it unless one was loaded.
async fn cmd_generate<R: KeyRole>(
    session: &mut Session,
    output: &mut OutputSink,
) -> Result<CommandStatus> {
    let pq = session.pq();
    let secret = SecretKeyMaterial::ensure_generated::<R>(session.take_secret(), pq)?;
    let pq_part = if pq { secret.pq.as_ref() } else { None };
    let text = encode_key(secret.secret.as_bytes(), pq_part.map(|buf| buf.as_bytes()));
    output.write_all(format!("{text}\n").as_bytes()).await?;
    Ok(CommandStatus::Success)
}

async fn cmd_download(
    session: &Session,
    endpoint: &str,
    config: &ToolConfig,
    output: &mut OutputSink,
) -> Result<CommandStatus> {
    let (Some(host_secret), Some(network_key)) = (session.peer_secret(), session.network_key()) else {
        return Err(ToolError::invalid_argument("Missing -h <key> argument"));
    };

    let client = PexClient::connect(endpoint, &config.sync).await?;
    let outcome = client
        .download(network_key, host_secret, session.network_version())
        .await?;

    match outcome {
        SyncOutcome::Downloaded(bytes) => {
            output.write_all(&bytes).await?;
            Ok(CommandStatus::Success)
        }
        _ => Ok(CommandStatus::Incomplete),
    }
}

async fn cmd_upload(
    session: &Session,
    endpoint: &str,
    input: &Path,
    config: &ToolConfig,
) -> Result<CommandStatus> {
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| ToolError::io(format!("Failed to read input file {}", input.display()), e))?;
    let data = NetworkData::from_bytes(bytes, None)?;

    let zero;
    let host_secret = match session.peer_secret() {
        Some(secret) => secret,
        None => {
            zero = SecretKey::from_bytes([0; 32]);
            &zero
        }
    };

    let client = PexClient::connect(endpoint, &config.sync).await?;
    match client.upload(&data, host_secret).await? {
        SyncOutcome::Uploaded => Ok(CommandStatus::Success),
        _ => Ok(CommandStatus::Incomplete),
    }
}

async fn cmd_listen(
    session: &mut Session,
    bind: &str,
    output: Option<&Path>,
    config: &ToolConfig,
) -> Result<CommandStatus> {
    let host_secret = session
        .peer_secret()
        .cloned()
        .ok_or_else(|| ToolError::invalid_argument("Missing -h <key> argument"))?;
    let data = session
        .take_network()
        .ok_or_else(|| ToolError::invalid_argument("Missing network data"))?;

    let mut server = PexServer::bind(bind, host_secret, data, &config.sync).await?;
    if let Some(path) = output {
        server = server.with_output(path);
    }

    let served = server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                debug!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        })
        .await?;
    info!(version = %served.version(), "served network data");
    Ok(CommandStatus::Success)
}

async fn write_key(output: &mut OutputSink, public: &PublicKeyMaterial) -> Result<CommandStatus> {
    let text = encode_key(public.key.as_bytes(), public.pq.as_deref());
    output.write_all(format!("{text}\n").as_bytes()).await?;
    Ok(CommandStatus::Success)
}
