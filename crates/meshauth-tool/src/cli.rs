// ============================================
// File: crates/meshauth-tool/src/cli.rs
// ============================================
//! # Command Line Surface
//!
//! ## Creation Reason
//! Single-letter flags, one command per invocation. `-h` loads the peer
//! key, so the usual help short flag is off and help is `--help` only.
//!
//! ## Usage
//! ```bash
//! meshauth -G > net.key                          # signing key
//! meshauth -P -K net.key > net.pub               # its public key
//! meshauth -S net.json -K net.key -o net.bin     # sign network data
//! meshauth -V net.bin -k net.pub                 # verify
//! meshauth -T -b net.bin                         # show payload
//! meshauth -D node:51819 -k net.pub -h host.key -o net.bin
//! meshauth -U node net.bin -h host.key
//! meshauth -L 0.0.0.0 -b net.bin -h host.key
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI definition

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

use crate::commands::Command;

/// Key management, signed network data and PEX sync.
#[derive(Parser, Debug, Default)]
#[command(name = "meshauth")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(group(
    ArgGroup::new("command")
        .required(true)
        .multiple(false)
        .args([
            "sign", "verify", "pubkey", "host_pubkey", "show_payload",
            "generate_host", "generate_signing", "download", "upload", "listen",
        ])
))]
pub struct Cli {
    // ========================================
    // Commands
    // ========================================

    /// Sign a network data file
    #[arg(short = 'S', value_name = "FILE")]
    pub sign: Option<PathBuf>,

    /// Verify a signed network data file
    #[arg(short = 'V', value_name = "FILE")]
    pub verify: Option<PathBuf>,

    /// Print the signing public key
    #[arg(short = 'P')]
    pub pubkey: bool,

    /// Print the host public key of the secret key
    #[arg(short = 'H')]
    pub host_pubkey: bool,

    /// Print the payload of the -b network data
    #[arg(short = 'T')]
    pub show_payload: bool,

    /// Generate a host key
    #[arg(short = 'g')]
    pub generate_host: bool,

    /// Generate a signing key
    #[arg(short = 'G')]
    pub generate_signing: bool,

    /// Download network data from a peer
    #[arg(short = 'D', value_name = "HOST[:PORT]")]
    pub download: Option<String>,

    /// Upload a network data file to a peer
    #[arg(short = 'U', num_args = 2, value_names = ["HOST[:PORT]", "FILE"])]
    pub upload: Option<Vec<String>>,

    /// Serve the -b network data until interrupted
    #[arg(short = 'L', value_name = "ADDR[:PORT]")]
    pub listen: Option<String>,

    // ========================================
    // Options
    // ========================================

    /// Suppress diagnostics
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Output file
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Public key (file or - for stdin)
    #[arg(short = 'k', value_name = "FILE", conflicts_with_all = ["secret_key", "seed", "network_data"])]
    pub public_key: Option<String>,

    /// Secret key (file or - for stdin)
    #[arg(short = 'K', value_name = "FILE", conflicts_with = "seed")]
    pub secret_key: Option<String>,

    /// Peer host secret key (file or - for stdin)
    #[arg(short = 'h', value_name = "FILE")]
    pub peer_key: Option<String>,

    /// Derive the secret key from a passphrase
    #[arg(short = 's', value_name = "ROUNDS,SALT")]
    pub seed: Option<String>,

    /// Prompt for the passphrase (twice to confirm)
    #[arg(short = 'p', action = ArgAction::Count)]
    pub prompt: u8,

    /// Signed network data to load
    #[arg(short = 'b', value_name = "FILE")]
    pub network_data: Option<PathBuf>,

    /// XOR key to combine with the secret key (file or - for stdin)
    #[arg(short = 'x', value_name = "FILE")]
    pub xor_key: Option<String>,

    /// Enable post-quantum keys
    #[arg(short = 'Q')]
    pub post_quantum: bool,

    /// Configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl Cli {
    /// The command selected by the flags, if any.
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        if let Some(input) = &self.sign {
            return Some(Command::Sign {
                input: input.clone(),
            });
        }
        if let Some(input) = &self.verify {
            return Some(Command::Verify {
                input: input.clone(),
            });
        }
        if let Some(endpoint) = &self.download {
            return Some(Command::Download {
                endpoint: endpoint.clone(),
            });
        }
        if let Some([endpoint, input]) = self.upload.as_deref() {
            return Some(Command::Upload {
                endpoint: endpoint.clone(),
                input: PathBuf::from(input),
            });
        }
        if let Some(bind) = &self.listen {
            return Some(Command::Listen { bind: bind.clone() });
        }

        [
            (self.pubkey, Command::Pubkey),
            (self.host_pubkey, Command::HostPubkey),
            (self.show_payload, Command::ShowPayload),
            (self.generate_host, Command::GenerateHost),
            (self.generate_signing, Command::GenerateSigning),
        ]
        .into_iter()
        .find_map(|(set, command)| set.then_some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("meshauth").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        <Cli as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_single_command() {
        let cli = parse(&["-P", "-K", "key"]).unwrap();
        assert_eq!(cli.command(), Some(Command::Pubkey));
        assert_eq!(cli.secret_key.as_deref(), Some("key"));

        let cli = parse(&["-U", "node:4000", "net.bin", "-h", "-"]).unwrap();
        assert_eq!(
            cli.command(),
            Some(Command::Upload {
                endpoint: "node:4000".into(),
                input: PathBuf::from("net.bin"),
            })
        );
        assert_eq!(cli.peer_key.as_deref(), Some("-"));
    }

    #[test]
    fn test_two_commands_rejected() {
        let err = parse(&["-P", "-H"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_missing_command_rejected() {
        let err = parse(&["-q"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_key_conflicts() {
        assert!(parse(&["-P", "-k", "a", "-K", "b"]).is_err());
        assert!(parse(&["-P", "-k", "a", "-s", "1,x"]).is_err());
        assert!(parse(&["-T", "-k", "a", "-b", "net.bin"]).is_err());
        assert!(parse(&["-P", "-K", "a", "-s", "1,x"]).is_err());
        assert!(parse(&["-T", "-K", "a", "-b", "net.bin"]).is_ok());
    }

    #[test]
    fn test_prompt_count() {
        let cli = parse(&["-P", "-s", "10,salt", "-p", "-p"]).unwrap();
        assert_eq!(cli.prompt, 2);
    }

    #[test]
    fn test_long_help() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
