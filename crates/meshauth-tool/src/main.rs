// ============================================
// File: crates/meshauth-tool/src/main.rs
// ============================================
//! # meshauth Entry Point
//!
//! ## Creation Reason
//! Parses the flags, loads the configuration, installs logging and runs
//! the single selected command.
//!
//! ## Usage
//! ```bash
//! meshauth -G -o net.key
//! meshauth -S net.json -K net.key -o net.bin
//! meshauth -D node.example:51819 -b net.bin -h host.key -o net.bin.new
//! meshauth --config meshauth.toml -L 0.0.0.0 -b net.bin -h host.key
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Diagnostics go to stderr; stdout carries command output only
//! - `RUST_LOG` overrides the configured level, `-q` silences everything
//! - Exit code is 0 on success and 1 otherwise
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meshauth_tool::{run, Cli, ToolConfig};

// ============================================
// Main
// ============================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            init_logging("info", cli.quiet);
            error!("{e:#}");
            std::process::exit(1);
        }
    };
    init_logging(&config.logging.level, cli.quiet);

    match run(&cli, &config).await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            error!("{:#}", anyhow::Error::from(e));
            std::process::exit(1);
        }
    }
}

// ============================================
// Helper Functions
// ============================================

/// Loads `--config`, or the defaults without one.
async fn load_config(cli: &Cli) -> anyhow::Result<ToolConfig> {
    let Some(path) = &cli.config else {
        return Ok(ToolConfig::default());
    };
    ToolConfig::load(path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Initializes the tracing subscriber on stderr.
fn init_logging(level: &str, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
