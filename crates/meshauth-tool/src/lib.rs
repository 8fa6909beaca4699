// ============================================
// File: crates/meshauth-tool/src/lib.rs
// ============================================
//! # meshauth Tool Library
//!
//! ## Creation Reason
//! Everything behind the `meshauth` binary, kept in a library so the
//! PEX services can be driven directly from integration tests.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`cli`]: flag definitions
//! - [`commands`]: command selection, prerequisites, dispatch
//! - [`config`]: TOML configuration
//! - [`session`]: keys and network data loaded for one invocation
//! - [`keyfile`]: key text and passphrase input
//! - [`output`]: stdout or `-o` file
//! - [`handlers`]: PEX datagram decoding and request authorization
//! - [`services`]: PEX requester and responder
//! - [`error`]: tool error types
//!
//! ## Architecture Overview
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────────────────────────────┐
//! │   Cli    │──►│ Session  │──►│            commands             │
//! └──────────┘   └──────────┘   │ sign verify keys │ sync  listen │
//!                               └────────┬─────────┴──────┬───────┘
//!                                        ▼                ▼
//!                               ┌──────────────┐  ┌───────────────┐
//!                               │ OutputSink   │  │ PexClient     │
//!                               └──────────────┘  │ PexServer     │
//!                                                 └───────┬───────┘
//!                                                         ▼
//!                                                 meshauth-transport
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One command per process; there is no shared state between runs
//! - Logging is installed by the binary, not here
//!
//! ## Last Modified
//! v0.1.0 - Initial tool library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod keyfile;
pub mod output;
pub mod services;
pub mod session;

// Re-export primary types
pub use cli::Cli;
pub use commands::{run, Command, CommandStatus};
pub use config::ToolConfig;
pub use error::{Result, ToolError};
pub use services::{PexClient, PexServer, SyncOutcome};
pub use session::Session;
