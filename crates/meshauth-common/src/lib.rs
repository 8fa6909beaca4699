// ============================================
// File: crates/meshauth-common/src/lib.rs
// ============================================
//! # meshauth Common - Shared Types
//!
//! ## Creation Reason
//! Holds the small set of types every other meshauth crate needs: the
//! common error type, the container version timestamp, the zero-on-drop
//! byte buffer used for key material, and the 8-byte PEX host identifier.
//!
//! ## Main Functionality
//! - [`error`]: `CommonError` and the `Result` alias
//! - [`time`]: `Timestamp`, the unix-seconds version of a signed container
//! - [`types`]: `SensitiveBuffer` and `PexId`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               meshauth-tool                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   meshauth-core       meshauth-transport            │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             meshauth-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Leaf crate: no internal dependencies
//! - Anything holding secret bytes must zero itself on drop
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

pub use error::{CommonError, Result};
pub use time::Timestamp;
pub use types::{PexId, SensitiveBuffer};
