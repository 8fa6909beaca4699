// ============================================
// File: crates/meshauth-tool/src/output.rs
// ============================================
//! # Output Sink
//!
//! Command output goes to stdout, or to the `-o` file. The file is
//! created before the command runs and removed again if the command
//! does not succeed, so a failed run never leaves a truncated file.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::debug;

use crate::error::{Result, ToolError};

/// Where command output is written.
#[derive(Debug)]
pub enum OutputSink {
    /// Standard output.
    Stdout(Stdout),
    /// A file that is removed on failure.
    File {
        /// File path
        path: PathBuf,
        /// Open handle
        file: File,
    },
}

impl OutputSink {
    /// Opens the sink: the file at `path` (truncated), or stdout.
    ///
    /// # Errors
    /// `Io` if the file cannot be created.
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::stdout());
        };
        let file = File::create(path)
            .await
            .map_err(|e| ToolError::io("Failed to open output file", e))?;
        Ok(Self::File {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Standard output sink.
    #[must_use]
    pub fn stdout() -> Self {
        Self::Stdout(tokio::io::stdout())
    }

    /// Output file path, if writing to a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout(_) => None,
            Self::File { path, .. } => Some(path),
        }
    }

    /// Writes all of `bytes`.
    ///
    /// # Errors
    /// `Io` on write failure.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let written = match self {
            Self::Stdout(out) => out.write_all(bytes).await,
            Self::File { file, .. } => file.write_all(bytes).await,
        };
        written.map_err(|e| ToolError::io("Failed to write output", e))
    }

    /// Flushes and closes the sink after a successful command.
    ///
    /// # Errors
    /// `Io` if flushing fails.
    pub async fn finish(self) -> Result<()> {
        let flushed = match self {
            Self::Stdout(mut out) => out.flush().await,
            Self::File { mut file, .. } => match file.flush().await {
                Ok(()) => file.sync_all().await,
                Err(e) => Err(e),
            },
        };
        flushed.map_err(|e| ToolError::io("Failed to write output", e))
    }

    /// Drops the sink after a failed command, removing the output file.
    pub async fn discard(self) {
        if let Self::File { path, file } = self {
            drop(file);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(path = %path.display(), error = %e, "could not remove output file");
            }
        }
    }
}
