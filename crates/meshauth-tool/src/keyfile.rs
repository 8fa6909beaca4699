// ============================================
// File: crates/meshauth-tool/src/keyfile.rs
// ============================================
//! # Key and Passphrase Input
//!
//! ## Main Functionality
//! - `read_key`: key text from a file or `-` (stdin)
//! - `parse_rounds`: the `<rounds>,<salt>` seed argument
//! - `read_passphrase`: stdin or interactive prompt
//!
//! ## ⚠️ Important Note for Next Developer
//! - The passphrase is used byte-for-byte as read; a trailing newline on
//!   stdin is part of it
//! - Passphrases live in `SensitiveBuffer` so they are zeroed on drop
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::io::Read;

use tokio::io::AsyncReadExt;
use tracing::debug;

use meshauth_common::SensitiveBuffer;
use meshauth_core::crypto::{decode_key, DecodedKey};

use crate::error::{Result, ToolError};

/// Longest passphrase accepted on stdin.
pub const MAX_PASSPHRASE_LEN: usize = 256;

/// Longest key text accepted; fits a sntrup761 secret plus a classical key.
const MAX_KEY_TEXT_LEN: u64 = 8192;

/// Source name meaning standard input.
pub const STDIN_SOURCE: &str = "-";

/// Reads and decodes key text from `source`.
///
/// # Errors
/// - `Io` if the source cannot be read
/// - `Core(KeyParse)` if the text is not a key
pub async fn read_key(source: &str) -> Result<DecodedKey> {
    let mut text = String::new();
    let read = if source == STDIN_SOURCE {
        tokio::io::stdin()
            .take(MAX_KEY_TEXT_LEN)
            .read_to_string(&mut text)
            .await
    } else {
        match tokio::fs::File::open(source).await {
            Ok(file) => file.take(MAX_KEY_TEXT_LEN).read_to_string(&mut text).await,
            Err(e) => Err(e),
        }
    };
    read.map_err(|e| ToolError::io(format!("Can't open key file {source} for reading"), e))?;

    debug!(source, "loaded key text");
    Ok(decode_key(&text)?)
}

/// Parses the rounds prefix of a `<rounds>,<salt>` argument.
///
/// Accepts decimal, `0x` hexadecimal and `0`-prefixed octal.
///
/// # Errors
/// `InvalidArgument` if rounds are missing, zero, out of range or not
/// followed by a comma.
pub fn parse_rounds(seed: &str) -> Result<u32> {
    let invalid = || ToolError::invalid_argument("Invalid number of rounds");

    let (rounds, _salt) = seed.split_once(',').ok_or_else(invalid)?;
    let (digits, radix) = if let Some(hex) = rounds
        .strip_prefix("0x")
        .or_else(|| rounds.strip_prefix("0X"))
    {
        (hex, 16)
    } else if rounds.len() > 1 && rounds.starts_with('0') {
        (&rounds[1..], 8)
    } else {
        (rounds, 10)
    };

    match u32::from_str_radix(digits, radix) {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(rounds) => Ok(rounds),
    }
}

/// Reads the passphrase for seed derivation.
///
/// With `prompt == 0` the passphrase is all of stdin. With `prompt >= 1`
/// it is typed at the terminal; `prompt >= 2` asks a second time and
/// requires both entries to match.
///
/// # Errors
/// - `InvalidArgument` if stdin holds more than [`MAX_PASSPHRASE_LEN`] bytes
/// - `PassphraseMismatch` if the confirmation differs
/// - `Io` if reading fails
pub fn read_passphrase(prompt: u8) -> Result<SensitiveBuffer> {
    if prompt == 0 {
        return read_passphrase_from(std::io::stdin().lock());
    }

    let first = SensitiveBuffer::new(
        rpassword::prompt_password("Password: ")
            .map_err(|e| ToolError::io("Failed to read password", e))?
            .into_bytes(),
    );
    if prompt > 1 {
        let second = SensitiveBuffer::new(
            rpassword::prompt_password("Retype password: ")
                .map_err(|e| ToolError::io("Failed to read password", e))?
                .into_bytes(),
        );
        if first.as_bytes() != second.as_bytes() {
            return Err(ToolError::PassphraseMismatch);
        }
    }
    Ok(first)
}

fn read_passphrase_from(reader: impl Read) -> Result<SensitiveBuffer> {
    let mut buf = Vec::with_capacity(MAX_PASSPHRASE_LEN + 1);
    reader
        .take(MAX_PASSPHRASE_LEN as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ToolError::io("Failed to read key data", e))?;

    let buf = SensitiveBuffer::new(buf);
    if buf.len() > MAX_PASSPHRASE_LEN {
        return Err(ToolError::invalid_argument("Key data too long"));
    }
    Ok(buf)
}
