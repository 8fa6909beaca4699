// ============================================
// File: crates/meshauth-core/src/crypto/encoding.rs
// ============================================
//! # Key Text Encoding
//!
//! Keys are exchanged as one line of text: standard base64 of the 32-byte
//! classical key, optionally followed by `:` and base64 of the
//! post-quantum key.
//!
//! ```text
//! base64(key)[:base64(pq_key)]
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use meshauth_common::SensitiveBuffer;

use super::SECRET_KEY_SIZE;
use crate::error::{CoreError, Result};

/// Raw bytes decoded from key text, not yet bound to a role.
#[derive(Debug, Clone)]
pub struct DecodedKey {
    /// Classical key, always 32 bytes.
    pub key: SensitiveBuffer,
    /// Post-quantum key, if the text had a second part.
    pub pq: Option<SensitiveBuffer>,
}

/// Encodes a key (and optional PQ key) as key text.
#[must_use]
pub fn encode_key(key: &[u8], pq: Option<&[u8]>) -> String {
    match pq {
        Some(pq) => format!("{}:{}", BASE64.encode(key), BASE64.encode(pq)),
        None => BASE64.encode(key),
    }
}

/// Decodes key text. Surrounding whitespace is ignored.
///
/// # Errors
/// `KeyParse` if either part is not base64 or the classical part is not
/// exactly 32 bytes.
pub fn decode_key(text: &str) -> Result<DecodedKey> {
    let text = text.trim();
    let (classical, pq) = match text.split_once(':') {
        Some((classical, pq)) => (classical.trim_end(), Some(pq.trim_start())),
        None => (text, None),
    };

    let key = SensitiveBuffer::new(
        BASE64
            .decode(classical)
            .map_err(|e| CoreError::key_parse(format!("key: {e}")))?,
    );
    if key.len() != SECRET_KEY_SIZE {
        return Err(CoreError::key_parse(format!(
            "key must be {SECRET_KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }

    let pq = match pq {
        Some(pq) if !pq.is_empty() => Some(SensitiveBuffer::new(
            BASE64
                .decode(pq)
                .map_err(|e| CoreError::key_parse(format!("PQ key: {e}")))?,
        )),
        _ => None,
    };

    Ok(DecodedKey { key, pq })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_classical() {
        let text = encode_key(&[7u8; 32], None);
        assert!(!text.contains(':'));
        let decoded = decode_key(&format!("  {text}\n")).unwrap();
        assert_eq!(decoded.key.as_bytes(), &[7u8; 32]);
        assert!(decoded.pq.is_none());
    }

    #[test]
    fn test_encode_decode_with_pq() {
        let text = encode_key(&[1u8; 32], Some(&[2u8; 100]));
        let decoded = decode_key(&text).unwrap();
        assert_eq!(decoded.key.as_bytes(), &[1u8; 32]);
        assert_eq!(decoded.pq.unwrap().as_bytes(), &[2u8; 100]);
    }

    #[test]
    fn test_decode_rejects_short_key() {
        let text = encode_key(&[1u8; 31], None);
        assert!(matches!(decode_key(&text), Err(CoreError::KeyParse { .. })));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_key("not base64!"), Err(CoreError::KeyParse { .. })));
        let bad_pq = format!("{}:@@@", encode_key(&[1u8; 32], None));
        assert!(matches!(decode_key(&bad_pq), Err(CoreError::KeyParse { .. })));
    }

    #[test]
    fn test_decode_empty_pq_part() {
        let text = format!("{}:", encode_key(&[3u8; 32], None));
        assert!(decode_key(&text).unwrap().pq.is_none());
    }
}
