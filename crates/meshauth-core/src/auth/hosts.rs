// ============================================
// File: crates/meshauth-core/src/auth/hosts.rs
// ============================================
//! # Host Table
//!
//! The container payload is a JSON document whose `hosts` object maps
//! host names to attributes. Only the base64 `key` attribute matters for
//! PEX: it lets a responder resolve a sender id to a host key.
//!
//! ```json
//! { "hosts": { "gw": { "key": "base64...", "endpoint": "..." } } }
//! ```

use serde_json::Value;
use tracing::debug;

use meshauth_common::PexId;

use crate::crypto::PublicKey;
use crate::error::{CoreError, Result};

/// A host listed in network data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Host name (the key of the `hosts` object).
    pub name: String,
    /// Host public key.
    pub key: PublicKey,
}

/// Hosts extracted from a payload, looked up by PEX id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostTable {
    entries: Vec<HostEntry>,
}

impl HostTable {
    /// Finds the host whose key starts with `id`.
    #[must_use]
    pub fn resolve(&self, id: &PexId) -> Option<&HostEntry> {
        self.entries.iter().find(|entry| entry.key.pex_id() == *id)
    }

    /// Number of hosts with a usable key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no host has a usable key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the hosts.
    pub fn iter(&self) -> impl Iterator<Item = &HostEntry> {
        self.entries.iter()
    }
}

/// Parses the payload and collects every host with a valid `key`.
///
/// Hosts without a key, or with a key that is not 32 bytes of base64,
/// are skipped.
///
/// # Errors
/// - `Common(Decoding)` if the payload is not JSON
/// - `MissingField("hosts")` if there is no `hosts` object
pub fn extract_hosts(payload: &str) -> Result<HostTable> {
    let doc: Value = serde_json::from_str(payload).map_err(|e| {
        meshauth_common::CommonError::decoding("network data payload", e.to_string())
    })?;

    let hosts = doc
        .get("hosts")
        .and_then(Value::as_object)
        .ok_or(CoreError::MissingField { field: "hosts" })?;

    let mut entries = Vec::with_capacity(hosts.len());
    for (name, attrs) in hosts {
        let parsed = attrs
            .get("key")
            .and_then(Value::as_str)
            .map(str::parse::<PublicKey>);
        match parsed {
            Some(Ok(key)) => entries.push(HostEntry {
                name: name.clone(),
                key,
            }),
            _ => debug!(host = %name, "skipping host without a valid key"),
        }
    }

    Ok(HostTable { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    #[test]
    fn test_extract_and_resolve() {
        let a = SecretKey::generate().host_public_key();
        let b = SecretKey::generate().host_public_key();
        let payload = format!(
            r#"{{"hosts":{{"a":{{"key":"{a}","endpoint":"10.0.0.1"}},"b":{{"key":"{b}"}}}}}}"#
        );

        let table = extract_hosts(&payload).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(&a.pex_id()).unwrap().name, "a");
        assert_eq!(table.resolve(&b.pex_id()).unwrap().key, b);
        assert!(table.resolve(&PexId::from_bytes([0; 8])).is_none());
    }

    #[test]
    fn test_skips_invalid_keys() {
        let table = extract_hosts(r#"{"hosts":{"x":{"key":"AAAA"},"y":{},"z":{"key":5}}}"#).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_hosts() {
        assert!(matches!(
            extract_hosts(r#"{"config":{}}"#),
            Err(CoreError::MissingField { field: "hosts" })
        ));
        assert!(matches!(
            extract_hosts(r#"{"hosts":[]}"#),
            Err(CoreError::MissingField { .. })
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(extract_hosts("not json"), Err(CoreError::Common(_))));
    }
}
