// ============================================
// File: crates/meshauth-core/src/auth/mod.rs
// ============================================
//! # Auth Module
//!
//! ## Main Functionality
//! - [`container`]: signed container codec and validation
//! - [`hosts`]: host table extracted from the JSON payload
//! - [`NetworkData`]: a validated container bundled with its hosts, the
//!   unit the PEX server and client exchange
//!
//! ## Last Modified
//! v0.1.0 - Initial auth module

pub mod container;
pub mod hosts;

pub use container::{
    validate, AuthContainer, ValidatedContainer, ValidationError, CONTAINER_MAGIC,
    MAX_CONTAINER_SIZE, MIN_CONTAINER_SIZE,
};
pub use hosts::{extract_hosts, HostEntry, HostTable};

use meshauth_common::Timestamp;

use crate::crypto::PublicKey;
use crate::error::Result;

/// Validated network data with its host table.
///
/// # Invariants
/// - `bytes` passed [`validate`]
/// - the payload has a `hosts` object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkData {
    bytes: Vec<u8>,
    version: Timestamp,
    network_key: PublicKey,
    payload: String,
    hosts: HostTable,
}

impl NetworkData {
    /// Validates `bytes` and extracts the host table.
    ///
    /// # Errors
    /// - `Validation` if the container is rejected
    /// - `MissingField` / `Common(Decoding)` if the payload has no hosts
    pub fn from_bytes(bytes: Vec<u8>, expected: Option<&PublicKey>) -> Result<Self> {
        let checked = validate(expected, &bytes)?;
        let hosts = extract_hosts(checked.payload)?;
        let version = checked.version;
        let network_key = checked.public_key;
        let payload = checked.payload.to_owned();
        Ok(Self {
            bytes,
            version,
            network_key,
            payload,
            hosts,
        })
    }

    /// Encoded container.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Container version (signing time).
    #[must_use]
    pub const fn version(&self) -> Timestamp {
        self.version
    }

    /// Signing key of the network.
    #[must_use]
    pub const fn network_key(&self) -> &PublicKey {
        &self.network_key
    }

    /// JSON payload text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Hosts with a usable key.
    #[must_use]
    pub const fn hosts(&self) -> &HostTable {
        &self.hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::error::CoreError;

    #[test]
    fn test_network_data_from_signed_container() {
        let network = SecretKey::generate();
        let host = SecretKey::generate().host_public_key();
        let payload = format!(r#"{{"hosts":{{"h1":{{"key":"{host}"}}}}}}"#);
        let container = AuthContainer::sign(&payload, &network, Timestamp::from_secs(100));

        let data =
            NetworkData::from_bytes(container.into_bytes(), Some(&network.signing_public_key()))
                .unwrap();
        assert_eq!(data.version(), Timestamp::from_secs(100));
        assert_eq!(data.payload(), payload);
        assert_eq!(data.hosts().resolve(&host.pex_id()).unwrap().name, "h1");
    }

    #[test]
    fn test_network_data_requires_hosts() {
        let network = SecretKey::generate();
        let container = AuthContainer::sign("{}", &network, Timestamp::from_secs(1));
        assert!(matches!(
            NetworkData::from_bytes(container.into_bytes(), None),
            Err(CoreError::MissingField { field: "hosts" })
        ));
    }

    #[test]
    fn test_network_data_wrong_key() {
        let container =
            AuthContainer::sign(r#"{"hosts":{}}"#, &SecretKey::generate(), Timestamp::from_secs(1));
        let other = SecretKey::generate().signing_public_key();
        assert!(matches!(
            NetworkData::from_bytes(container.into_bytes(), Some(&other)),
            Err(CoreError::Validation(ValidationError::KeyMismatch))
        ));
    }
}
