// ============================================
// File: crates/meshauth-core/src/protocol/version.rs
// ============================================
//! # PEX Protocol Version
//!
//! Every PEX header starts with a version byte. Only version 0 exists;
//! datagrams carrying anything else are decode errors and get dropped.
//!
//! ## Version History
//! | Version | Description |
//! |---------|-------------|
//! | 0x00    | Update request / response / data / no-data |

/// Version written into every PEX header.
pub const PEX_PROTOCOL_VERSION: u8 = 0;

/// Returns `true` if `version` can be decoded.
#[must_use]
pub const fn is_supported(version: u8) -> bool {
    version == PEX_PROTOCOL_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_version_zero() {
        assert!(is_supported(0));
        assert!(!is_supported(1));
        assert!(!is_supported(0xff));
    }
}
