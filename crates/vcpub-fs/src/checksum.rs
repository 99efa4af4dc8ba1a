//! SHA-256 content digests
//!
//! Digests are rendered as `sha256:<hex>` and used to identify artifact
//! payloads in logs and transfer reports.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the digest of a byte payload.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_has_prefix() {
        assert!(compute_checksum(b"artifact").starts_with("sha256:"));
    }

    #[test]
    fn identical_payloads_share_checksum() {
        assert_eq!(compute_checksum(b"jar"), compute_checksum(b"jar"));
        assert_ne!(compute_checksum(b"jar"), compute_checksum(b"pom"));
    }

    #[test]
    fn checksum_known_value() {
        assert_eq!(
            compute_checksum(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
