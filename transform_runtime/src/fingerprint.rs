//! Input fingerprinting — correlate log records for one invocation.

use sha2::{Digest, Sha256};

/// SHA-256 of the raw input bytes. Lowercase hex string.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let h1 = fingerprint(b"same input");
        let h2 = fingerprint(b"same input");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, fingerprint(b"other input"));
    }
}
