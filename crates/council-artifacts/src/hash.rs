//! Content addressing (§4.5): payload bytes are hashed with SHA-256 so two
//! artifacts with identical content share one blob.

use std::fmt::Write;

use sha2::{Digest, Sha256};

#[must_use]
pub fn content_hash(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        write!(out, "{byte:02x}").expect("writing to a String cannot fail");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_hashes_identically() {
        assert_eq!(content_hash("draft text"), content_hash("draft text"));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(content_hash("draft text"), content_hash("other text"));
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let hash = content_hash("anything");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
