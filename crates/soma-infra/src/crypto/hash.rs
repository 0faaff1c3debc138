//! SHA-256 image fingerprints.

use sha2::{Digest, Sha256};

use soma_core::service::hash::ImageFingerprinter;

/// Lowercase hex SHA-256 of the raw image bytes.
///
/// Byte-identical screenshots always map to the same fingerprint, which is
/// what lets an identity binding outlive the session that created it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Sha256Fingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageFingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_known_digest() {
        assert_eq!(
            Sha256Fingerprinter::new().fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_same_bytes_same_fingerprint() {
        let fp = Sha256Fingerprinter::new();
        assert_eq!(fp.fingerprint(b"IMG1"), fp.fingerprint(b"IMG1"));
        assert_ne!(fp.fingerprint(b"IMG1"), fp.fingerprint(b"IMG2"));
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex() {
        let hash = Sha256Fingerprinter::new().fingerprint(&[0xff, 0x00, 0x10]);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
