//! ImageFingerprinter trait for content-addressing screenshots.
//!
//! Defined in soma-core so the conversation service can fingerprint images
//! without coupling to a specific hash algorithm. The `Sha256Fingerprinter`
//! adapter lives in soma-infra.

/// Stable content hash over raw image bytes.
///
/// Identical bytes must always produce the identical fingerprint; the
/// fingerprint is the key of every identity binding.
pub trait ImageFingerprinter: Send + Sync {
    /// Hex-encoded digest of `bytes`.
    fn fingerprint(&self, bytes: &[u8]) -> String;
}
