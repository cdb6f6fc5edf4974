use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// MD5 content digest used for transfer integrity checks.
///
/// Upstream object stores expose the MD5 of an object in the `ETag` response
/// header, so a freshly fetched body can be verified against what the origin
/// claims to hold. Identical bytes always produce the same `Checksum`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checksum([u8; 16]);

impl Checksum {
    /// Compute the checksum of a byte slice.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create a `Checksum` from a pre-computed digest.
    pub fn from_digest(digest: [u8; 16]) -> Self {
        Self(digest)
    }

    /// Parse from a 32-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(TypeError::InvalidLength {
                expected: 16,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Parse a checksum out of a transport header value.
    ///
    /// Transport-layer checksum headers are usually quoted (`"d41d8c..."`)
    /// and may carry a weak-validator prefix (`W/"d41d8c..."`). Both are
    /// stripped before the hex digest is parsed.
    pub fn parse_header(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let trimmed = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);
        Self::from_hex(trimmed)
    }

    /// Verify that `data` hashes to this checksum.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::of(data) == *self
    }

    /// The raw 16-byte digest.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 16]> for Checksum {
    fn from(digest: [u8; 16]) -> Self {
        Self(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // d41d8cd98f00b204e9800998ecf8427e is MD5 of the empty input.
    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn of_is_deterministic() {
        let c1 = Checksum::of(b"hello world");
        let c2 = Checksum::of(b"hello world");
        assert_eq!(c1, c2);
    }

    #[test]
    fn different_data_produces_different_checksums() {
        assert_ne!(Checksum::of(b"hello"), Checksum::of(b"world"));
    }

    #[test]
    fn known_digest() {
        assert_eq!(Checksum::of(b"").to_hex(), EMPTY_MD5);
        assert_eq!(
            Checksum::of(b"hello world").to_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let c = Checksum::of(b"roundtrip");
        assert_eq!(Checksum::from_hex(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn from_hex_rejects_bad_length() {
        let err = Checksum::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 16,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            Checksum::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn parse_header_bare() {
        let c = Checksum::parse_header(EMPTY_MD5).unwrap();
        assert_eq!(c.to_hex(), EMPTY_MD5);
    }

    #[test]
    fn parse_header_quoted() {
        let c = Checksum::parse_header(&format!("\"{EMPTY_MD5}\"")).unwrap();
        assert_eq!(c.to_hex(), EMPTY_MD5);
    }

    #[test]
    fn parse_header_weak_validator() {
        let c = Checksum::parse_header(&format!("W/\"{EMPTY_MD5}\"")).unwrap();
        assert_eq!(c.to_hex(), EMPTY_MD5);
    }

    #[test]
    fn parse_header_rejects_multipart_etag() {
        // Multipart-upload ETags are not MD5 digests.
        assert!(Checksum::parse_header("\"d41d8cd98f00b204e9800998ecf8427e-2\"").is_err());
    }

    #[test]
    fn verify_correct_data() {
        let c = Checksum::of(b"payload");
        assert!(c.verify(b"payload"));
    }

    #[test]
    fn verify_incorrect_data() {
        let c = Checksum::of(b"payload");
        assert!(!c.verify(b"tampered"));
    }

    #[test]
    fn serde_roundtrip() {
        let c = Checksum::of(b"serde");
        let json = serde_json::to_string(&c).unwrap();
        let back: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
