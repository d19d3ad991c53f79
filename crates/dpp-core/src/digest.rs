//! # Content Digest: Artifact Identity
//!
//! Every artifact is identified by the SHA-256 of the exact bytes it holds.
//! `ContentDigest` is that identity: 32 raw bytes, rendered as lowercase hex
//! everywhere it leaves the process (report records, evidence maps, the
//! content-addressed store file names).
//!
//! ## Invariant
//!
//! Parsing accepts upper- or lowercase hex, so two digests compare equal
//! whenever their hex spellings are equal ignoring case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// A SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap a raw 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string, case-insensitively.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let hex = hex.trim();
        if hex.len() != 64 {
            return Err(CoreError::InvalidDigest(hex.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair =
                std::str::from_utf8(chunk).map_err(|_| CoreError::InvalidDigest(hex.to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| CoreError::InvalidDigest(hex.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 over raw bytes. This is the artifact hash.
pub fn sha256_digest(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

/// SHA-256 over canonical JSON bytes, used for document-level hashes
/// such as the report hash embedded in an attestation.
pub fn canonical_digest(data: &CanonicalBytes) -> ContentDigest {
    sha256_digest(data.as_bytes())
}

/// Hex convenience wrapper around [`sha256_digest()`].
pub fn sha256_hex(data: &[u8]) -> String {
    sha256_digest(data).to_hex()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Hashing is a pure function of the bytes.
        #[test]
        fn digest_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let a = sha256_digest(&bytes);
            let b = sha256_digest(&bytes.clone());
            prop_assert_eq!(a, b);
            prop_assert_eq!(a.to_hex().len(), 64);
        }

        /// Hex rendering parses back to the same digest in either case.
        #[test]
        fn hex_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let d = sha256_digest(&bytes);
            prop_assert_eq!(ContentDigest::from_hex(&d.to_hex()).unwrap(), d);
            prop_assert_eq!(ContentDigest::from_hex(&d.to_hex().to_uppercase()).unwrap(), d);
        }
    }
}
