//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted for document-level digests
//! (report hashes, credential signing input). Serialization goes through
//! `serde_jcs` (RFC 8785): sorted keys, compact separators, deterministic
//! number formatting. Two structurally equal JSON documents therefore yield
//! identical bytes regardless of map insertion order.

use serde::Serialize;

use crate::error::CoreError;

/// Bytes produced by RFC 8785 canonicalization.
///
/// The inner `Vec<u8>` is private; [`CanonicalBytes::new()`] is the only
/// constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CoreError> {
        let value = serde_json::to_value(obj)?;
        let bytes = serde_jcs::to_vec(&value)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn test_floats_are_accepted() {
        let cb = CanonicalBytes::new(&json!({"weight": 1.5})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"weight":1.5}"#);
    }

    #[test]
    fn test_empty_object() {
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert_eq!(cb.len(), 2);
        assert!(!cb.is_empty());
    }
}
