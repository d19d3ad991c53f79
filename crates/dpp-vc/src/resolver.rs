//! Key resolution for proof verification.
//!
//! DID resolution itself lives outside this crate; callers supply a
//! [`KeyResolver`]. [`StaticKeyResolver`] covers pinned keys.

use std::collections::BTreeMap;

use crate::ed25519::Ed25519PublicKey;
use crate::error::VcError;

/// Maps a proof's verification method (and the credential issuer) to a
/// public key.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, verification_method: &str, issuer: &str) -> Result<Ed25519PublicKey, VcError>;
}

/// A fixed table of keys.
///
/// Lookup order: the exact verification method, the verification method
/// without its `#fragment`, then the issuer.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyResolver {
    keys: BTreeMap<String, Ed25519PublicKey>,
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that answers every lookup with `key`.
    pub fn single(key: Ed25519PublicKey) -> Self {
        let mut resolver = Self::new();
        resolver.insert("*", key);
        resolver
    }

    /// Register `key` under a verification method id, an issuer id, or `*`.
    pub fn insert(&mut self, id: impl Into<String>, key: Ed25519PublicKey) {
        self.keys.insert(id.into(), key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, verification_method: &str, issuer: &str) -> Result<Ed25519PublicKey, VcError> {
        let controller = verification_method
            .split_once('#')
            .map_or(verification_method, |(c, _)| c);
        [verification_method, controller, issuer, "*"]
            .iter()
            .find_map(|id| self.keys.get(*id))
            .cloned()
            .ok_or_else(|| VcError::Key(format!("no key known for {verification_method}")))
    }
}
