use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Material an [`AccountId`] is derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMaterial {
    /// An ed25519 or secp256k1 public key, raw bytes.
    PublicKey(Vec<u8>),
    /// A human-readable seed phrase (tests and fixtures).
    Seed(String),
}

/// Address of a ledger account.
///
/// An `AccountId` is the first 20 bytes of a domain-separated BLAKE3 hash of
/// the account's [`KeyMaterial`]. The all-zero id is the null account and is
/// never a valid transaction party.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Number of bytes in an account id.
    pub const LEN: usize = 20;

    /// Derive an `AccountId` from key material.
    pub fn derive(material: &KeyMaterial) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tally-account-v1:");
        match material {
            KeyMaterial::PublicKey(pk) => {
                hasher.update(b"pubkey:");
                hasher.update(pk);
            }
            KeyMaterial::Seed(seed) => {
                hasher.update(b"seed:");
                hasher.update(seed.as_bytes());
            }
        }
        let digest = hasher.finalize();
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest.as_bytes()[..20]);
        Self(id)
    }

    /// Convenience for fixtures: derive from a seed phrase.
    pub fn from_seed(seed: &str) -> Self {
        Self::derive(&KeyMaterial::Seed(seed.to_string()))
    }

    /// Create an ephemeral (random) account id for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&KeyMaterial::PublicKey(bytes.to_vec()))
    }

    /// The null account.
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` for the null account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Create from raw bytes.
    pub const fn from_raw(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("r:{}", hex::encode(&self.0[..4]))
    }

    /// Parse from a hex string (40 hex characters, optional `r:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("r:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != Self::LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short_id())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}
