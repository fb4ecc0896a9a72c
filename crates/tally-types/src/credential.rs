use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::AccountId;
use crate::limits::MAX_CREDENTIAL_TYPE_LEN;

/// Opaque credential classification chosen by the issuer (1 to 64 bytes).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialType(Vec<u8>);

impl CredentialType {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
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

    /// Non-empty and within [`MAX_CREDENTIAL_TYPE_LEN`].
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_CREDENTIAL_TYPE_LEN
    }
}

impl fmt::Debug for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "CredentialType({s:?})"),
            Err(_) => write!(f, "CredentialType(0x{})", hex::encode(&self.0)),
        }
    }
}

impl From<&str> for CredentialType {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// An (issuer, credential type) pair accepted by a credential preauthorization.
///
/// Ordering is issuer first, then type bytes; this is the canonical order in
/// which preauthorization lists are stored and hashed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialSpec {
    pub issuer: AccountId,
    pub credential_type: CredentialType,
}

impl CredentialSpec {
    pub fn new(issuer: AccountId, credential_type: impl Into<CredentialType>) -> Self {
        Self {
            issuer,
            credential_type: credential_type.into(),
        }
    }
}
