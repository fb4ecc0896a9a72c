use tally_types::ObjectIndex;

/// Domain-separated BLAKE3 hasher for ledger object indexes.
///
/// Each hasher carries a domain tag (e.g. `"tally-credential-v1"`) that is
/// prepended to every computation, so two object kinds with identical identity
/// fields never share an index. Fields are length-prefixed, which keeps
/// variable-length fields (credential types) from sliding into their
/// neighbours.
pub struct IndexHasher {
    domain: &'static str,
}

impl IndexHasher {
    pub const ACCOUNT: Self = Self::new("tally-account-v1");
    pub const CREDENTIAL: Self = Self::new("tally-credential-v1");
    pub const DEPOSIT_PREAUTH: Self = Self::new("tally-deposit-preauth-v1");
    pub const DEPOSIT_PREAUTH_CREDENTIALS: Self = Self::new("tally-deposit-preauth-creds-v1");
    pub const ESCROW: Self = Self::new("tally-escrow-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash identity fields, in order, into an index.
    pub fn index(&self, fields: &[&[u8]]) -> ObjectIndex {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for field in fields {
            hasher.update(&(field.len() as u32).to_be_bytes());
            hasher.update(field);
        }
        ObjectIndex::from_hash(*hasher.finalize().as_bytes())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_deterministic() {
        let a = IndexHasher::CREDENTIAL.index(&[b"subject", b"issuer", b"kyc"]);
        let b = IndexHasher::CREDENTIAL.index(&[b"subject", b"issuer", b"kyc"]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_domains_produce_different_indexes() {
        let fields: &[&[u8]] = &[b"owner", b"other"];
        assert_ne!(
            IndexHasher::DEPOSIT_PREAUTH.index(fields),
            IndexHasher::ESCROW.index(fields)
        );
    }

    #[test]
    fn field_order_matters() {
        assert_ne!(
            IndexHasher::CREDENTIAL.index(&[b"a", b"b"]),
            IndexHasher::CREDENTIAL.index(&[b"b", b"a"])
        );
    }

    #[test]
    fn length_prefix_prevents_boundary_collisions() {
        assert_ne!(
            IndexHasher::CREDENTIAL.index(&[b"ab", b"c"]),
            IndexHasher::CREDENTIAL.index(&[b"a", b"bc"])
        );
    }

    #[test]
    fn never_null() {
        assert!(!IndexHasher::ACCOUNT.index(&[]).is_null());
    }
}
