//! Protocol size limits.

/// Maximum length of a credential type, in bytes.
pub const MAX_CREDENTIAL_TYPE_LEN: usize = 64;

/// Maximum length of a credential URI, in bytes.
pub const MAX_CREDENTIAL_URI_LEN: usize = 256;

/// Maximum number of credentials in a preauthorization list or in the
/// credential ids presented by a single transaction.
pub const MAX_CREDENTIALS: usize = 8;

/// Maximum preimage length accepted in a PREIMAGE-SHA-256 fulfillment.
pub const MAX_PREIMAGE_LEN: usize = 128;

/// Maximum encoded size of a fulfillment.
pub const MAX_FULFILLMENT_LEN: usize = 256;
