//! Ledger digest
//!
//! Every violation record carries the SHA-256 digest of its canonical content
//! (which includes the predecessor's digest). Digests are domain separated so a
//! ledger hash can never collide with a hash computed for another purpose.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain prefix for violation record hashing
pub const DOMAIN_LEDGER_RECORD: &[u8] = b"ANANSE_LEDGER_V1";

/// `prevHash` of the first record in a chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Length of a hex-encoded ledger hash
pub const HASH_HEX_LEN: usize = 64;

/// A 32-byte ledger digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerHash(pub [u8; 32]);

impl LedgerHash {
    /// Hash canonical record content
    pub fn digest(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_LEDGER_RECORD);
        hasher.update((content.len() as u64).to_be_bytes());
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Get the inner bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hexadecimal string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for LedgerHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whether a stored hash string has the shape of a ledger digest
/// (64 lowercase hex characters). The genesis sentinel qualifies.
pub fn is_well_formed(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
