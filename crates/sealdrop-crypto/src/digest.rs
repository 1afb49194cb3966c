//! SHA-256 content digests for the transfer audit trail
//!
//! The digest is computed over plaintext on both sides of a transfer. It is a
//! log value only; the GCM tag is what decides whether decryption succeeds.

use sha2::{Digest, Sha256};

use crate::DIGEST_SIZE;

/// A SHA-256 digest (32 bytes), displayed as 64 lowercase hex chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_SIZE]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a byte slice in memory.
pub fn digest(data: &[u8]) -> ContentDigest {
    ContentDigest(Sha256::digest(data).into())
}
