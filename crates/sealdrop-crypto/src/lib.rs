//! sealdrop-crypto: envelope encryption for the sealdrop relay
//!
//! Every stored object gets its own key, drawn fresh from the OS CSPRNG and
//! handed back to the uploader. The relay never keeps it.
//!
//! ```text
//! plaintext ──SHA-256──────────────────────────────▶ content digest (audit only)
//!     │
//!     └── AES-256-GCM (key = fresh 256-bit, nonce = fresh 96-bit, no AAD)
//!             ├── ciphertext (same length as plaintext) ──▶ object store
//!             └── 128-bit tag ─┐
//!                  key, iv ────┴──────────────────────────▶ caller
//! ```

pub mod digest;
pub mod envelope;
pub mod error;
pub mod keys;

pub use digest::{digest, ContentDigest};
pub use envelope::{decrypt, encrypt, encrypt_with, Sealed};
pub use error::{CryptoError, CryptoResult};
pub use keys::{
    generate_iv, generate_iv_from, generate_key, generate_key_from, AuthTag, Iv, KeyMaterial,
    OsRandom, RandomSource,
};

/// Size of an AES-256 key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a SHA-256 digest
pub const DIGEST_SIZE: usize = 32;
