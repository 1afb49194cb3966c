//! Key material, IVs, and tags: generation and hex text form

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::{IV_SIZE, KEY_SIZE, TAG_SIZE};

/// A single-use 256-bit data key. Zeroized on drop.
#[derive(Clone)]
pub struct KeyMaterial {
    bytes: [u8; KEY_SIZE],
}

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn from_hex(text: &str) -> CryptoResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        decode_fixed("key", text, &mut bytes).inspect_err(|_| bytes.zeroize())?;
        Ok(Self { bytes })
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// 96-bit AES-GCM nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> CryptoResult<Self> {
        let mut bytes = [0u8; IV_SIZE];
        decode_fixed("iv", text, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// 128-bit GCM authentication tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthTag([u8; TAG_SIZE]);

impl AuthTag {
    pub fn from_bytes(bytes: [u8; TAG_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> CryptoResult<Self> {
        let mut bytes = [0u8; TAG_SIZE];
        decode_fixed("auth tag", text, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Where key and IV bytes come from.
///
/// A failed fill is reported as [`CryptoError::RandomSource`]; implementations
/// must never fall back to a weaker generator.
pub trait RandomSource: Send + Sync {
    fn try_fill(&self, dest: &mut [u8]) -> CryptoResult<()>;
}

/// The operating-system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            tracing::error!(error = %e, "OS random source failed");
            CryptoError::RandomSource(e.to_string())
        })
    }
}

/// Generate a fresh 256-bit key from the OS CSPRNG.
pub fn generate_key() -> CryptoResult<KeyMaterial> {
    generate_key_from(&OsRandom)
}

pub fn generate_key_from(rng: &dyn RandomSource) -> CryptoResult<KeyMaterial> {
    let mut bytes = [0u8; KEY_SIZE];
    rng.try_fill(&mut bytes).inspect_err(|_| bytes.zeroize())?;
    Ok(KeyMaterial::from_bytes(bytes))
}

/// Generate a fresh 96-bit IV. Every call is an independent draw.
pub fn generate_iv() -> CryptoResult<Iv> {
    generate_iv_from(&OsRandom)
}

pub fn generate_iv_from(rng: &dyn RandomSource) -> CryptoResult<Iv> {
    let mut bytes = [0u8; IV_SIZE];
    rng.try_fill(&mut bytes)?;
    Ok(Iv(bytes))
}

fn decode_fixed(field: &'static str, text: &str, out: &mut [u8]) -> CryptoResult<()> {
    if text.len() != out.len() * 2 {
        return Err(CryptoError::InvalidEncoding {
            field,
            reason: format!("expected {} hex chars, got {}", out.len() * 2, text.len()),
        });
    }
    hex::decode_to_slice(text, out).map_err(|e| CryptoError::InvalidEncoding {
        field,
        reason: e.to_string(),
    })
}
