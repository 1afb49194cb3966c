//! AES-256-GCM envelope encryption with a detached tag
//!
//! Stored object format: raw ciphertext only, `len(ciphertext) == len(plaintext)`.
//! The IV and tag travel with the key back to the caller, never to storage.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{generate_iv_from, AuthTag, Iv, KeyMaterial, OsRandom, RandomSource};
use crate::TAG_SIZE;

/// Output of [`encrypt`]
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub tag: AuthTag,
}

/// Encrypt `plaintext` under `key` with a freshly drawn IV.
///
/// There is no way to pass an IV in: each call draws its own, so a (key, IV)
/// pair is never reused.
pub fn encrypt(plaintext: &[u8], key: &KeyMaterial) -> CryptoResult<Sealed> {
    encrypt_with(plaintext, key, &OsRandom)
}

/// [`encrypt`], drawing the IV from `rng`.
pub fn encrypt_with(
    plaintext: &[u8],
    key: &KeyMaterial,
    rng: &dyn RandomSource,
) -> CryptoResult<Sealed> {
    let iv = generate_iv_from(rng)?;
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(iv.as_bytes()), b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Sealed {
        ciphertext: buffer,
        iv,
        tag: AuthTag::from_bytes(tag_bytes),
    })
}

/// Decrypt and verify `ciphertext`.
///
/// Any mismatch in ciphertext, key, IV, or tag yields
/// [`CryptoError::Verification`] and no bytes at all; the working buffer is
/// wiped before returning.
pub fn decrypt(
    ciphertext: &[u8],
    key: &KeyMaterial,
    iv: &Iv,
    tag: &AuthTag,
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        Nonce::from_slice(iv.as_bytes()),
        b"",
        &mut buffer,
        Tag::from_slice(tag.as_bytes()),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CryptoError::Verification)
        }
    }
}
