//! Property tests for the envelope cipher: round-trip, single-bit tamper
//! detection over every input, and uniqueness of generated key material.

use std::collections::HashSet;

use proptest::prelude::*;
use sealdrop_crypto::{
    decrypt, encrypt, generate_iv, generate_key, AuthTag, CryptoError, Iv, KeyMaterial, IV_SIZE,
    KEY_SIZE, TAG_SIZE,
};

fn flip_bit(bytes: &mut [u8], bit: usize) {
    bytes[bit / 8] ^= 1 << (bit % 8);
}

#[test]
fn ten_thousand_keys_are_distinct() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let key = generate_key().unwrap();
        assert!(seen.insert(*key.as_bytes()), "generate_key repeated a value");
    }
}

#[test]
fn ten_thousand_ivs_are_distinct() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let iv = generate_iv().unwrap();
        assert!(seen.insert(iv), "generate_iv repeated a value");
    }
}

#[test]
fn ivs_under_one_key_are_distinct() {
    let key = generate_key().unwrap();
    let mut seen = HashSet::new();
    for _ in 0..1_000 {
        let sealed = encrypt(b"x", &key).unwrap();
        assert!(seen.insert(sealed.iv), "encrypt reused an IV for the same key");
    }
}

#[test]
fn tag_is_always_128_bits() {
    let key = generate_key().unwrap();
    for len in [0usize, 1, 15, 16, 17, 4096] {
        let sealed = encrypt(&vec![0x5A; len], &key).unwrap();
        assert_eq!(sealed.tag.as_bytes().len(), TAG_SIZE);
        assert_eq!(sealed.ciphertext.len(), len);
    }
}

#[test]
fn wrong_key_and_wrong_tag_fail_identically() {
    let key = generate_key().unwrap();
    let sealed = encrypt(b"which part was wrong?", &key).unwrap();

    let other_key = generate_key().unwrap();
    let by_key = decrypt(&sealed.ciphertext, &other_key, &sealed.iv, &sealed.tag).unwrap_err();

    let mut tag = *sealed.tag.as_bytes();
    tag[TAG_SIZE - 1] ^= 0x80;
    let by_tag = decrypt(&sealed.ciphertext, &key, &sealed.iv, &AuthTag::from_bytes(tag))
        .unwrap_err();

    assert!(matches!(by_key, CryptoError::Verification));
    assert!(matches!(by_tag, CryptoError::Verification));
    assert_eq!(by_key.to_string(), by_tag.to_string());
}

proptest! {
    #[test]
    fn roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=2048)) {
        let key = generate_key().unwrap();
        let sealed = encrypt(&data, &key).unwrap();
        prop_assert_eq!(sealed.ciphertext.len(), data.len());

        let back = decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.tag).unwrap();
        prop_assert_eq!(back, data);
    }

    #[test]
    fn ciphertext_bit_flip_fails(
        data in proptest::collection::vec(any::<u8>(), 1..=512),
        bit_seed in any::<usize>(),
    ) {
        let key = generate_key().unwrap();
        let mut sealed = encrypt(&data, &key).unwrap();
        flip_bit(&mut sealed.ciphertext, bit_seed % (data.len() * 8));

        let result = decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.tag);
        prop_assert!(matches!(result, Err(CryptoError::Verification)));
    }

    #[test]
    fn key_bit_flip_fails(
        data in proptest::collection::vec(any::<u8>(), 0..=256),
        bit in 0usize..KEY_SIZE * 8,
    ) {
        let key = generate_key().unwrap();
        let sealed = encrypt(&data, &key).unwrap();

        let mut bytes = *key.as_bytes();
        flip_bit(&mut bytes, bit);
        let result = decrypt(&sealed.ciphertext, &KeyMaterial::from_bytes(bytes), &sealed.iv, &sealed.tag);
        prop_assert!(matches!(result, Err(CryptoError::Verification)));
    }

    #[test]
    fn iv_bit_flip_fails(
        data in proptest::collection::vec(any::<u8>(), 0..=256),
        bit in 0usize..IV_SIZE * 8,
    ) {
        let key = generate_key().unwrap();
        let sealed = encrypt(&data, &key).unwrap();

        let mut bytes = *sealed.iv.as_bytes();
        flip_bit(&mut bytes, bit);
        let result = decrypt(&sealed.ciphertext, &key, &Iv::from_bytes(bytes), &sealed.tag);
        prop_assert!(matches!(result, Err(CryptoError::Verification)));
    }

    #[test]
    fn tag_bit_flip_fails(
        data in proptest::collection::vec(any::<u8>(), 0..=256),
        bit in 0usize..TAG_SIZE * 8,
    ) {
        let key = generate_key().unwrap();
        let sealed = encrypt(&data, &key).unwrap();

        let mut bytes = *sealed.tag.as_bytes();
        flip_bit(&mut bytes, bit);
        let result = decrypt(&sealed.ciphertext, &key, &sealed.iv, &AuthTag::from_bytes(bytes));
        prop_assert!(matches!(result, Err(CryptoError::Verification)));
    }

    #[test]
    fn hex_triple_survives_text_boundary(data in proptest::collection::vec(any::<u8>(), 0..=256)) {
        let key = generate_key().unwrap();
        let sealed = encrypt(&data, &key).unwrap();

        let key2 = KeyMaterial::from_hex(&key.to_hex()).unwrap();
        let iv2 = Iv::from_hex(&sealed.iv.to_hex()).unwrap();
        let tag2 = AuthTag::from_hex(&sealed.tag.to_hex()).unwrap();

        let back = decrypt(&sealed.ciphertext, &key2, &iv2, &tag2).unwrap();
        prop_assert_eq!(back, data);
    }
}
