use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use rand::RngCore;

use super::pkcs5::Pkcs5;
use crate::error::DecryptionError;
use crate::Result;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcDecNoPad = cbc::Decryptor<Aes256>;
type Aes256CbcEncNoPad = cbc::Encryptor<Aes256>;

/// AES-CBC with PKCS#5 padding and a random 16-byte IV prepended to the
/// ciphertext, per §4.2 "encrypt_bytes / decrypt_bytes".
pub fn encrypt_128(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; 16];
    rand::rng().fill_bytes(&mut iv);
    let cipher = Aes128CbcEnc::new(key.into(), &iv.into());
    let mut out = iv.to_vec();
    out.extend(cipher.encrypt_padded_vec_mut::<Pkcs5>(plaintext));
    out
}

pub fn decrypt_128(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < 16 {
        return Err(DecryptionError::InvalidCiphertext.into());
    }
    let (iv, body) = ciphertext.split_at(16);
    let cipher = Aes128CbcDec::new(key.into(), iv.into());
    cipher
        .decrypt_padded_vec_mut::<Pkcs5>(body)
        .map_err(|_| DecryptionError::InvalidPadding.into())
}

pub fn encrypt_256(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; 16];
    rand::rng().fill_bytes(&mut iv);
    let cipher = Aes256CbcEnc::new(key.into(), &iv.into());
    let mut out = iv.to_vec();
    out.extend(cipher.encrypt_padded_vec_mut::<Pkcs5>(plaintext));
    out
}

pub fn decrypt_256(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < 16 {
        return Err(DecryptionError::InvalidCiphertext.into());
    }
    let (iv, body) = ciphertext.split_at(16);
    let cipher = Aes256CbcDec::new(key.into(), iv.into());
    cipher
        .decrypt_padded_vec_mut::<Pkcs5>(body)
        .map_err(|_| DecryptionError::InvalidPadding.into())
}

/// AES-256-CBC with a zero IV and no padding, used only to unwrap the
/// intermediate key material in the UE/OE entries (ISO 32000-2 Algorithm
/// 2.A) — never for user-facing data.
pub fn unwrap_key_r6(intermediate_key: &[u8; 32], wrapped: &[u8; 32]) -> [u8; 32] {
    let iv = [0u8; 16];
    let cipher = Aes256CbcDecNoPad::new(intermediate_key.into(), &iv.into());
    let mut buf = *wrapped;
    cipher
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .expect("fixed-size zero-iv unwrap never fails padding validation");
    buf
}

/// Inverse of [`unwrap_key_r6`], used when generating fresh UE/OE entries
/// for an output document (§4.5 "Encryption application").
pub fn wrap_key_r6(intermediate_key: &[u8; 32], file_key: &[u8; 32]) -> [u8; 32] {
    let iv = [0u8; 16];
    let cipher = Aes256CbcEncNoPad::new(intermediate_key.into(), &iv.into());
    let mut buf = *file_key;
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, 32)
        .expect("fixed-size zero-iv wrap never fails");
    buf
}

/// AES-128-CBC, no padding, used for the inner round function of the
/// revision-6 iterative hash (Algorithm 2.B). Callers guarantee `data.len()`
/// is a multiple of 16 (the hash repeats its unit 64 times).
pub fn cbc_128_nopad_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let cipher = Aes128CbcEnc::new(key.into(), iv.into());
    let len = data.len();
    let mut buf = data.to_vec();
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .expect("caller-guaranteed block-aligned length")
        .to_vec()
}
