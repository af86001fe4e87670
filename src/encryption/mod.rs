//! Standard security handler (ISO 32000-1 §7.6, ISO 32000-2 §7.6): password
//! authentication, file-key derivation, and per-object RC4/AES encryption of
//! string and stream content.

mod aes_cbc;
mod key;
mod pkcs5;
mod rc4;
mod standard_handler;

use md5::{Digest, Md5};

use crate::dictionary::Dictionary;
use crate::document::Document;
use crate::error::DecryptionError;
use crate::object::Object;
use crate::{ObjectId, Result};

pub use standard_handler::{EncryptDictParams, Permissions};

/// Which cipher a crypt filter (`/StmF`, `/StrF`, or an entry in `/CF`) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    /// No encryption applied to this content stream/string (`/Identity`).
    Identity,
    Rc4,
    AesV2,
    AesV3,
}

/// The authenticated role a password satisfied: user or owner. Some
/// permission bits only take effect for `Role::User`; the owner password
/// always grants full access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Owner,
}

/// The result of successfully authenticating against a document's
/// `/Encrypt` dictionary: the derived file encryption key plus enough of the
/// dictionary's parameters to decrypt/encrypt individual objects.
#[derive(Debug, Clone)]
pub struct EncryptionState {
    pub(crate) file_key: Vec<u8>,
    pub(crate) revision: u8,
    pub(crate) stream_method: CryptMethod,
    pub(crate) string_method: CryptMethod,
    pub(crate) role: Role,
    pub(crate) encrypt_metadata: bool,
}

impl EncryptionState {
    /// Authenticates `password` against the document's `/Encrypt` dictionary
    /// (which the reader has already resolved into `document.objects`) and
    /// derives the file encryption key on success.
    pub fn decode(document: &Document, password: &str) -> Result<Self> {
        let params = standard_handler::read_encrypt_dict(document)?;
        standard_handler::authenticate(&params, password.as_bytes())
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Builds a fresh `/Encrypt` dictionary and matching [`EncryptionState`] for
/// a document about to be saved with encryption enabled, from an algorithm
/// choice, a permission set, and a user/owner password pair.
pub fn build_encryption(
    algorithm: crate::config::EncryptionAlgorithm,
    permissions: Permissions,
    user_password: &str,
    owner_password: &str,
    file_id: &[u8],
) -> (Dictionary, EncryptionState) {
    standard_handler::build_encrypt_dict(algorithm, permissions, user_password.as_bytes(), owner_password.as_bytes(), file_id)
}

/// Derives the per-object key used for RC4/AESV2 (ISO 32000-1, Algorithm 1).
/// V5/R6 (AESV3) uses the file key directly and never calls this.
fn object_key(file_key: &[u8], id: ObjectId, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update((id.0 as u32).to_le_bytes()[..3].to_vec());
    hasher.update((id.1 as u16).to_le_bytes());
    if aes {
        hasher.update(b"sAlT");
    }
    let digest = hasher.finalize();
    let len = (file_key.len() + 5).min(16);
    digest[..len].to_vec()
}

fn cipher_for(state: &EncryptionState, method: CryptMethod, id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
    match method {
        CryptMethod::Identity => Ok(data.to_vec()),
        CryptMethod::Rc4 => {
            let key = object_key(&state.file_key, id, false);
            Ok(rc4::apply(&key, data))
        }
        CryptMethod::AesV2 => {
            let key = object_key(&state.file_key, id, true);
            aes_cbc::decrypt_128(&key, data)
        }
        CryptMethod::AesV3 => aes_cbc::decrypt_256(&state.file_key, data),
    }
}

fn encipher_for(state: &EncryptionState, method: CryptMethod, id: ObjectId, data: &[u8]) -> Vec<u8> {
    match method {
        CryptMethod::Identity => data.to_vec(),
        CryptMethod::Rc4 => {
            let key = object_key(&state.file_key, id, false);
            rc4::apply(&key, data)
        }
        CryptMethod::AesV2 => {
            let key = object_key(&state.file_key, id, true);
            aes_cbc::encrypt_128(&key, data)
        }
        CryptMethod::AesV3 => aes_cbc::encrypt_256(&state.file_key, data),
    }
}

/// Decrypts every string and the stream payload (if any) reachable from
/// `obj` in place, recursing through arrays and dictionaries. Called once
/// per top-level indirect object right after it is parsed.
pub fn decrypt_object(state: &EncryptionState, id: ObjectId, obj: &mut Object) -> std::result::Result<(), DecryptionError> {
    transform_object(state, id, obj, false).map_err(|_| DecryptionError::InvalidCiphertext)
}

/// Inverse of [`decrypt_object`], used by the writer when emitting an
/// encrypted output document.
pub fn encrypt_object(state: &EncryptionState, id: ObjectId, obj: &mut Object) {
    let _ = transform_object(state, id, obj, true);
}

fn transform_object(state: &EncryptionState, id: ObjectId, obj: &mut Object, encrypting: bool) -> Result<()> {
    match obj {
        Object::String(bytes, _) => {
            *bytes = apply_one(state, state.string_method, id, bytes, encrypting)?;
        }
        Object::Array(items) => {
            for item in items {
                transform_object(state, id, item, encrypting)?;
            }
        }
        Object::Dictionary(dict) => transform_dict(state, id, dict, encrypting)?,
        Object::Stream(stream) => {
            transform_dict(state, id, &mut stream.dict, encrypting)?;
            if !is_crypt_identity(&stream.dict) {
                let transformed = apply_one(state, state.stream_method, id, &stream.content, encrypting)?;
                stream.set_encryption_transformed_content(transformed);
            }
        }
        _ => {}
    }
    Ok(())
}

fn transform_dict(state: &EncryptionState, id: ObjectId, dict: &mut Dictionary, encrypting: bool) -> Result<()> {
    for (_, value) in dict.iter_mut() {
        transform_object(state, id, value, encrypting)?;
    }
    Ok(())
}

fn apply_one(state: &EncryptionState, method: CryptMethod, id: ObjectId, data: &[u8], encrypting: bool) -> Result<Vec<u8>> {
    if encrypting {
        Ok(encipher_for(state, method, id, data))
    } else {
        cipher_for(state, method, id, data)
    }
}

/// A stream's `/Filter` chain can name `/Crypt` with `/Name /Identity` to opt
/// that single stream out of document-wide encryption (e.g. cross-reference
/// streams, which must stay readable before the key is known).
fn is_crypt_identity(dict: &Dictionary) -> bool {
    let Some(decode_parms) = dict.get(b"DecodeParms") else { return false };
    let check = |d: &Object| -> bool {
        d.as_dict()
            .ok()
            .and_then(|d| d.get(b"Name").ok())
            .and_then(|n| n.as_name().ok())
            .map(|n| n == b"Identity")
            .unwrap_or(false)
    };
    match decode_parms {
        Object::Dictionary(_) => check(decode_parms),
        Object::Array(items) => items.iter().any(check),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(method: CryptMethod) -> EncryptionState {
        EncryptionState {
            file_key: vec![0x11; 16],
            revision: 4,
            stream_method: method,
            string_method: method,
            role: Role::User,
            encrypt_metadata: true,
        }
    }

    #[test]
    fn rc4_object_round_trips_through_transform_object() {
        let state = state(CryptMethod::Rc4);
        let mut obj = Object::string_literal(*b"hello world");
        encrypt_object(&state, (7, 0), &mut obj);
        assert_ne!(obj.as_str().unwrap(), b"hello world");
        decrypt_object(&state, (7, 0), &mut obj).unwrap();
        assert_eq!(obj.as_str().unwrap(), b"hello world");
    }

    #[test]
    fn aesv2_stream_round_trips() {
        let state = state(CryptMethod::AesV2);
        let stream = crate::stream::Stream::new(Dictionary::new(), b"stream payload bytes".to_vec());
        let mut obj = Object::Stream(stream);
        encrypt_object(&state, (3, 0), &mut obj);
        decrypt_object(&state, (3, 0), &mut obj).unwrap();
        assert_eq!(obj.as_stream().unwrap().content, b"stream payload bytes");
    }

    #[test]
    fn object_key_differs_per_object_id() {
        let key_a = object_key(&[0xaa; 16], (1, 0), false);
        let key_b = object_key(&[0xaa; 16], (2, 0), false);
        assert_ne!(key_a, key_b);
    }
}
