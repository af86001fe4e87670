use bitflags::bitflags;
use rand::RngCore;

use crate::config::EncryptionAlgorithm;
use crate::dictionary::Dictionary;
use crate::document::Document;
use crate::error::DecryptionError;
use crate::object::Object;
use crate::{Error, Result};

use super::{key, CryptMethod, EncryptionState, Role};

bitflags! {
    /// The `/P` permission bitmask (ISO 32000-1, Table 22). Bits not listed
    /// there are reserved and must be set to 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        const PRINT               = 1 << 2;
        const MODIFY              = 1 << 3;
        const COPY                = 1 << 4;
        const ANNOTATE            = 1 << 5;
        const FILL_FORMS          = 1 << 8;
        const EXTRACT_ACCESSIBLE  = 1 << 9;
        const ASSEMBLE            = 1 << 10;
        const PRINT_HIGH_QUALITY  = 1 << 11;
    }
}

/// Everything extracted from the `/Encrypt` dictionary needed to authenticate
/// a password and derive the file key, independent of which revision it is.
pub struct EncryptDictParams {
    pub version: i64,
    pub revision: u8,
    pub key_length_bytes: usize,
    pub owner_entry: Vec<u8>,
    pub user_entry: Vec<u8>,
    pub permissions: i32,
    pub file_id: Vec<u8>,
    pub encrypt_metadata: bool,
    pub stream_method: CryptMethod,
    pub string_method: CryptMethod,
    // Revision 5/6 only.
    pub owner_encrypted_key: Option<[u8; 32]>,
    pub user_encrypted_key: Option<[u8; 32]>,
}

/// Reads `/Encrypt` (already resolved into `document.objects` by the reader)
/// plus the trailer's `/ID` into a revision-agnostic parameter set.
pub fn read_encrypt_dict(document: &Document) -> Result<EncryptDictParams> {
    let encrypt_ref = document
        .trailer
        .get(b"Encrypt")
        .and_then(|o| o.as_reference())
        .map_err(|_| Error::Decryption(DecryptionError::EncryptionUnsupported))?;
    let encrypt = document
        .objects
        .get(&encrypt_ref)
        .ok_or(Error::Decryption(DecryptionError::EncryptionUnsupported))?
        .as_dict()?;

    let filter = encrypt.get(b"Filter").and_then(Object::as_name).unwrap_or(b"Standard");
    if filter != b"Standard" {
        return Err(Error::Decryption(DecryptionError::EncryptionUnsupported));
    }

    let version = encrypt.get(b"V").and_then(Object::as_i64).unwrap_or(0);
    let revision = encrypt.get(b"R").and_then(Object::as_i64).unwrap_or(2) as u8;
    let key_length_bits = encrypt.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
    let key_length_bytes = (key_length_bits / 8) as usize;

    let owner_entry = encrypt.get(b"O").and_then(Object::as_str)?.to_vec();
    let user_entry = encrypt.get(b"U").and_then(Object::as_str)?.to_vec();
    let permissions = encrypt.get(b"P").and_then(Object::as_i64).unwrap_or(-1) as i32;
    let encrypt_metadata = encrypt
        .get(b"EncryptMetadata")
        .and_then(Object::as_bool)
        .unwrap_or(true);

    let file_id = document
        .trailer
        .get(b"ID")
        .ok()
        .and_then(|o| o.as_array().ok())
        .and_then(|a| a.first())
        .and_then(|o| o.as_str().ok())
        .map(|s| s.to_vec())
        .unwrap_or_default();

    let (stream_method, string_method) = if version >= 4 {
        crypt_filter_methods(encrypt)?
    } else {
        (CryptMethod::Rc4, CryptMethod::Rc4)
    };

    let (owner_encrypted_key, user_encrypted_key) = if revision >= 5 {
        let oe = encrypt.get(b"OE").and_then(Object::as_str).ok().map(fixed32);
        let ue = encrypt.get(b"UE").and_then(Object::as_str).ok().map(fixed32);
        (oe.flatten(), ue.flatten())
    } else {
        (None, None)
    };

    Ok(EncryptDictParams {
        version,
        revision,
        key_length_bytes: if revision >= 5 { 32 } else { key_length_bytes.max(5) },
        owner_entry,
        user_entry,
        permissions,
        file_id,
        encrypt_metadata,
        stream_method,
        string_method,
        owner_encrypted_key,
        user_encrypted_key,
    })
}

fn fixed32(bytes: &[u8]) -> Option<[u8; 32]> {
    if bytes.len() != 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    Some(out)
}

fn fixed48(bytes: &[u8]) -> Option<[u8; 48]> {
    if bytes.len() != 48 {
        return None;
    }
    let mut out = [0u8; 48];
    out.copy_from_slice(bytes);
    Some(out)
}

/// Resolves `/StmF` and `/StrF` through `/CF` into concrete cipher choices.
/// `/Identity` (or an unnamed filter) leaves that content type unencrypted.
fn crypt_filter_methods(encrypt: &crate::dictionary::Dictionary) -> Result<(CryptMethod, CryptMethod)> {
    let cf = encrypt.get(b"CF").and_then(Object::as_dict).ok();

    let resolve = |name: &[u8]| -> CryptMethod {
        if name == b"Identity" {
            return CryptMethod::Identity;
        }
        let Some(cf) = cf else { return CryptMethod::Rc4 };
        let Ok(filter_dict) = cf.get(name).and_then(Object::as_dict) else {
            return CryptMethod::Rc4;
        };
        match filter_dict.get(b"CFM").and_then(Object::as_name).unwrap_or(b"V2") {
            b"AESV2" => CryptMethod::AesV2,
            b"AESV3" => CryptMethod::AesV3,
            b"None" => CryptMethod::Identity,
            _ => CryptMethod::Rc4,
        }
    };

    let stmf = encrypt.get(b"StmF").and_then(Object::as_name).unwrap_or(b"Identity");
    let strf = encrypt.get(b"StrF").and_then(Object::as_name).unwrap_or(b"Identity");
    Ok((resolve(stmf), resolve(strf)))
}

/// Tries the empty/owner/user password against `params` and, on success,
/// returns the derived [`EncryptionState`]. Tries the user password first
/// (the common case), then the owner password.
pub fn authenticate(params: &EncryptDictParams, password: &[u8]) -> Result<EncryptionState> {
    // Revision 5 is the withdrawn ISO 32000-2 draft hash (unsalted, no
    // SASLprep); only revision 6 is supported (§9).
    if params.revision == 5 {
        return Err(Error::Decryption(DecryptionError::EncryptionUnsupported));
    }
    if params.revision >= 5 {
        return authenticate_r5_r6(params, password);
    }
    authenticate_r2_r4(params, password)
}

fn authenticate_r2_r4(params: &EncryptDictParams, password: &[u8]) -> Result<EncryptionState> {
    let file_key = key::compute_encryption_key_r2_r4(&key::Revision2to4Params {
        password,
        owner_entry: &params.owner_entry,
        permissions: params.permissions,
        file_id: &params.file_id,
        revision: params.revision,
        key_length_bytes: params.key_length_bytes,
        encrypt_metadata: params.encrypt_metadata,
    });

    let computed_user = key::compute_user_entry_r2_r4(&file_key, params.revision, &params.file_id);
    let matches = if params.revision == 2 {
        computed_user == params.user_entry
    } else {
        computed_user[..16] == params.user_entry[..16.min(params.user_entry.len())]
    };

    if matches {
        return Ok(EncryptionState {
            file_key,
            revision: params.revision,
            stream_method: params.stream_method,
            string_method: params.string_method,
            role: Role::User,
            encrypt_metadata: params.encrypt_metadata,
        });
    }

    // Fall back to treating the supplied password as the owner password: recover
    // the user password it wraps (Algorithm 7) and re-derive from that.
    let recovered_user_password = key::compute_owner_key(password, &params.owner_entry, params.revision, params.key_length_bytes);
    let file_key = key::compute_encryption_key_r2_r4(&key::Revision2to4Params {
        password: &recovered_user_password,
        owner_entry: &params.owner_entry,
        permissions: params.permissions,
        file_id: &params.file_id,
        revision: params.revision,
        key_length_bytes: params.key_length_bytes,
        encrypt_metadata: params.encrypt_metadata,
    });
    let computed_user = key::compute_user_entry_r2_r4(&file_key, params.revision, &params.file_id);
    let matches = if params.revision == 2 {
        computed_user == params.user_entry
    } else {
        computed_user[..16] == params.user_entry[..16.min(params.user_entry.len())]
    };

    if matches {
        Ok(EncryptionState {
            file_key,
            revision: params.revision,
            stream_method: params.stream_method,
            string_method: params.string_method,
            role: Role::Owner,
            encrypt_metadata: params.encrypt_metadata,
        })
    } else {
        Err(Error::Decryption(DecryptionError::AuthenticationFailed))
    }
}

fn authenticate_r5_r6(params: &EncryptDictParams, password: &[u8]) -> Result<EncryptionState> {
    let user_entry = fixed48(&params.user_entry).ok_or(Error::Decryption(DecryptionError::EncryptionUnsupported))?;
    let owner_entry = fixed48(&params.owner_entry).ok_or(Error::Decryption(DecryptionError::EncryptionUnsupported))?;
    let ue = params.user_encrypted_key.ok_or(Error::Decryption(DecryptionError::EncryptionUnsupported))?;
    let oe = params.owner_encrypted_key.ok_or(Error::Decryption(DecryptionError::EncryptionUnsupported))?;
    let password = &key::normalize_r6_password(password);

    if key::verify_r6(password, &user_entry, &[]).is_ok() {
        let intermediate = key::intermediate_key_r6(password, &user_entry, &[]);
        let file_key = super::aes_cbc::unwrap_key_r6(&intermediate, &ue);
        return Ok(EncryptionState {
            file_key: file_key.to_vec(),
            revision: params.revision,
            stream_method: params.stream_method,
            string_method: params.string_method,
            role: Role::User,
            encrypt_metadata: params.encrypt_metadata,
        });
    }

    // Owner validation salt is hashed together with the 48-byte /U string.
    if key::verify_r6(password, &owner_entry, &params.user_entry).is_ok() {
        let intermediate = key::intermediate_key_r6(password, &owner_entry, &params.user_entry);
        let file_key = super::aes_cbc::unwrap_key_r6(&intermediate, &oe);
        return Ok(EncryptionState {
            file_key: file_key.to_vec(),
            revision: params.revision,
            stream_method: params.stream_method,
            string_method: params.string_method,
            role: Role::Owner,
            encrypt_metadata: params.encrypt_metadata,
        });
    }

    Err(Error::Decryption(DecryptionError::AuthenticationFailed))
}

/// Builds a fresh `/Encrypt` dictionary and the matching file-key state for
/// a document being saved with encryption enabled (§4.5). An empty owner
/// password falls back to the user password, as most writers do.
pub fn build_encrypt_dict(
    algorithm: EncryptionAlgorithm, permissions: Permissions, user_password: &[u8], owner_password: &[u8], file_id: &[u8],
) -> (Dictionary, EncryptionState) {
    let owner_password = if owner_password.is_empty() { user_password } else { owner_password };
    let p = (permissions.bits() | !Permissions::all().bits()) as i32;

    match algorithm {
        EncryptionAlgorithm::Aes256 => build_r6(p, user_password, owner_password),
        _ => build_r2_r4(algorithm, p, user_password, owner_password, file_id),
    }
}

fn build_r2_r4(
    algorithm: EncryptionAlgorithm, permissions: i32, user_password: &[u8], owner_password: &[u8], file_id: &[u8],
) -> (Dictionary, EncryptionState) {
    let (version, revision, key_length_bytes, method) = match algorithm {
        EncryptionAlgorithm::Rc4 => (2i64, 3u8, 16usize, CryptMethod::Rc4),
        EncryptionAlgorithm::Aes128 => (4i64, 4u8, 16usize, CryptMethod::AesV2),
        EncryptionAlgorithm::Aes256 => unreachable!("handled by build_r6"),
    };

    let owner_entry = key::compute_owner_key(owner_password, user_password, revision, key_length_bytes);
    let file_key = key::compute_encryption_key_r2_r4(&key::Revision2to4Params {
        password: user_password,
        owner_entry: &owner_entry,
        permissions,
        file_id,
        revision,
        key_length_bytes,
        encrypt_metadata: true,
    });
    let user_entry = key::compute_user_entry_r2_r4(&file_key, revision, file_id);

    let mut dict = Dictionary::new();
    dict.set("Filter", Object::Name(b"Standard".to_vec()));
    dict.set("V", Object::Integer(version));
    dict.set("R", Object::Integer(revision as i64));
    dict.set("O", Object::string_literal(owner_entry));
    dict.set("U", Object::string_literal(user_entry));
    dict.set("P", Object::Integer(permissions as i64));
    dict.set("Length", Object::Integer((key_length_bytes * 8) as i64));

    if version >= 4 {
        let cf_entry = crate::dictionary! {
            "CFM" => "AESV2",
            "AuthEvent" => "DocOpen",
            "Length" => Object::Integer(16),
        };
        let cf = crate::dictionary! { "StdCF" => Object::Dictionary(cf_entry) };
        dict.set("CF", Object::Dictionary(cf));
        dict.set("StmF", Object::Name(b"StdCF".to_vec()));
        dict.set("StrF", Object::Name(b"StdCF".to_vec()));
    }

    let state = EncryptionState {
        file_key,
        revision,
        stream_method: method,
        string_method: method,
        role: Role::Owner,
        encrypt_metadata: true,
    };
    (dict, state)
}

fn build_r6(permissions: i32, user_password: &[u8], owner_password: &[u8]) -> (Dictionary, EncryptionState) {
    let user_password = &key::normalize_r6_password(user_password);
    let owner_password = &key::normalize_r6_password(owner_password);
    let mut file_key = [0u8; 32];
    rand::rng().fill_bytes(&mut file_key);

    let mut user_validation_salt = [0u8; 8];
    let mut user_key_salt = [0u8; 8];
    rand::rng().fill_bytes(&mut user_validation_salt);
    rand::rng().fill_bytes(&mut user_key_salt);

    let user_hash = key::hash_r6(user_password, &user_validation_salt, &[]);
    let mut user_entry = [0u8; 48];
    user_entry[..32].copy_from_slice(&user_hash);
    user_entry[32..40].copy_from_slice(&user_validation_salt);
    user_entry[40..48].copy_from_slice(&user_key_salt);

    let user_intermediate = key::hash_r6(user_password, &user_key_salt, &[]);
    let user_encrypted_key = super::aes_cbc::wrap_key_r6(&user_intermediate, &file_key);

    let mut owner_validation_salt = [0u8; 8];
    let mut owner_key_salt = [0u8; 8];
    rand::rng().fill_bytes(&mut owner_validation_salt);
    rand::rng().fill_bytes(&mut owner_key_salt);

    let owner_hash = key::hash_r6(owner_password, &owner_validation_salt, &user_entry);
    let mut owner_entry = [0u8; 48];
    owner_entry[..32].copy_from_slice(&owner_hash);
    owner_entry[32..40].copy_from_slice(&owner_validation_salt);
    owner_entry[40..48].copy_from_slice(&owner_key_salt);

    let owner_intermediate = key::hash_r6(owner_password, &owner_key_salt, &user_entry);
    let owner_encrypted_key = super::aes_cbc::wrap_key_r6(&owner_intermediate, &file_key);

    let mut dict = Dictionary::new();
    dict.set("Filter", Object::Name(b"Standard".to_vec()));
    dict.set("V", Object::Integer(5));
    dict.set("R", Object::Integer(6));
    dict.set("O", Object::string_literal(owner_entry.to_vec()));
    dict.set("U", Object::string_literal(user_entry.to_vec()));
    dict.set("OE", Object::string_literal(owner_encrypted_key.to_vec()));
    dict.set("UE", Object::string_literal(user_encrypted_key.to_vec()));
    dict.set("P", Object::Integer(permissions as i64));
    dict.set("Length", Object::Integer(256));
    dict.set("EncryptMetadata", Object::Boolean(true));

    let cf_entry = crate::dictionary! {
        "CFM" => "AESV3",
        "AuthEvent" => "DocOpen",
        "Length" => Object::Integer(32),
    };
    let cf = crate::dictionary! { "StdCF" => Object::Dictionary(cf_entry) };
    dict.set("CF", Object::Dictionary(cf));
    dict.set("StmF", Object::Name(b"StdCF".to_vec()));
    dict.set("StrF", Object::Name(b"StdCF".to_vec()));

    let state = EncryptionState {
        file_key: file_key.to_vec(),
        revision: 6,
        stream_method: CryptMethod::AesV3,
        string_method: CryptMethod::AesV3,
        role: Role::Owner,
        encrypt_metadata: true,
    };
    (dict, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r2_r4_round_trips_through_authenticate() {
        let (dict, _) = build_encrypt_dict(EncryptionAlgorithm::Aes128, Permissions::PRINT | Permissions::COPY, b"user-pw", b"owner-pw", b"0123456789abcdef");

        let mut document = Document::new();
        let file_id = Object::string_literal(*b"0123456789abcdef");
        document.trailer.set("ID", Object::Array(vec![file_id.clone(), file_id]));
        let encrypt_id = document.add_object(Object::Dictionary(dict));
        document.trailer.set("Encrypt", Object::Reference(encrypt_id));

        let params = read_encrypt_dict(&document).unwrap();
        let state = authenticate(&params, b"user-pw").unwrap();
        assert_eq!(state.role(), Role::User);
    }

    #[test]
    fn r6_round_trips_through_authenticate() {
        let (dict, _) = build_encrypt_dict(EncryptionAlgorithm::Aes256, Permissions::all(), b"user-pw", b"owner-pw", b"");

        let mut document = Document::new();
        let encrypt_id = document.add_object(Object::Dictionary(dict));
        document.trailer.set("Encrypt", Object::Reference(encrypt_id));

        let params = read_encrypt_dict(&document).unwrap();
        let user_result = authenticate(&params, b"user-pw").unwrap();
        assert_eq!(user_result.role(), Role::User);
        let owner_result = authenticate(&params, b"owner-pw").unwrap();
        assert_eq!(owner_result.role(), Role::Owner);
    }
}
