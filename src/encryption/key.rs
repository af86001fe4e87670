use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};
use stringprep::saslprep;

use crate::error::DecryptionError;
use crate::Result;

/// Normalises a revision-6 password per ISO 32000-2 7.6.4.3.3: SASLprep the
/// UTF-8 password, falling back to the raw bytes unchanged when the input
/// isn't valid UTF-8 or SASLprep rejects it, then keep only the first 127
/// bytes of the result.
pub fn normalize_r6_password(password: &[u8]) -> Vec<u8> {
    let normalized = std::str::from_utf8(password)
        .ok()
        .and_then(|s| saslprep(s).ok())
        .map(|s| s.into_owned().into_bytes())
        .unwrap_or_else(|| password.to_vec());
    normalized.into_iter().take(127).collect()
}

/// The 32-byte padding string used to pad/truncate passwords to exactly 32
/// bytes before they enter Algorithm 2 (ISO 32000-1, 7.6.3.3).
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pads or truncates a password to 32 bytes per the padding algorithm.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = password.len().min(32);
    out[..n].copy_from_slice(&password[..n]);
    out[n..].copy_from_slice(&PADDING[..32 - n]);
    out
}

pub struct Revision2to4Params<'a> {
    pub password: &'a [u8],
    pub owner_entry: &'a [u8],
    pub permissions: i32,
    pub file_id: &'a [u8],
    pub revision: u8,
    pub key_length_bytes: usize,
    pub encrypt_metadata: bool,
}

/// Algorithm 2 (ISO 32000-1, 7.6.3.3): computes the file encryption key for
/// R2-R4 from the user password.
pub fn compute_encryption_key_r2_r4(params: &Revision2to4Params) -> Vec<u8> {
    let padded = pad_password(params.password);

    let mut hasher = Md5::new();
    hasher.update(padded);
    hasher.update(params.owner_entry);
    hasher.update(params.permissions.to_le_bytes());
    hasher.update(params.file_id);
    if params.revision >= 4 && !params.encrypt_metadata {
        hasher.update([0xff, 0xff, 0xff, 0xff]);
    }
    let mut digest = hasher.finalize().to_vec();

    if params.revision >= 3 {
        for _ in 0..50 {
            digest = Md5::digest(&digest[..params.key_length_bytes]).to_vec();
        }
    }

    digest.truncate(params.key_length_bytes);
    digest
}

/// Algorithm 3 (owner password entry /O): derives the RC4 key that wraps the
/// padded user password, from the padded owner password.
pub fn compute_owner_key(
    owner_password: &[u8],
    user_password_padded_or_plain: &[u8],
    revision: u8,
    key_length_bytes: usize,
) -> Vec<u8> {
    let padded_owner = pad_password(owner_password);
    let mut digest = Md5::digest(padded_owner).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            digest = Md5::digest(&digest).to_vec();
        }
    }
    let rc4_key = &digest[..key_length_bytes];

    let padded_user = pad_password(user_password_padded_or_plain);
    let mut data = padded_user.to_vec();
    if revision == 2 {
        data = super::rc4::apply(rc4_key, &data);
    } else {
        for i in 0..20u8 {
            let round_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
            data = super::rc4::apply(&round_key, &data);
        }
    }
    data
}

/// Algorithm 4/5 (ISO 32000-1, 7.6.3.4): computes the /U entry so it can be
/// compared against the value stored in the document during authentication.
pub fn compute_user_entry_r2_r4(file_key: &[u8], revision: u8, file_id: &[u8]) -> Vec<u8> {
    if revision == 2 {
        return super::rc4::apply(file_key, &PADDING);
    }

    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let mut data = hasher.finalize().to_vec();

    data = super::rc4::apply(file_key, &data);
    for i in 1u8..=19 {
        let round_key: Vec<u8> = file_key.iter().map(|b| b ^ i).collect();
        data = super::rc4::apply(&round_key, &data);
    }
    data.resize(32, 0);
    data
}

/// Algorithm 2.B (ISO 32000-2, 7.6.4.3.4): iterative SHA-2 hash used by
/// revision 6 to validate passwords and derive the intermediate key. `salt`
/// is the validation or key salt taken from the tail of /U or /O; `udata` is
/// empty for the user path and the 48-byte /U value for the owner path.
pub fn hash_r6(password: &[u8], salt: &[u8], udata: &[u8]) -> [u8; 32] {
    let mut k: Vec<u8> = {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(udata);
        hasher.finalize().to_vec()
    };

    let mut round = 0usize;
    loop {
        let mut k1 = Vec::with_capacity(64 * (password.len() + k.len() + udata.len()));
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(udata);
        }

        let e = super::aes_cbc::cbc_128_nopad_encrypt(&k[..16], &k[16..32], &k1);

        let modulus: u32 = e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
        k = match modulus {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        if round >= 64 && (*e.last().unwrap() as usize) <= round - 32 {
            break;
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&k[..32]);
    out
}

/// Verifies a candidate password against revision 6's /U or /O validation
/// salt, returning `Ok(())` only on a match.
pub fn verify_r6(password: &[u8], stored: &[u8; 48], udata: &[u8]) -> Result<()> {
    let validation_salt = &stored[32..40];
    let expect = &stored[0..32];
    let got = hash_r6(password, validation_salt, udata);
    if got[..] == expect[..] {
        Ok(())
    } else {
        Err(DecryptionError::AuthenticationFailed.into())
    }
}

/// Derives the intermediate key from a revision-6 password and key salt,
/// used to unwrap UE/OE into the file encryption key.
pub fn intermediate_key_r6(password: &[u8], stored: &[u8; 48], udata: &[u8]) -> [u8; 32] {
    let key_salt = &stored[40..48];
    hash_r6(password, key_salt, udata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_password_is_always_32_bytes() {
        assert_eq!(pad_password(b"").len(), 32);
        assert_eq!(pad_password(b"a password longer than 32 bytes!!!!").len(), 32);
        assert_eq!(pad_password(b"secret"), {
            let mut expect = [0u8; 32];
            expect[..6].copy_from_slice(b"secret");
            expect[6..].copy_from_slice(&PADDING[..26]);
            expect
        });
    }

    #[test]
    fn r4_owner_key_recovers_padded_user_password() {
        // Algorithm 3 followed by its own inverse (Algorithm 7 style rc4-xor
        // loop run in reverse key order) must return the original input.
        let owner_key_digest = {
            let mut digest = Md5::digest(pad_password(b"owner")).to_vec();
            for _ in 0..50 {
                digest = Md5::digest(&digest).to_vec();
            }
            digest
        };
        let rc4_key = &owner_key_digest[..16];

        let expected_padded_user = pad_password(b"user-password");
        let wrapped = compute_owner_key(b"owner", b"user-password", 4, 16);

        let mut data = wrapped;
        for i in (0..20u8).rev() {
            let round_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
            data = super::super::rc4::apply(&round_key, &data);
        }
        assert_eq!(&data[..], &expected_padded_user[..]);
    }

    #[test]
    fn encryption_key_is_deterministic() {
        let params = Revision2to4Params {
            password: b"",
            owner_entry: &[0u8; 32],
            permissions: -4,
            file_id: b"abcd1234",
            revision: 3,
            key_length_bytes: 16,
            encrypt_metadata: true,
        };
        let key_a = compute_encryption_key_r2_r4(&params);
        let key_b = compute_encryption_key_r2_r4(&params);
        assert_eq!(key_a, key_b);
        assert_eq!(key_a.len(), 16);
    }
}
