mod common;

use pdfcore::{Document, EncryptionAlgorithm, EncryptionOptions, EncryptionState, Permissions, Role, SaveOptions};

/// S3: RC4-128 encrypted output authenticates correctly as both roles and
/// rejects a wrong password; re-encrypting under new credentials preserves
/// page count and authenticates under the new user password.
#[test]
fn authenticates_roles_and_rejects_wrong_password() {
    let mut document = common::single_page_document();
    let options = SaveOptions::builder()
        .encrypt_with(EncryptionOptions {
            algorithm: EncryptionAlgorithm::Rc4,
            permissions: Permissions::PRINT,
            user_password: "u".to_string(),
            owner_password: "o".to_string(),
        })
        .build();

    let mut buffer = Vec::new();
    document.save_with_options(&mut buffer, options).unwrap();

    let loaded_as_user = Document::load_mem_with_password(&buffer, "u").unwrap();
    let state_as_user = EncryptionState::decode(&loaded_as_user, "u").unwrap();
    assert_eq!(state_as_user.role(), Role::User);

    let state_as_owner = EncryptionState::decode(&loaded_as_user, "o").unwrap();
    assert_eq!(state_as_owner.role(), Role::Owner);

    assert!(EncryptionState::decode(&loaded_as_user, "x").is_err());
}

/// Property 4: decrypting and re-encrypting under new credentials round-trips
/// page count (a proxy for content, since this crate has no text-extraction
/// surface to compare byte-for-byte page content against).
#[test]
fn re_encrypting_under_new_credentials_preserves_page_count() {
    let mut document = common::single_page_document();
    let original_page_count = document.get_pages().unwrap().len();

    let first_pass = SaveOptions::builder()
        .encrypt_with(EncryptionOptions {
            algorithm: EncryptionAlgorithm::Aes128,
            permissions: Permissions::all(),
            user_password: "u".to_string(),
            owner_password: "o".to_string(),
        })
        .build();
    let mut first_bytes = Vec::new();
    document.save_with_options(&mut first_bytes, first_pass).unwrap();

    let mut reloaded = Document::load_mem_with_password(&first_bytes, "u").unwrap();
    assert_eq!(reloaded.get_pages().unwrap().len(), original_page_count);

    let second_pass = SaveOptions::builder()
        .encrypt_with(EncryptionOptions {
            algorithm: EncryptionAlgorithm::Aes256,
            permissions: Permissions::all(),
            user_password: "u2".to_string(),
            owner_password: "o2".to_string(),
        })
        .build();
    let mut second_bytes = Vec::new();
    reloaded.save_with_options(&mut second_bytes, second_pass).unwrap();

    let final_document = Document::load_mem_with_password(&second_bytes, "u2").unwrap();
    assert_eq!(final_document.get_pages().unwrap().len(), original_page_count);
}
