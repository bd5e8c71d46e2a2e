use super::*;
use crate::error::error_codes;
use crate::keys::SecretKey;

const STORE_PW: &str = "store-password-0123456789";
const ENTRY_PW: &str = "entry-password-0123456789";

fn sample_key() -> PrivateKey {
    PrivateKey::new("RSA", &[0x30, 0x82, 0x01, 0x02, 0xAA, 0xBB])
}

fn sample_chain() -> Vec<Certificate> {
    vec![Certificate::new(b"leaf-cert"), Certificate::new(b"root-cert")]
}

#[test]
fn test_set_and_get_key_entry() {
    let mut store = SoftwareCredentialStore::new();
    store
        .set_key_entry("signer", &sample_key(), ENTRY_PW, &sample_chain())
        .unwrap();

    let key = store.get_key("signer", ENTRY_PW).unwrap().unwrap();
    assert_eq!(key, sample_key());
    assert_eq!(
        store.get_certificate_chain("signer").unwrap().unwrap(),
        sample_chain()
    );
    assert_eq!(store.aliases().unwrap(), vec!["signer".to_string()]);
    assert!(!store.is_symmetric_entry("signer").unwrap());
}

#[test]
fn test_missing_entry() {
    let store = SoftwareCredentialStore::new();
    assert!(store.get_key("nobody", ENTRY_PW).unwrap().is_none());
    assert!(store.get_certificate_chain("nobody").unwrap().is_none());
    assert!(!store.is_symmetric_entry("nobody").unwrap());
}

#[test]
fn test_wrong_entry_password() {
    let mut store = SoftwareCredentialStore::new();
    store
        .set_key_entry("signer", &sample_key(), ENTRY_PW, &sample_chain())
        .unwrap();

    let err = store.get_key("signer", "another-password-0123").unwrap_err();
    assert_eq!(err.error_code(), error_codes::ENTRY_RETRIEVAL_FAILED);
    assert!(matches!(err, crate::KeyStoreError::KeyStoreAccessError { .. }));
}

#[test]
fn test_replace_keeps_single_alias() {
    let mut store = SoftwareCredentialStore::new();
    store
        .set_key_entry("signer", &sample_key(), ENTRY_PW, &sample_chain())
        .unwrap();
    let replacement = PrivateKey::new("EC", &[1, 2, 3]);
    store
        .set_key_entry("signer", &replacement, ENTRY_PW, &[])
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get_key("signer", ENTRY_PW).unwrap().unwrap(), replacement);
}

#[test]
fn test_serialize_and_load() {
    let mut store = SoftwareCredentialStore::new();
    store
        .set_key_entry("first", &sample_key(), ENTRY_PW, &sample_chain())
        .unwrap();
    store
        .set_key_entry("second", &sample_key(), ENTRY_PW, &[])
        .unwrap();

    let bytes = store.serialize(STORE_PW).unwrap();

    let mut loaded = SoftwareCredentialStore::new();
    loaded.load(&bytes, STORE_PW).unwrap();
    assert_eq!(
        loaded.aliases().unwrap(),
        vec!["first".to_string(), "second".to_string()]
    );
    assert_eq!(loaded.get_key("first", ENTRY_PW).unwrap().unwrap(), sample_key());
}

#[test]
fn test_load_with_wrong_password() {
    let store = SoftwareCredentialStore::new();
    let bytes = store.serialize(STORE_PW).unwrap();

    let mut loaded = SoftwareCredentialStore::new();
    let err = loaded.load(&bytes, "not-the-store-password").unwrap_err();
    assert_eq!(err.error_code(), error_codes::STORE_LOAD_FAILED);
}

#[test]
fn test_load_garbage() {
    let mut loaded = SoftwareCredentialStore::new();
    assert!(loaded.load(b"definitely not a store", STORE_PW).is_err());
    assert!(loaded.load(&[], STORE_PW).is_err());
}

#[test]
fn test_symmetric_entries_are_classified() {
    let mut store = SoftwareCredentialStore::new();
    store
        .set_symmetric_entry("legacy", &SecretKey::new("AES", &[0u8; 16]), ENTRY_PW)
        .unwrap();

    assert!(store.is_symmetric_entry("legacy").unwrap());
    assert!(store.get_certificate_chain("legacy").unwrap().is_none());
    assert!(store.get_key("legacy", ENTRY_PW).is_err());
}

#[test]
fn test_provider_creates_empty_store() {
    let provider = SoftwareCredentialStoreProvider::new();
    assert_eq!(provider.kind(), SOFTWARE_STORE_KIND);

    let store = provider.create().unwrap();
    assert!(store.aliases().unwrap().is_empty());
}
