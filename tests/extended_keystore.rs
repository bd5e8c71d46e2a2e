// End-to-end tests for the extended key store
// Stores are built from a cheap PBKDF2 policy so the suite runs quickly

use std::fs::File;
use std::io::{BufReader, BufWriter};

use xkeystore::error::error_codes;
use xkeystore::prelude::*;

const FAST_POLICY: &str = "
# low iteration count for tests only
extended.keystore.p12=SOFTWARE_V1
primitives.pbkdfderivation.p12=PBKDF2_10_SHA256_256_KL128
symmetric.encryptionsecretkey=AES_128
symmetric.cipher=AES_WITH_GCM_AND_NOPADDING_96_128
";

const ENTRY_PW: &str = "0123456789ABCDEF";
const STORE_PW: &str = "container-pw-0123456789012345";

fn generator() -> ExtendedKeyStoreGenerator {
    let policy = ExtendedKeyStorePolicy::from_properties_str(FAST_POLICY).unwrap();
    ExtendedKeyStoreGenerator::from_policy(&policy).unwrap()
}

fn elgamal_key() -> ElGamalPrivateKey {
    let group = ZpSubgroup::new(&[0x03], &[0x00, 0xE3], &[0x71]);
    ElGamalPrivateKey::new(vec![vec![0x05], vec![0x2A], vec![0x0F]], group).unwrap()
}

#[test]
fn test_secret_key_scenario() {
    let generator = generator();
    let mut store = generator.create().unwrap();
    let key = SecretKey::new("AES", &[0u8; 16]);

    store.set_secret_key_entry("k1", &key, ENTRY_PW).unwrap();
    let recovered = store.get_secret_key_entry("k1", ENTRY_PW).unwrap().unwrap();
    assert_eq!(recovered.encoded(), key.encoded());

    let err = store.get_secret_key_entry("k1", "FEDCBA9876543210").unwrap_err();
    assert!(err.is_tamper());
}

#[test]
fn test_mixed_entries_survive_store_and_load() {
    let generator = generator();
    let mut store = generator.create().unwrap();
    let chain = vec![Certificate::new(b"leaf-cert"), Certificate::new(b"ca-cert")];
    let private_key = PrivateKey::new("EC", &[0x30, 0x41, 0x02, 0x01]);

    store
        .set_secret_key_entry("wrap", &SecretKey::new("AES", &[5u8; 16]), ENTRY_PW)
        .unwrap();
    store.set_elgamal_private_key_entry("eg", &elgamal_key(), ENTRY_PW).unwrap();
    store
        .set_private_key_entry("signing", &private_key, ENTRY_PW, &chain)
        .unwrap();

    let mut container = Vec::new();
    store.store(&mut container, STORE_PW).unwrap();

    let mut loaded = generator.load(&mut container.as_slice(), STORE_PW).unwrap();
    assert_eq!(loaded.secret_key_aliases(), vec!["wrap".to_string()]);
    assert_eq!(loaded.elgamal_private_key_aliases(), vec!["eg".to_string()]);
    assert_eq!(loaded.private_key_aliases(), vec!["signing".to_string()]);

    assert_eq!(
        loaded.get_secret_key_entry("wrap", ENTRY_PW).unwrap().unwrap().encoded(),
        &[5u8; 16]
    );
    assert_eq!(
        loaded.get_elgamal_private_key_entry("eg", ENTRY_PW).unwrap().unwrap(),
        elgamal_key()
    );
    assert_eq!(
        loaded.get_private_key_entry("signing", ENTRY_PW).unwrap().unwrap(),
        private_key
    );
    assert_eq!(loaded.get_certificate_chain("signing").unwrap().unwrap(), chain);
}

#[test]
fn test_on_disk_round_trip() {
    let generator = generator();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.zip");

    let mut store = generator.create().unwrap();
    store
        .set_secret_key_entry("k1", &SecretKey::new("AES", &[9u8; 16]), ENTRY_PW)
        .unwrap();
    {
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        store.store(&mut writer, STORE_PW).unwrap();
    }

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let mut loaded = generator.load(&mut reader, STORE_PW).unwrap();
    assert_eq!(
        loaded.get_secret_key_entry("k1", ENTRY_PW).unwrap().unwrap().encoded(),
        &[9u8; 16]
    );
}

#[test]
fn test_wrong_container_password() {
    let generator = generator();
    let mut store = generator.create().unwrap();
    let mut container = Vec::new();
    store.store(&mut container, STORE_PW).unwrap();

    let err = generator
        .load(&mut container.as_slice(), "not-the-container-password")
        .unwrap_err();
    assert!(matches!(err, KeyStoreError::KeyStoreAccessError { .. }));
    assert!(!err.is_tamper());
}

#[test]
fn test_json_round_trip_matches_binary() {
    let generator = generator();
    let mut store = generator.create().unwrap();
    store.set_elgamal_private_key_entry("eg", &elgamal_key(), ENTRY_PW).unwrap();

    let json = store.to_json(STORE_PW).unwrap();
    let mut from_json = generator.load_from_json(&json, STORE_PW).unwrap();
    assert_eq!(from_json.salt(), store.salt());
    assert_eq!(
        from_json.get_elgamal_private_key_entry("eg", ENTRY_PW).unwrap().unwrap(),
        elgamal_key()
    );
}

#[test]
fn test_password_bounds_come_from_policy() {
    let text = format!(
        "{}\nprimitives.pbkdfderivation.minpasswordlength=4\nprimitives.pbkdfderivation.maxpasswordlength=8\n",
        FAST_POLICY
    );
    let policy = ExtendedKeyStorePolicy::from_properties_str(&text).unwrap();
    let generator = ExtendedKeyStoreGenerator::from_policy(&policy).unwrap();
    let mut store = generator.create().unwrap();
    let key = SecretKey::new("AES", &[1u8; 16]);

    store.set_secret_key_entry("k1", &key, "short").unwrap();
    let err = store.set_secret_key_entry("k2", &key, ENTRY_PW).unwrap_err();
    assert_eq!(err.error_code(), error_codes::INVALID_PASSWORD);
}

#[test]
fn test_chacha_and_aes256_policy() {
    let policy = ExtendedKeyStorePolicy::from_properties_str(
        "primitives.pbkdfderivation.p12=PBKDF2_10_SHA256_128_KL256\n\
         symmetric.encryptionsecretkey=AES_256\n\
         symmetric.cipher=CHACHA20_POLY1305_96_128\n",
    )
    .unwrap();
    let generator = ExtendedKeyStoreGenerator::from_policy(&policy).unwrap();
    let mut store = generator.create().unwrap();
    assert_eq!(store.salt().len(), 16);

    store
        .set_secret_key_entry("k1", &SecretKey::new("AES", &[2u8; 32]), ENTRY_PW)
        .unwrap();
    let recovered = store.get_secret_key_entry("k1", ENTRY_PW).unwrap().unwrap();
    assert_eq!(recovered.encoded(), &[2u8; 32]);
}

#[test]
fn test_inconsistent_policy_is_rejected() {
    let err = ExtendedKeyStorePolicy::from_properties_str(
        "primitives.pbkdfderivation.p12=PBKDF2_10_SHA256_256_KL128\n\
         symmetric.encryptionsecretkey=AES_256\n",
    )
    .unwrap_err();
    assert_eq!(err.error_code(), error_codes::INCONSISTENT_POLICY);
}
