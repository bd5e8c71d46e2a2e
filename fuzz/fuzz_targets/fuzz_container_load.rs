#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use xkeystore::derivation::Pbkdf2Deriver;
use xkeystore::key_management::{container, ExtendedKeyStoreGenerator};
use xkeystore::platform::SoftwareCredentialStoreProvider;
use xkeystore::policy::SecretKeySpec;
use xkeystore::symmetric::AesGcmCipher;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic, whatever the archive contains
    let _ = container::read_container(&mut &data[..]);

    let generator = ExtendedKeyStoreGenerator::new(
        Arc::new(Pbkdf2Deriver::new(1, 16, 16).unwrap()),
        Arc::new(AesGcmCipher::new()),
        Arc::new(SoftwareCredentialStoreProvider::new()),
        SecretKeySpec::parse("AES_128").unwrap(),
    )
    .unwrap();

    if let Ok(mut store) = generator.load(&mut &data[..], "fuzz-container-password") {
        for alias in store.secret_key_aliases() {
            let _ = store.get_secret_key_entry(&alias, "fuzz-entry-password");
        }
        for alias in store.elgamal_private_key_aliases() {
            let _ = store.get_elgamal_private_key_entry(&alias, "fuzz-entry-password");
        }
        for alias in store.private_key_aliases() {
            let _ = store.get_private_key_entry(&alias, "fuzz-entry-password");
            let _ = store.get_certificate_chain(&alias);
        }
    }

    let _ = generator.format_key_store_to_json(&mut &data[..]);
});
