#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xkeystore::symmetric::{AesGcmCipher, AuthenticatedCipher, ChaCha20Poly1305Cipher};

#[derive(Arbitrary, Debug)]
struct SealedEntryInput {
    use_chacha: bool,
    key: [u8; 32],
    plaintext: Vec<u8>,
    forged: Vec<u8>,
}

fuzz_target!(|input: SealedEntryInput| {
    let cipher: Box<dyn AuthenticatedCipher> = if input.use_chacha {
        Box::new(ChaCha20Poly1305Cipher::new())
    } else {
        Box::new(AesGcmCipher::new())
    };

    // Arbitrary bytes must be rejected, not panic
    let _ = cipher.decrypt(&input.key, &input.forged);

    if let Ok(sealed) = cipher.encrypt(&input.key, &input.plaintext) {
        let opened = cipher.decrypt(&input.key, &sealed).unwrap();
        assert_eq!(opened.as_bytes(), &input.plaintext[..]);
    }
});
