use super::*;

fn ciphers() -> Vec<(Box<dyn AuthenticatedCipher>, usize)> {
    vec![
        (Box::new(AesGcmCipher::new()), 16),
        (Box::new(AesGcmCipher::new()), 32),
        (Box::new(ChaCha20Poly1305Cipher::new()), 32),
    ]
}

#[test]
fn test_encrypt_decrypt() {
    for (cipher, key_len) in ciphers() {
        let key = random_bytes(key_len).unwrap();
        let plaintext = b"This is a test message for authenticated encryption";

        let sealed = cipher.encrypt(&key, plaintext).unwrap();

        // IV ‖ ciphertext ‖ tag
        assert_eq!(sealed.len(), IV_LENGTH + plaintext.len() + TAG_LENGTH);
        assert_ne!(&sealed[IV_LENGTH..IV_LENGTH + plaintext.len()], &plaintext[..]);

        let opened = cipher.decrypt(&key, &sealed).unwrap();
        assert_eq!(opened.as_bytes(), &plaintext[..], "{}", cipher.name());
    }
}

#[test]
fn test_empty_plaintext() {
    let cipher = AesGcmCipher::new();
    let key = random_bytes(16).unwrap();

    let sealed = cipher.encrypt(&key, b"").unwrap();
    assert_eq!(sealed.len(), IV_LENGTH + TAG_LENGTH);
    assert!(cipher.decrypt(&key, &sealed).unwrap().is_empty());
}

#[test]
fn test_fresh_iv_per_encryption() {
    let cipher = AesGcmCipher::new();
    let key = random_bytes(16).unwrap();

    let a = cipher.encrypt(&key, b"same input").unwrap();
    let b = cipher.encrypt(&key, b"same input").unwrap();
    assert_ne!(a[..IV_LENGTH], b[..IV_LENGTH]);
    assert_ne!(a, b);
}

#[test]
fn test_tampering_detection() {
    for (cipher, key_len) in ciphers() {
        let key = random_bytes(key_len).unwrap();
        let mut sealed = cipher.encrypt(&key, b"tamper with me").unwrap();

        // Flip one bit in the ciphertext body
        sealed[IV_LENGTH] ^= 0x01;

        let err = cipher.decrypt(&key, &sealed).unwrap_err();
        assert!(err.is_tamper());
        assert_eq!(err.error_code(), error_codes::AUTHENTICATION_TAG_MISMATCH);
    }
}

#[test]
fn test_wrong_key_detected() {
    let cipher = AesGcmCipher::new();
    let key = random_bytes(16).unwrap();
    let other = random_bytes(16).unwrap();

    let sealed = cipher.encrypt(&key, b"payload").unwrap();
    let err = cipher.decrypt(&other, &sealed).unwrap_err();
    assert!(err.is_tamper());
}

#[test]
fn test_truncated_ciphertext() {
    let cipher = ChaCha20Poly1305Cipher::new();
    let key = random_bytes(32).unwrap();

    let err = cipher
        .decrypt(&key, &[0u8; IV_LENGTH + TAG_LENGTH - 1])
        .unwrap_err();
    assert!(err.is_tamper());
    assert_eq!(err.error_code(), error_codes::CIPHERTEXT_TOO_SHORT);
}

#[test]
fn test_invalid_key_size() {
    let aes = AesGcmCipher::new();
    let err = aes.encrypt(&[0u8; 24], b"data").unwrap_err();
    assert_eq!(err.error_code(), error_codes::INVALID_KEY_SIZE);
    assert!(!err.is_tamper());

    let chacha = ChaCha20Poly1305Cipher::new();
    let err = chacha.encrypt(&[0u8; 16], b"data").unwrap_err();
    assert_eq!(err.error_code(), error_codes::INVALID_KEY_SIZE);
}

#[test]
fn test_supported_key_lengths() {
    assert_eq!(AesGcmCipher::new().supported_key_lengths(), &[16, 32]);
    assert_eq!(ChaCha20Poly1305Cipher::new().supported_key_lengths(), &[32]);
}
