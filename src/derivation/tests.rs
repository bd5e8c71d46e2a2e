use super::*;

const PASSWORD: &str = "0123456789ABCDEF";

#[test]
fn test_pbkdf2_known_vector() {
    // PBKDF2-HMAC-SHA256("password", "salt", 1, 32)
    let expected: [u8; 32] = [
        0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4, 0xf8,
        0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c, 0xb7, 0x0b,
        0xe1, 0x7b,
    ];

    let deriver = Pbkdf2Deriver::new(1, 4, 32).unwrap();
    let key = deriver.derive_key("password", b"salt").unwrap();
    assert_eq!(key.as_bytes(), &expected[..]);

    // A shorter output is a prefix of the same first block
    let short = Pbkdf2Deriver::new(1, 4, 16).unwrap();
    let key = short.derive_key("password", b"salt").unwrap();
    assert_eq!(key.as_bytes(), &expected[..16]);
}

#[test]
fn test_pbkdf2_is_deterministic() {
    let deriver = Pbkdf2Deriver::new(100, 32, 16).unwrap();
    let salt = deriver.generate_random_salt().unwrap();

    let first = deriver.derive_key(PASSWORD, &salt).unwrap();
    let second = deriver.derive_key(PASSWORD, &salt).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 16);
}

#[test]
fn test_pbkdf2_salt_and_password_matter() {
    let deriver = Pbkdf2Deriver::new(100, 32, 16).unwrap();
    let salt_a = [1u8; 32];
    let salt_b = [2u8; 32];

    let base = deriver.derive_key(PASSWORD, &salt_a).unwrap();
    assert_ne!(base, deriver.derive_key(PASSWORD, &salt_b).unwrap());
    assert_ne!(base, deriver.derive_key("0123456789ABCDEG", &salt_a).unwrap());
}

#[test]
fn test_pbkdf2_rejects_zero_parameters() {
    assert!(Pbkdf2Deriver::new(0, 32, 16).is_err());
    assert!(Pbkdf2Deriver::new(1, 0, 16).is_err());
    assert!(Pbkdf2Deriver::new(1, 32, 0).is_err());
}

#[test]
fn test_default_parameters() {
    let deriver = Pbkdf2Deriver::default();
    assert_eq!(deriver.iterations(), 32_000);
    assert_eq!(deriver.salt_length(), 32);
    assert_eq!(deriver.key_length(), 16);
}

#[test]
fn test_random_salt_length() {
    let deriver = Pbkdf2Deriver::new(1, 24, 16).unwrap();
    let a = deriver.generate_random_salt().unwrap();
    let b = deriver.generate_random_salt().unwrap();
    assert_eq!(a.len(), 24);
    assert_ne!(a, b);
}

#[test]
fn test_argon2_deterministic_with_custom_params() {
    let deriver = Argon2Deriver::new(1024, 1, 1, 16, 16).unwrap();
    let salt = deriver.generate_random_salt().unwrap();

    let first = deriver.derive_key(PASSWORD, &salt).unwrap();
    let second = deriver.derive_key(PASSWORD, &salt).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 16);
}

#[test]
fn test_argon2_rejects_short_salt() {
    assert!(Argon2Deriver::new(1024, 1, 1, 4, 16).is_err());

    let deriver = Argon2Deriver::new(1024, 1, 1, 16, 16).unwrap();
    let err = deriver.derive_key(PASSWORD, &[0u8; 4]).unwrap_err();
    assert_eq!(err.error_code(), error_codes::INVALID_SALT);
}

#[test]
fn test_argon2_low_resource_profile() {
    let deriver = Argon2Deriver::low_resource();
    assert_eq!(deriver.key_length(), Argon2Deriver::default().key_length());

    let salt = deriver.generate_random_salt().unwrap();
    let key = deriver.derive_key("low-resource-password", &salt).unwrap();
    assert_eq!(key.len(), deriver.key_length());
}
