use num_bigint::BigInt;

/// Radix of the printable password (digits then lowercase letters)
pub const PRINTABLE_RADIX: u32 = 36;

/// Turn derived key bytes into the textual password handed to the platform
/// credential store
///
/// The bytes are read as a big-endian two's-complement integer and written
/// in base 36. Stores persisted earlier were sealed with exactly this text,
/// so leading zero bytes vanish and a set top bit gives a leading `-`.
///
/// ```
/// use xkeystore::key_management::derive_password;
///
/// assert_eq!(derive_password(&[0x00, 0x01]), "1");
/// assert_eq!(derive_password(&[0x01, 0x00]), "74");
/// assert_eq!(derive_password(&[0x80]), "-3k");
/// ```
pub fn derive_password(key: &[u8]) -> String {
    BigInt::from_signed_bytes_be(key).to_str_radix(PRINTABLE_RADIX)
}
