use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use xkeystore::{
    derivation::{KeyDerivationEngine, Pbkdf2Deriver},
    key_management::{derive_password, ExtendedKeyStoreGenerator},
    keys::SecretKey,
    platform::SoftwareCredentialStoreProvider,
    policy::SecretKeySpec,
    symmetric::{AesGcmCipher, AuthenticatedCipher, ChaCha20Poly1305Cipher},
};

const ENTRY_PW: &str = "0123456789ABCDEF";
const STORE_PW: &str = "container-pw-0123456789012345";

fn generator(iterations: u32) -> ExtendedKeyStoreGenerator {
    ExtendedKeyStoreGenerator::new(
        Arc::new(Pbkdf2Deriver::new(iterations, 32, 16).unwrap()),
        Arc::new(AesGcmCipher::new()),
        Arc::new(SoftwareCredentialStoreProvider::new()),
        SecretKeySpec::parse("AES_128").unwrap(),
    )
    .unwrap()
}

fn derivation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbkdf2");
    group.sample_size(10);

    let salt = [7u8; 32];
    for iterations in [1_000u32, 32_000] {
        let deriver = Pbkdf2Deriver::new(iterations, 32, 16).unwrap();
        group.bench_with_input(
            BenchmarkId::new("derive_key", iterations),
            &deriver,
            |b, deriver| b.iter(|| deriver.derive_key(ENTRY_PW, &salt)),
        );
    }

    let key = [0xA5u8; 16];
    group.bench_function("printable_password", |b| b.iter(|| derive_password(&key)));

    group.finish();
}

fn cipher_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead");
    let plaintext = vec![0x42u8; 4096];
    let ciphers: Vec<(Box<dyn AuthenticatedCipher>, Vec<u8>)> = vec![
        (Box::new(AesGcmCipher::new()), vec![1u8; 16]),
        (Box::new(AesGcmCipher::new()), vec![1u8; 32]),
        (Box::new(ChaCha20Poly1305Cipher::new()), vec![1u8; 32]),
    ];

    for (cipher, key) in &ciphers {
        let label = format!("{}_{}", cipher.name(), key.len() * 8);
        let sealed = cipher.encrypt(key, &plaintext).unwrap();

        group.bench_function(BenchmarkId::new("encrypt_4k", &label), |b| {
            b.iter(|| cipher.encrypt(key, &plaintext))
        });
        group.bench_function(BenchmarkId::new("decrypt_4k", &label), |b| {
            b.iter(|| cipher.decrypt(key, &sealed))
        });
    }

    group.finish();
}

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("extended_keystore");
    group.sample_size(10);

    let generator = generator(32_000);
    let key = SecretKey::new("AES", &[3u8; 16]);

    // Warm cache: the entry password was derived once when the entry was set
    let mut warm = generator.create().unwrap();
    warm.set_secret_key_entry("k1", &key, ENTRY_PW).unwrap();
    group.bench_function("get_secret_key_cached", |b| {
        b.iter(|| warm.get_secret_key_entry("k1", ENTRY_PW))
    });

    // Cold cache: every iteration loads a fresh store and derives again
    let mut container = Vec::new();
    warm.store(&mut container, STORE_PW).unwrap();
    group.bench_function("load_and_get_secret_key", |b| {
        b.iter(|| {
            let mut store = generator.load(&mut container.as_slice(), STORE_PW).unwrap();
            store.get_secret_key_entry("k1", ENTRY_PW)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    derivation_benchmarks,
    cipher_benchmarks,
    store_benchmarks
);
criterion_main!(benches);
