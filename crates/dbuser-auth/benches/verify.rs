//! Benchmarks for stored-hash verification.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dbuser_auth::hash::{hash_bcrypt, hash_pbkdf2_sha256, verify_bcrypt, verify_pbkdf2_sha256};
use dbuser_auth::{DigestAlgorithm, HashScheme, SaltLocation, combine_salt};

fn bench_digest_verify(c: &mut Criterion) {
    let password = b"test_password_123";

    let mut group = c.benchmark_group("digest_verify");
    for alg in [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Sha3_256,
    ] {
        let stored = alg.hex_digest(password);
        let scheme = HashScheme::Digest(alg);
        group.bench_with_input(BenchmarkId::from_parameter(alg), &stored, |b, s| {
            b.iter(|| scheme.verify(black_box(password), black_box(s)))
        });
    }
    group.finish();
}

fn bench_salted_digest(c: &mut Criterion) {
    // "c2FsdA==" decodes to "salt"
    let stored = DigestAlgorithm::Sha256.hex_digest(b"saltpassword");
    let scheme = HashScheme::Digest(DigestAlgorithm::Sha256);
    let salted = combine_salt(b"password", "c2FsdA==", SaltLocation::Prepend).unwrap();
    assert!(scheme.verify(&salted, &stored).unwrap());

    c.bench_function("salted_sha256", |b| {
        b.iter(|| {
            let bytes = combine_salt(black_box(b"password"), "c2FsdA==", SaltLocation::Prepend)
                .unwrap_or_default();
            scheme.verify(&bytes, black_box(&stored))
        })
    });
}

fn bench_pbkdf2(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbkdf2_sha256");
    for iterations in [1_000u32, 10_000] {
        let stored = hash_pbkdf2_sha256(b"password", "salt", iterations).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &stored, |b, s| {
            b.iter(|| verify_pbkdf2_sha256(black_box(b"password"), black_box(s)))
        });
    }
    group.finish();
}

fn bench_bcrypt(c: &mut Criterion) {
    let stored = hash_bcrypt(b"password", 4).unwrap();

    c.bench_function("bcrypt_cost4", |b| {
        b.iter(|| verify_bcrypt(black_box(b"password"), black_box(&stored)))
    });
}

criterion_group!(
    benches,
    bench_digest_verify,
    bench_salted_digest,
    bench_pbkdf2,
    bench_bcrypt
);
criterion_main!(benches);
