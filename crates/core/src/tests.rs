//! Tests for the Tachyon hash.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::testing::*;
use crate::kernel::KernelState;
use crate::params::*;
use crate::vector::V128;
use crate::{Hasher, derive_key, hash, hash_full, hash_keyed, hash_seeded, hash_with_domain};

/// Deterministic filler used by the Merkle boundary vectors.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) & 0xFF) as u8).collect()
}

fn bit_diff(a: &[u8; 32], b: &[u8; 32]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[test]
fn digest_is_deterministic() {
    let input = b"test input data";
    assert_eq!(hash(input), hash(input));
}

#[test]
fn known_vectors() {
    // Canonical digests for this implementation; any change to the kernel,
    // the constants, or the finalization pipeline shows up here first.
    let abc600 = b"abc".repeat(200);
    let cases: [(&[u8], &str); 4] = [
        (
            b"",
            "50962f91ad8fe38c95e22d67737bbe1d26db004dc6e447339347ea945ef76011",
        ),
        (
            b"Tachyon",
            "bc1ec19d223739ac89b6830ec26dce9276d48c18a0a543ed2f2a3e8d44a6c145",
        ),
        (
            &[0x41u8; 256],
            "bd85cdbe0b88a5c8fdb08d49b91476990609ba8436c7f7971da315f0896e656f",
        ),
        (
            // 600 bytes: exercises the full 512-byte compression block.
            abc600.as_slice(),
            "7242e2dec8dc995e9153a0eaafed5286fe531fa9c76dc1664479310f173a5351",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(
            hex::encode(hash(input)),
            expected,
            "digest changed for input of {} bytes",
            input.len()
        );
    }
}

#[test]
fn known_vectors_parameterized() {
    assert_eq!(
        hex::encode(hash_seeded(b"Tachyon", 1)),
        "29403f9f5b20533e9e16b77ab9b91460c380cf779db536bc16f749b6f2d12e87"
    );
    assert_eq!(
        hex::encode(hash_seeded(b"Tachyon", 2)),
        "7993dc105d19ad13807cf3294eba68e2b9efdaaf2139a1b6a4c593137f61886a"
    );
    assert_eq!(
        hex::encode(hash_with_domain(b"Tachyon", DOMAIN_CONTENT_ADDRESSED)),
        "5a9bc767a4bd59585a1a3b5bbb9a682330c6ce18f60a52b659e8874bdae90ef0"
    );

    let key: [u8; 32] = core::array::from_fn(|i| i as u8);
    assert_eq!(
        hex::encode(hash_keyed(b"Tachyon", &key)),
        "d0449cc6ef9f83c3e096a5c58ae456d7593d71ee5f263f20a26cc77f1844abe3"
    );
    assert_eq!(
        hex::encode(derive_key(b"example context", &key)),
        "e01bb0d408c538006a555bcb47204aff271467bae7c71ebc757cb1c0a6542757"
    );
}

#[test]
fn known_vectors_merkle_boundaries() {
    let cases = [
        (
            CHUNK_SIZE - 1,
            "9ede21f07e9ef16b69b16c7d4cf5140cb376277616edddd46f178241edc8caaf",
        ),
        (
            CHUNK_SIZE,
            "e094648cddd47c3298f0e093ebf3d320259a849d6d953f5c52bf872a0814259f",
        ),
        (
            CHUNK_SIZE + 1,
            "1ecd0bc8cb4a358fac6f4cb454c94a83b73ee8377b1ffb5eecfb4cdab8a77524",
        ),
        (
            2 * CHUNK_SIZE + 100,
            "44ea5ff61e180ec250b236f3bce38bbafed15835f0e28047c272b570fc1d20b3",
        ),
    ];
    for (len, expected) in cases {
        assert_eq!(hex::encode(hash(&pattern(len))), expected, "len = {}", len);
    }
}

#[test]
fn merkle_boundary_continuity() {
    // C-1 stays on the direct path, C+1 crosses into the tree; all three
    // must be pairwise distinct.
    let a = hash(&pattern(CHUNK_SIZE - 1));
    let b = hash(&pattern(CHUNK_SIZE));
    let c = hash(&pattern(CHUNK_SIZE + 1));
    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
}

#[test]
fn backends_agree() {
    let key: [u8; 32] = core::array::from_fn(|i| (i * 7 + 3) as u8);
    let params: [(u64, u64, Option<&[u8; 32]>); 4] = [
        (DOMAIN_GENERIC, 0, None),
        (DOMAIN_GENERIC, 7, None),
        (DOMAIN_CONTENT_ADDRESSED, 0, None),
        (DOMAIN_MESSAGE_AUTH, 9, Some(&key)),
    ];
    let lengths = [
        0usize, 1, 7, 63, 64, 65, 127, 128, 511, 512, 513, 1024, 4096, 65536,
    ];

    for &len in &lengths {
        let data = pattern(len);
        for &(domain, seed, key) in &params {
            let mut scalar = [0u8; 32];
            scalar_oneshot(&data, domain, seed, key, &mut scalar);

            #[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
            {
                let mut hw = [0u8; 32];
                if aesni_oneshot(&data, domain, seed, key, &mut hw) {
                    assert_eq!(
                        hw, scalar,
                        "AES-NI mismatch: len={} domain={} seed={}",
                        len, domain, seed
                    );
                }
            }

            #[cfg(all(
                target_arch = "x86_64",
                not(feature = "force-scalar"),
                not(feature = "force-aesni")
            ))]
            {
                let mut hw = [0u8; 32];
                if avx512_oneshot(&data, domain, seed, key, &mut hw) {
                    assert_eq!(
                        hw, scalar,
                        "AVX-512 mismatch: len={} domain={} seed={}",
                        len, domain, seed
                    );
                }
            }
        }
    }
}

#[test]
fn streaming_matches_oneshot() {
    let data = pattern(2 * CHUNK_SIZE + 100);
    let expected = hash(&data);

    // A spread of split schedules, including chunk-straddling ones.
    let schedules: [&[usize]; 5] = [
        &[1, 2, 3],
        &[64],
        &[511, 512, 513],
        &[CHUNK_SIZE - 1, CHUNK_SIZE + 1],
        &[CHUNK_SIZE, 100, CHUNK_SIZE],
    ];

    for sizes in schedules {
        let mut hasher = Hasher::new();
        let mut offset = 0;
        let mut i = 0;
        while offset < data.len() {
            let take = sizes[i % sizes.len()].min(data.len() - offset);
            hasher.update(&data[offset..offset + take]);
            offset += take;
            i += 1;
        }
        assert_eq!(hasher.finalize(), expected, "split schedule {:?}", sizes);
    }

    // Short inputs stream through the same fast path as the one-shot call.
    let mut hasher = Hasher::new();
    hasher.update(b"Tachy");
    hasher.update(b"on");
    assert_eq!(hasher.finalize(), hash(b"Tachyon"));
}

#[test]
fn streaming_matches_oneshot_with_parameters() {
    let key: [u8; 32] = core::array::from_fn(|i| (i * 5 + 1) as u8);
    let data = pattern(3 * CHUNK_SIZE / 2);
    let expected = hash_full(&data, DOMAIN_FILE_CHECKSUM, 99, Some(&key));

    let mut hasher = Hasher::new_full(DOMAIN_FILE_CHECKSUM, 99, Some(&key));
    for piece in data.chunks(10_000) {
        hasher.update(piece);
    }
    assert_eq!(hasher.finalize(), expected);
}

#[test]
fn appending_a_null_byte_changes_the_digest() {
    let mut rng = StdRng::seed_from_u64(0x7AC4_0001);
    for _ in 0..1000 {
        let len = rng.gen_range(0..200);
        let mut data: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        let before = hash(&data);
        data.push(0);
        assert_ne!(before, hash(&data), "length extension collision");
    }
}

#[test]
fn domains_separate() {
    let inputs: [&[u8]; 3] = [b"", b"x", b"domain separation test input"];
    for input in inputs {
        let digests: Vec<_> = [0u64, 1, 2, 3, 4, 5, 1000]
            .iter()
            .map(|&d| hash_with_domain(input, d))
            .collect();
        for i in 0..digests.len() {
            for j in (i + 1)..digests.len() {
                assert_ne!(digests[i], digests[j], "domains {} and {} collide", i, j);
            }
        }
    }
}

#[test]
fn seed_bits_avalanche() {
    let input = b"seed avalanche test input";
    let base = hash_seeded(input, 0x0123_4567_89AB_CDEF);
    let mut total = 0u64;
    for bit in 0..64 {
        let flipped = hash_seeded(input, 0x0123_4567_89AB_CDEF ^ (1u64 << bit));
        let diff = bit_diff(&base, &flipped);
        assert!(
            (80..=176).contains(&diff),
            "seed bit {} flipped only {} output bits",
            bit,
            diff
        );
        total += diff as u64;
    }
    let mean = total / 64;
    assert!(
        (118..=138).contains(&mean),
        "seed avalanche mean {} out of range",
        mean
    );
}

#[test]
fn key_bits_avalanche() {
    let input = b"key avalanche test input";
    let base_key = [0x5Au8; 32];
    let base = hash_keyed(input, &base_key);
    let mut total = 0u64;
    let mut samples = 0u64;
    // Every byte, one bit each, keeps the runtime small while touching the
    // whole key.
    for byte in 0..32 {
        for bit in [0u8, 7] {
            let mut key = base_key;
            key[byte] ^= 1 << bit;
            let diff = bit_diff(&base, &hash_keyed(input, &key));
            assert!(
                (80..=176).contains(&diff),
                "key bit {}:{} flipped only {} output bits",
                byte,
                bit,
                diff
            );
            total += diff as u64;
            samples += 1;
        }
    }
    let mean = total / samples;
    assert!(
        (118..=138).contains(&mean),
        "key avalanche mean {} out of range",
        mean
    );
}

#[test]
fn input_avalanche() {
    // Flipping one input bit changes ~50% of the output bits.
    let input1 = b"test input";
    let mut input2 = input1.to_vec();
    input2[0] ^= 1;

    let diff = bit_diff(&hash(input1), &hash(&input2));
    assert!(
        (90..=166).contains(&diff),
        "avalanche effect: {} bits differ (expected ~128)",
        diff
    );
}

#[test]
fn round_key_chain_regenerates() {
    let mut v = V128::splat(GOLDEN_RATIO);
    for (r, expected) in RK_CHAIN.iter().enumerate() {
        v = v.aes_round(v);
        assert_eq!(
            [v.lo, v.hi], *expected,
            "RK_CHAIN[{}] does not match the regenerated chain",
            r
        );
    }
}

#[test]
fn short_init_regenerates() {
    let state = KernelState::initialize(0, None);
    for (i, expected) in SHORT_INIT.iter().enumerate() {
        assert_eq!(
            [state.v[i].lo, state.v[i].hi],
            *expected,
            "SHORT_INIT[{}] does not match lane 0 of the initialized state",
            i
        );
    }
}

#[test]
fn verify_roundtrip() {
    let digest = hash(b"verified input");
    assert!(crate::verify(b"verified input", &digest));
    assert!(!crate::verify(b"verified inpuT", &digest));

    let key = [9u8; 32];
    let tag = hash_keyed(b"message", &key);
    assert!(crate::verify_mac(b"message", &key, &tag));
    let mut bad = tag;
    bad[31] ^= 1;
    assert!(!crate::verify_mac(b"message", &key, &bad));
}

#[test]
fn seeded_digests_differ() {
    let a = hash(b"Tachyon");
    let b = hash_seeded(b"Tachyon", 1);
    let c = hash_seeded(b"Tachyon", 2);
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn backend_name_is_known() {
    assert!(matches!(
        crate::backend_name(),
        "Portable" | "AES-NI" | "AVX-512"
    ));
}

#[test]
fn ffi_oneshot_roundtrip() {
    let input = b"ffi test input";
    let mut out = [0u8; 32];
    let res = unsafe { crate::ffi::tachyon_hash(input.as_ptr(), input.len(), out.as_mut_ptr()) };
    assert_eq!(res, 0);
    assert_eq!(out, hash(input));

    let v = unsafe { crate::ffi::tachyon_verify(input.as_ptr(), input.len(), out.as_ptr()) };
    assert_eq!(v, 1);
    out[0] ^= 1;
    let v = unsafe { crate::ffi::tachyon_verify(input.as_ptr(), input.len(), out.as_ptr()) };
    assert_eq!(v, 0);
}

#[test]
fn ffi_rejects_null_pointers() {
    let mut out = [0u8; 32];
    let res = unsafe { crate::ffi::tachyon_hash(core::ptr::null(), 4, out.as_mut_ptr()) };
    assert_eq!(res, -1);
    let res = unsafe { crate::ffi::tachyon_hash(out.as_ptr(), 4, core::ptr::null_mut()) };
    assert_eq!(res, -1);
    let res = unsafe { crate::ffi::tachyon_verify(core::ptr::null(), 0, out.as_ptr()) };
    assert_eq!(res, -1);
}

#[test]
fn ffi_streaming_matches_oneshot() {
    let state = crate::ffi::tachyon_hasher_new();
    assert!(!state.is_null());
    unsafe {
        crate::ffi::tachyon_hasher_update(state, b"Tachy".as_ptr(), 5);
        crate::ffi::tachyon_hasher_update(state, b"on".as_ptr(), 2);
        let mut out = [0u8; 32];
        crate::ffi::tachyon_hasher_finalize(state, out.as_mut_ptr());
        assert_eq!(out, hash(b"Tachyon"));
    }

    // Free without finalizing must not leak or crash.
    let state = crate::ffi::tachyon_hasher_new_seeded(42);
    unsafe {
        crate::ffi::tachyon_hasher_update(state, b"abc".as_ptr(), 3);
        crate::ffi::tachyon_hasher_free(state);
    }
}

/// Run with: cargo test verify_timing -- --ignored --nocapture
#[test]
#[ignore]
fn verify_timing_is_input_independent() {
    use std::time::Instant;

    let input = b"timing probe input";
    let good = hash(input);
    let mut bad = good;
    for b in bad.iter_mut() {
        *b ^= 0xFF;
    }

    let iterations = 20_000;
    let mut times_good = Vec::with_capacity(iterations);
    let mut times_bad = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let t = Instant::now();
        let _ = std::hint::black_box(crate::verify(input, &good));
        times_good.push(t.elapsed().as_nanos());

        let t = Instant::now();
        let _ = std::hint::black_box(crate::verify(input, &bad));
        times_bad.push(t.elapsed().as_nanos());
    }

    times_good.sort_unstable();
    times_bad.sort_unstable();
    let median_good = times_good[iterations / 2] as f64;
    let median_bad = times_bad[iterations / 2] as f64;
    let ratio = median_good / median_bad;

    println!("median match: {} ns, mismatch: {} ns", median_good, median_bad);
    assert!(
        (0.8..=1.25).contains(&ratio),
        "verify timing differs between match and mismatch: ratio {}",
        ratio
    );
}
