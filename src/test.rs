use crate::{Error, Hasher, BLOCK_LEN, CHUNK_LEN, KEY_LEN, OUT_LEN};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp;
use rand::prelude::*;
use rand::rngs::StdRng;

pub const TEST_CASES: &[usize] = &[
    0,
    1,
    2,
    3,
    4,
    5,
    6,
    7,
    8,
    BLOCK_LEN - 1,
    BLOCK_LEN,
    BLOCK_LEN + 1,
    2 * BLOCK_LEN - 1,
    2 * BLOCK_LEN,
    2 * BLOCK_LEN + 1,
    CHUNK_LEN - 1,
    CHUNK_LEN,
    CHUNK_LEN + 1,
    2 * CHUNK_LEN,
    2 * CHUNK_LEN + 1,
    3 * CHUNK_LEN,
    3 * CHUNK_LEN + 1,
    4 * CHUNK_LEN,
    4 * CHUNK_LEN + 1,
    5 * CHUNK_LEN,
    5 * CHUNK_LEN + 1,
    6 * CHUNK_LEN,
    6 * CHUNK_LEN + 1,
    7 * CHUNK_LEN,
    7 * CHUNK_LEN + 1,
    8 * CHUNK_LEN,
    8 * CHUNK_LEN + 1,
    16 * CHUNK_LEN - 1,
    16 * CHUNK_LEN,
    16 * CHUNK_LEN + 1,
    31 * CHUNK_LEN - 1,
    31 * CHUNK_LEN, // 16 + 8 + 4 + 2 + 1
    31 * CHUNK_LEN + 1,
    100 * CHUNK_LEN, // subtrees larger than 16 chunks
];

pub const TEST_KEY: &[u8; KEY_LEN] = b"whats the Elvish word for friend";
pub const TEST_CONTEXT: &str = "treehash 2024-01-01 12:00:00 test vectors context";

// A non-multiple of 4 is important, since one possible bug is to fail to emit
// partial words.
const XOF_LEN: usize = 2 * BLOCK_LEN + 3;

// Paint a byte pattern that won't repeat, so that we don't accidentally
// miss buffer offset bugs.
pub fn paint_test_input(buf: &mut [u8]) {
    let mut offset = 0;
    let mut counter: u32 = 1;
    while offset < buf.len() {
        let bytes = counter.to_le_bytes();
        let take = cmp::min(bytes.len(), buf.len() - offset);
        buf[offset..][..take].copy_from_slice(&bytes[..take]);
        counter += 1;
        offset += take;
    }
}

fn painted(len: usize) -> Vec<u8> {
    let mut input = vec![0; len];
    paint_test_input(&mut input);
    input
}

#[test]
fn test_empty_message() {
    assert_eq!(
        crate::hash(b"").to_hex().as_str(),
        "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
    );
    let mut hasher = Hasher::new();
    assert_eq!(hasher.count(), 0);
    assert_eq!(hasher.finalize_hash().unwrap(), crate::hash(b""));
}

#[test]
fn test_compare_reference_impl() {
    for &case in TEST_CASES {
        let input = painted(case);

        // regular
        {
            let mut expected = [0; XOF_LEN];
            blake3::Hasher::new()
                .update(&input)
                .finalize_xof()
                .fill(&mut expected);
            let mut hasher = Hasher::new();
            hasher.update(&input);
            assert_eq!(hasher.count(), case as u64);
            assert_eq!(&hasher.finalize(XOF_LEN).unwrap()[..], &expected[..], "hash {case}");
            assert_eq!(crate::hash(&input).as_bytes(), &expected[..OUT_LEN]);
        }

        // keyed
        {
            let mut expected = [0; XOF_LEN];
            blake3::Hasher::new_keyed(TEST_KEY)
                .update(&input)
                .finalize_xof()
                .fill(&mut expected);
            let mut hasher = Hasher::new_keyed(TEST_KEY);
            hasher.update(&input);
            assert_eq!(&hasher.finalize(XOF_LEN).unwrap()[..], &expected[..], "keyed {case}");
            assert_eq!(
                crate::keyed_hash(TEST_KEY, &input).as_bytes(),
                &expected[..OUT_LEN]
            );
        }

        // derive_key
        {
            let mut expected = [0; XOF_LEN];
            blake3::Hasher::new_derive_key(TEST_CONTEXT)
                .update(&input)
                .finalize_xof()
                .fill(&mut expected);
            let mut hasher = Hasher::new_derive_key(TEST_CONTEXT);
            hasher.update(&input);
            assert_eq!(&hasher.finalize(XOF_LEN).unwrap()[..], &expected[..], "derive {case}");
            assert_eq!(
                &crate::derive_key(TEST_CONTEXT, &input)[..],
                &expected[..OUT_LEN]
            );
        }
    }
}

#[test]
fn test_streaming_equivalence() {
    let mut rng = StdRng::seed_from_u64(0);
    for &case in TEST_CASES {
        let input = painted(case);
        let expected = crate::hash(&input);

        // One byte at a time.
        let mut hasher = Hasher::new();
        for byte in &input {
            hasher.update(core::slice::from_ref(byte));
        }
        assert_eq!(hasher.finalize_hash().unwrap(), expected, "bytewise {case}");

        // Random split points, including empty updates.
        for _ in 0..5 {
            let mut hasher = Hasher::new();
            let mut rest = &input[..];
            while !rest.is_empty() {
                let take = rng.gen_range(0..=cmp::min(rest.len(), 3 * CHUNK_LEN));
                hasher.update(&rest[..take]);
                rest = &rest[take..];
            }
            hasher.update(&[]);
            assert_eq!(hasher.finalize_hash().unwrap(), expected, "random {case}");
        }
    }
}

#[test]
fn test_stack_invariant() {
    let input = painted(70 * CHUNK_LEN);
    let mut hasher = Hasher::new();
    for (i, chunk) in input.chunks(CHUNK_LEN).enumerate() {
        hasher.update(chunk);
        // The last chunk fed in stays open, so `i` chunks are complete.
        let completed = i as u64;
        let sizes = hasher.stack_sizes();
        assert_eq!(sizes.len(), completed.count_ones() as usize, "after chunk {i}");
        // Most significant size first, one entry per set bit.
        let expected: Vec<u64> = (0..64)
            .rev()
            .map(|bit| 1u64 << bit)
            .filter(|size| completed & size != 0)
            .collect();
        assert_eq!(sizes, expected, "after chunk {i}");
    }
}

#[test]
fn test_one_chunk_has_no_parent() {
    let input = painted(CHUNK_LEN);
    let mut hasher = Hasher::new();
    hasher.update(&input);
    assert!(hasher.stack_sizes().is_empty());
    let root = crate::guts::ChunkState::new(0).update(&input).finalize(true);
    assert_eq!(hasher.finalize_hash().unwrap(), root);
}

#[test]
fn test_one_chunk_plus_one_byte() {
    let input = painted(CHUNK_LEN + 1);
    let mut hasher = Hasher::new();
    hasher.update(&input);
    assert_eq!(hasher.stack_sizes(), [1]);

    let chunk0 = crate::guts::ChunkState::new(0)
        .update(&input[..CHUNK_LEN])
        .finalize(false);
    let chunk1 = crate::guts::ChunkState::new(1)
        .update(&input[CHUNK_LEN..])
        .finalize(false);
    let root = crate::guts::parent_cv(&chunk0, &chunk1, true);
    assert_eq!(hasher.finalize_hash().unwrap(), root);
}

#[test]
fn test_output_extensibility() {
    let input = painted(5 * CHUNK_LEN + 7);
    let mut hasher = Hasher::new_keyed(TEST_KEY);
    hasher.update(&input);
    let long = hasher.clone().finalize(10_000).unwrap();
    for len in [1, 16, 28, 32, 48, 63, 64, 65, 128, 1000] {
        let short = hasher.clone().finalize(len).unwrap();
        assert_eq!(&short[..], &long[..len], "len {len}");
    }
    let reader = hasher.finalize_xof().unwrap();
    assert_eq!(reader.read_at(9_000, 1_000).unwrap(), &long[9_000..]);
}

#[test]
fn test_mode_separation() {
    let input = painted(3 * CHUNK_LEN);
    let plain = crate::hash(&input);
    let keyed = crate::keyed_hash(TEST_KEY, &input);
    let derived = crate::derive_key(TEST_CONTEXT, &input);
    assert_ne!(plain, keyed);
    assert_ne!(plain, derived);
    assert_ne!(keyed, derived);

    // The IV as an explicit key still differs from plain hashing, because
    // the keyed domain flag is set.
    let mut iv_bytes = [0; KEY_LEN];
    for (word, bytes) in crate::IV.iter().zip(iv_bytes.chunks_exact_mut(4)) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
    assert_ne!(crate::keyed_hash(&iv_bytes, &input), plain);
}

#[test]
fn test_determinism() {
    let input = painted(10 * CHUNK_LEN + 3);
    let mut hasher = Hasher::new_derive_key(TEST_CONTEXT);
    hasher.update(&input);
    let first = hasher.clone().finalize(100).unwrap();
    let second = hasher.finalize(100).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_finalize_twice_is_an_error() {
    let mut hasher = Hasher::new();
    hasher.update(&painted(3 * CHUNK_LEN + 1));
    let hash = hasher.finalize_hash().unwrap();
    assert!(hasher.is_finalized());
    assert_eq!(hasher.finalize_hash(), Err(Error::AlreadyFinalized));
    assert_eq!(hasher.finalize(32), Err(Error::AlreadyFinalized));
    assert!(matches!(hasher.finalize_xof(), Err(Error::AlreadyFinalized)));
    assert_eq!(hasher.finalize_into(&mut [0; 8]), Err(Error::AlreadyFinalized));

    // reset() returns to a fresh state with the same key.
    hasher.reset();
    assert!(!hasher.is_finalized());
    assert_eq!(hasher.count(), 0);
    hasher.update(&painted(3 * CHUNK_LEN + 1));
    assert_eq!(hasher.finalize_hash().unwrap(), hash);
}

#[test]
fn test_reset_keeps_mode() {
    let input = painted(2 * CHUNK_LEN);
    let mut hasher = Hasher::new_keyed(TEST_KEY);
    hasher.update(b"garbage that is thrown away");
    hasher.reset();
    hasher.update(&input);
    assert_eq!(
        hasher.finalize_hash().unwrap(),
        crate::keyed_hash(TEST_KEY, &input)
    );
}

#[test]
#[should_panic]
fn test_update_after_finalize_should_panic() {
    let mut hasher = Hasher::new();
    hasher.finalize_hash().unwrap();
    hasher.update(b"x");
}

#[test]
fn test_invalid_output_length() {
    let mut hasher = Hasher::new();
    hasher.update(b"foo");
    assert_eq!(hasher.finalize(0), Err(Error::InvalidOutputLength));
    assert_eq!(hasher.finalize_into(&mut []), Err(Error::InvalidOutputLength));
    // Rejected configuration leaves the hasher usable.
    assert!(!hasher.is_finalized());
    assert_eq!(hasher.finalize_hash().unwrap(), crate::hash(b"foo"));
}

#[test]
fn test_out_of_memory() {
    let mut hasher = Hasher::new();
    assert_eq!(
        hasher.finalize(usize::MAX),
        Err(Error::OutOfMemory {
            requested: usize::MAX
        })
    );
    assert!(!hasher.is_finalized());
}

#[test]
fn test_with_mode() {
    let input = painted(CHUNK_LEN + 100);
    let hash_of = |mode| {
        let mut hasher = Hasher::with_mode(mode).unwrap();
        hasher.update(&input);
        hasher.finalize_hash().unwrap()
    };
    assert_eq!(hash_of(crate::Mode::Hash), crate::hash(&input));
    assert_eq!(
        hash_of(crate::Mode::KeyedHash(TEST_KEY)),
        crate::keyed_hash(TEST_KEY, &input)
    );
    assert_eq!(
        hash_of(crate::Mode::DeriveKey(TEST_CONTEXT)),
        crate::derive_key(TEST_CONTEXT, &input)
    );
    assert_eq!(
        Hasher::new_keyed_from_slice(&TEST_KEY[..16]).unwrap_err(),
        Error::InvalidKeyLength {
            expected: KEY_LEN,
            actual: 16
        }
    );
    assert_eq!(
        Hasher::new_keyed_from_slice(TEST_KEY).unwrap().domain(),
        crate::Domain::KeyedHash
    );
}

#[test]
fn test_hex_encoding_decoding() {
    let digest_str = "04e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";
    let mut hasher = Hasher::new();
    hasher.update(b"foo");
    let digest = hasher.finalize_hash().unwrap();
    assert_eq!(digest.to_hex().as_str(), digest_str);
    assert_eq!(alloc::format!("{digest}"), digest_str);

    // Test round trip
    let digest = crate::Hash::from_hex(digest_str).unwrap();
    assert_eq!(digest.to_hex().as_str(), digest_str);

    // Test uppercase
    let digest = crate::Hash::from_hex(digest_str.to_ascii_uppercase()).unwrap();
    assert_eq!(digest.to_hex().as_str(), digest_str);

    // Test string parsing via FromStr
    let digest: crate::Hash = digest_str.parse().unwrap();
    assert_eq!(digest.to_hex().as_str(), digest_str);

    // Test errors
    let bad_len = "04e0bb39f30b1";
    assert_eq!(
        crate::Hash::from_hex(bad_len).unwrap_err(),
        Error::InvalidHexLength {
            expected: 64,
            actual: 13
        }
    );
    let bad_char = "Z4e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";
    assert_eq!(
        crate::Hash::from_hex(bad_char).unwrap_err(),
        Error::InvalidHexCharacter {
            character: 'Z',
            index: 0
        }
    );
}

#[test]
fn test_hash_equality() {
    let hash = crate::hash(b"foo");
    let bytes: [u8; OUT_LEN] = hash.into();
    assert_eq!(hash, bytes);
    assert!(hash == bytes[..]);
    assert!(hash != bytes[..31]);
    assert_ne!(hash, crate::hash(b"bar"));
}
