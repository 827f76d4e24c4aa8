//! Public hashing API: one-shot conveniences, verification helpers, and the
//! streaming [`Hasher`].

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::backend::kernel_oneshot;
use crate::params::*;
use crate::tree;

/// Compute the Tachyon hash of `input` with default parameters.
///
/// # Example
///
/// ```rust
/// let digest = tachyon_core::hash(b"input data");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn hash(input: &[u8]) -> [u8; DIGEST_SIZE] {
    hash_full(input, DOMAIN_GENERIC, 0, None)
}

/// Compute the hash with a 64-bit seed. Seed 0 selects the unseeded state.
pub fn hash_seeded(input: &[u8], seed: u64) -> [u8; DIGEST_SIZE] {
    hash_full(input, DOMAIN_GENERIC, seed, None)
}

/// Compute the hash under a domain tag.
///
/// Domain values with the high 32 bits all-set are reserved for internal
/// Merkle node typing and must not be passed.
pub fn hash_with_domain(input: &[u8], domain: u64) -> [u8; DIGEST_SIZE] {
    hash_full(input, domain, 0, None)
}

/// Compute a keyed hash (MAC) under the message-auth domain.
pub fn hash_keyed(input: &[u8], key: &[u8; KEY_SIZE]) -> [u8; DIGEST_SIZE] {
    hash_full(input, DOMAIN_MESSAGE_AUTH, 0, Some(key))
}

/// Compute the hash with explicit domain, seed, and optional key.
pub fn hash_full(
    input: &[u8],
    domain: u64,
    seed: u64,
    key: Option<&[u8; KEY_SIZE]>,
) -> [u8; DIGEST_SIZE] {
    let mut out = [0u8; DIGEST_SIZE];
    tree::oneshot(input, domain, seed, key, &mut out);
    out
}

/// Hash `input` and compare against `expected` in constant time.
pub fn verify(input: &[u8], expected: &[u8; DIGEST_SIZE]) -> bool {
    ct_eq(&hash(input), expected)
}

/// Verify a keyed hash (MAC) in constant time.
pub fn verify_mac(input: &[u8], key: &[u8; KEY_SIZE], expected: &[u8; DIGEST_SIZE]) -> bool {
    ct_eq(&hash_keyed(input, key), expected)
}

/// Derive a 32-byte key from a context string and key material.
pub fn derive_key(context: &[u8], key_material: &[u8; KEY_SIZE]) -> [u8; DIGEST_SIZE] {
    hash_full(context, DOMAIN_KEY_DERIVATION, 0, Some(key_material))
}

/// Constant-time 32-byte comparison: every byte is folded into the
/// accumulator before the single data-independent branch.
#[inline(never)]
pub(crate) fn ct_eq(a: &[u8; DIGEST_SIZE], b: &[u8; DIGEST_SIZE]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Streaming hasher.
///
/// Buffers input into 256 KiB chunks and feeds the same Merkle driver as the
/// one-shot path, so any split of the same bytes produces the one-shot
/// digest. The handle owns its scratch buffer exclusively; `finalize`
/// consumes it.
///
/// # Example
///
/// ```rust
/// let mut hasher = tachyon_core::Hasher::new();
/// hasher.update(b"Tachy");
/// hasher.update(b"on");
/// assert_eq!(hasher.finalize(), tachyon_core::hash(b"Tachyon"));
/// ```
pub struct Hasher {
    buf: Vec<u8>,
    stack: tree::MerkleStack,
    total_len: u64,
    domain: u64,
    seed: u64,
    key: Option<[u8; KEY_SIZE]>,
}

impl Hasher {
    /// Streaming hasher with default parameters.
    pub fn new() -> Self {
        Self::new_full(DOMAIN_GENERIC, 0, None)
    }

    /// Streaming hasher under a domain tag.
    pub fn with_domain(domain: u64) -> Self {
        Self::new_full(domain, 0, None)
    }

    /// Streaming hasher with a seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new_full(DOMAIN_GENERIC, seed, None)
    }

    /// Streaming hasher with explicit domain, seed, and optional key.
    pub fn new_full(domain: u64, seed: u64, key: Option<&[u8; KEY_SIZE]>) -> Self {
        Self {
            buf: Vec::with_capacity(CHUNK_SIZE),
            stack: tree::MerkleStack::new(),
            total_len: 0,
            domain,
            seed,
            key: key.copied(),
        }
    }

    /// Absorb more input. May be called any number of times.
    pub fn update(&mut self, mut data: &[u8]) {
        self.total_len += data.len() as u64;
        while !data.is_empty() {
            let take = (CHUNK_SIZE - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == CHUNK_SIZE {
                let leaf = tree::leaf_hash(&self.buf, self.seed, self.key.as_ref());
                self.stack.push(leaf, self.seed, self.key.as_ref());
                self.buf.clear();
            }
        }
    }

    /// Produce the digest, consuming the hasher.
    pub fn finalize(self) -> [u8; DIGEST_SIZE] {
        let key = self.key.as_ref();
        let mut out = [0u8; DIGEST_SIZE];

        // Everything fit in one partial chunk: plain kernel call, identical
        // to the short one-shot path.
        if self.stack.is_empty() {
            kernel_oneshot(&self.buf, self.domain, self.seed, key, &mut out);
            return out;
        }

        let mut stack = self.stack;
        if !self.buf.is_empty() {
            stack.push(tree::leaf_hash(&self.buf, self.seed, key), self.seed, key);
        }
        let root = stack.root(self.seed, key);
        tree::commit_root(&root, self.domain, self.total_len, self.seed, key, &mut out);
        out
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
