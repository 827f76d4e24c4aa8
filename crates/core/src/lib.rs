//! # Tachyon Core
//!
//! A 256-bit keyed, seeded, domain-separated hash built on wide parallel
//! AES-round permutations with Davies-Meyer feed-forward, a carry-less
//! multiplication hardening stage, and a bitmap-stack Merkle tree over
//! large inputs.
//!
//! ## Construction
//!
//! - 512-byte internal state: 8 lanes x 4 x 128-bit vectors
//! - 10-round two-phase compression with lane-index diversification and
//!   mid-block cross-lane diffusion
//! - finalization: remainder absorption, 32→16→8→4 tree merge, quadratic
//!   CLMUL hardening, domain/length injection, optional key re-absorption,
//!   4-lane reduction to 256 bits
//! - single-block fast path for inputs under 64 bytes
//! - Merkle tree over 256 KiB chunks for large inputs
//!
//! Three back-ends (portable, AES-NI, AVX-512 + VAES) are selected at
//! runtime and produce bit-identical digests. Tachyon is not a standardized
//! cryptographic hash and makes no formal security claims; the portable
//! AES round is table-driven and not hardened against cache-timing
//! adversaries.
//!
//! ## Example
//!
//! ```rust
//! use tachyon_core::{Hasher, hash, hash_keyed, verify};
//!
//! // One-shot hashing
//! let digest = hash(b"input data");
//! assert!(verify(b"input data", &digest));
//!
//! // Keyed (MAC) mode
//! let key = [0x42u8; 32];
//! let tag = hash_keyed(b"message", &key);
//!
//! // Streaming, bit-compatible with one-shot
//! let mut hasher = Hasher::new();
//! hasher.update(b"input ");
//! hasher.update(b"data");
//! assert_eq!(hasher.finalize(), digest);
//! ```
//!
//! ## no_std support
//!
//! Disable default features for `no_std` + `alloc` environments:
//!
//! ```toml
//! [dependencies]
//! tachyon-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod backend;
mod hasher;
mod kernel;
mod params;
mod tree;
mod vector;

#[cfg(feature = "std")]
mod ffi;

pub use backend::backend_name;
pub use hasher::{
    Hasher, derive_key, hash, hash_full, hash_keyed, hash_seeded, hash_with_domain, verify,
    verify_mac,
};
pub use params::{
    CHUNK_SIZE, DIGEST_SIZE, DOMAIN_CONTENT_ADDRESSED, DOMAIN_DATABASE_INDEX,
    DOMAIN_FILE_CHECKSUM, DOMAIN_GENERIC, DOMAIN_KEY_DERIVATION, DOMAIN_MESSAGE_AUTH, KEY_SIZE,
};

#[cfg(feature = "std")]
pub use ffi::TachyonHasher;

#[cfg(test)]
mod tests;
