//! Tachyon hash library.
//!
//! Thin façade over [`tachyon_core`], which implements the full
//! construction: the AES-round permutation kernel with Davies-Meyer
//! feed-forward, CLMUL hardening, the sub-64-byte fast path, and the
//! Merkle tree over 256 KiB chunks, with portable, AES-NI, and AVX-512
//! back-ends selected at runtime.
//!
//! # Example
//!
//! ```rust
//! let digest = tachyon::hash(b"Hello, World!");
//! println!("{}", hex::encode(digest));
//! ```

// Re-export the core algorithm
pub use tachyon_core as algorithm;

// Convenience re-exports
pub use tachyon_core::{
    Hasher, backend_name, derive_key, hash, hash_full, hash_keyed, hash_seeded,
    hash_with_domain, verify, verify_mac,
};
