//! C FFI bindings.
//!
//! Status codes: `0` success, `-1` null pointer, `-2` reserved for internal
//! errors (never emitted). Verification entries return `1` match, `0`
//! mismatch, negative on pointer errors. Output buffers are untouched on
//! error.

use core::slice;

use crate::hasher::ct_eq;
use crate::params::{DIGEST_SIZE, KEY_SIZE};
use crate::{Hasher, hash_full, params};

const TACHYON_OK: i32 = 0;
const TACHYON_NULL_POINTER: i32 = -1;

/// Opaque streaming hasher handle.
pub struct TachyonHasher {
    inner: Hasher,
}

#[inline]
unsafe fn input_slice<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len) }
    }
}

unsafe fn hash_into(
    input: *const u8,
    len: usize,
    domain: u64,
    seed: u64,
    key: *const u8,
    use_key: bool,
    output: *mut u8,
) -> i32 {
    if input.is_null() || output.is_null() || (use_key && key.is_null()) {
        return TACHYON_NULL_POINTER;
    }
    unsafe {
        let key_arr;
        let key_ref = if use_key {
            key_arr = *(key as *const [u8; KEY_SIZE]);
            Some(&key_arr)
        } else {
            None
        };
        let digest = hash_full(input_slice(input, len), domain, seed, key_ref);
        slice::from_raw_parts_mut(output, DIGEST_SIZE).copy_from_slice(&digest);
    }
    TACHYON_OK
}

/// Compute the hash of a buffer with default parameters.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hash(
    input_ptr: *const u8,
    input_len: usize,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            input_ptr,
            input_len,
            params::DOMAIN_GENERIC,
            0,
            core::ptr::null(),
            false,
            output_ptr,
        )
    }
}

/// Compute the hash with a 64-bit seed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hash_seeded(
    input_ptr: *const u8,
    input_len: usize,
    seed: u64,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            input_ptr,
            input_len,
            params::DOMAIN_GENERIC,
            seed,
            core::ptr::null(),
            false,
            output_ptr,
        )
    }
}

/// Compute the hash under a domain tag.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hash_with_domain(
    input_ptr: *const u8,
    input_len: usize,
    domain: u64,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            input_ptr,
            input_len,
            domain,
            0,
            core::ptr::null(),
            false,
            output_ptr,
        )
    }
}

/// Compute a keyed hash (MAC) with a 32-byte key.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hash_keyed(
    input_ptr: *const u8,
    input_len: usize,
    key_ptr: *const u8,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            input_ptr,
            input_len,
            params::DOMAIN_MESSAGE_AUTH,
            0,
            key_ptr,
            true,
            output_ptr,
        )
    }
}

/// Compute the hash with explicit domain, seed, and optional key (NULL for
/// unkeyed).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hash_full(
    input_ptr: *const u8,
    input_len: usize,
    domain: u64,
    seed: u64,
    key_ptr: *const u8,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            input_ptr,
            input_len,
            domain,
            seed,
            key_ptr,
            !key_ptr.is_null(),
            output_ptr,
        )
    }
}

/// Hash `input` and compare with the expected digest in constant time.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_verify(
    input_ptr: *const u8,
    input_len: usize,
    hash_ptr: *const u8,
) -> i32 {
    if input_ptr.is_null() || hash_ptr.is_null() {
        return TACHYON_NULL_POINTER;
    }
    unsafe {
        let expected = &*(hash_ptr as *const [u8; DIGEST_SIZE]);
        crate::verify(input_slice(input_ptr, input_len), expected) as i32
    }
}

/// Verify a keyed hash (MAC) in constant time.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_verify_mac(
    input_ptr: *const u8,
    input_len: usize,
    key_ptr: *const u8,
    hash_ptr: *const u8,
) -> i32 {
    if input_ptr.is_null() || key_ptr.is_null() || hash_ptr.is_null() {
        return TACHYON_NULL_POINTER;
    }
    unsafe {
        let key = &*(key_ptr as *const [u8; KEY_SIZE]);
        let expected = &*(hash_ptr as *const [u8; DIGEST_SIZE]);
        let digest = crate::hash_keyed(input_slice(input_ptr, input_len), key);
        ct_eq(&digest, expected) as i32
    }
}

/// Derive a 32-byte key from a context string and key material.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_derive_key(
    context_ptr: *const u8,
    context_len: usize,
    key_material_ptr: *const u8,
    output_ptr: *mut u8,
) -> i32 {
    unsafe {
        hash_into(
            context_ptr,
            context_len,
            params::DOMAIN_KEY_DERIVATION,
            0,
            key_material_ptr,
            true,
            output_ptr,
        )
    }
}

/// Name of the hardware back-end in use, as a NUL-terminated string.
#[unsafe(no_mangle)]
pub extern "C" fn tachyon_get_backend_name() -> *const core::ffi::c_char {
    let name: &'static [u8] = match crate::backend_name() {
        "AVX-512" => b"AVX-512\0",
        "AES-NI" => b"AES-NI\0",
        _ => b"Portable\0",
    };
    name.as_ptr() as *const core::ffi::c_char
}

/// Create a streaming hasher with default parameters.
#[unsafe(no_mangle)]
pub extern "C" fn tachyon_hasher_new() -> *mut TachyonHasher {
    Box::into_raw(Box::new(TachyonHasher {
        inner: Hasher::new(),
    }))
}

/// Create a streaming hasher under a domain tag.
#[unsafe(no_mangle)]
pub extern "C" fn tachyon_hasher_new_with_domain(domain: u64) -> *mut TachyonHasher {
    Box::into_raw(Box::new(TachyonHasher {
        inner: Hasher::with_domain(domain),
    }))
}

/// Create a streaming hasher with a seed.
#[unsafe(no_mangle)]
pub extern "C" fn tachyon_hasher_new_seeded(seed: u64) -> *mut TachyonHasher {
    Box::into_raw(Box::new(TachyonHasher {
        inner: Hasher::with_seed(seed),
    }))
}

/// Create a streaming hasher with explicit domain, seed, and optional key
/// (NULL for unkeyed).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hasher_new_full(
    domain: u64,
    seed: u64,
    key_ptr: *const u8,
) -> *mut TachyonHasher {
    let key = if key_ptr.is_null() {
        None
    } else {
        Some(unsafe { &*(key_ptr as *const [u8; KEY_SIZE]) })
    };
    Box::into_raw(Box::new(TachyonHasher {
        inner: Hasher::new_full(domain, seed, key),
    }))
}

/// Add data to a streaming hasher.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hasher_update(
    state: *mut TachyonHasher,
    data: *const u8,
    len: usize,
) {
    if state.is_null() || data.is_null() {
        return;
    }
    unsafe {
        (*state).inner.update(input_slice(data, len));
    }
}

/// Finalize a streaming hasher, writing the digest and freeing the handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hasher_finalize(state: *mut TachyonHasher, out_ptr: *mut u8) {
    if state.is_null() {
        return;
    }
    unsafe {
        let hasher = Box::from_raw(state);
        if !out_ptr.is_null() {
            let digest = hasher.inner.finalize();
            slice::from_raw_parts_mut(out_ptr, DIGEST_SIZE).copy_from_slice(&digest);
        }
    }
}

/// Free a streaming hasher without finalizing.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tachyon_hasher_free(state: *mut TachyonHasher) {
    if !state.is_null() {
        unsafe {
            drop(Box::from_raw(state));
        }
    }
}
