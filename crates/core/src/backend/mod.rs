//! Back-end selection and dispatch.
//!
//! The probe runs once, lazily, and caches its verdict in an atomic; a
//! redundant probe under a racing first call writes the same value. AVX-512
//! is only selected when AVX-512F/BW, VAES, and VPCLMULQDQ are all present
//! and the OS saves the ZMM register state (`cpufeatures` performs the
//! CPUID and XGETBV checks). The `force-scalar` and `force-aesni` features
//! pin the selection at build time. All back-ends produce identical digests.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::params::{DIGEST_SIZE, KEY_SIZE};

#[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
mod aesni;
#[cfg(all(
    target_arch = "x86_64",
    not(feature = "force-scalar"),
    not(feature = "force-aesni")
))]
mod avx512;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub(crate) enum Backend {
    Scalar = 1,
    AesNi = 2,
    Avx512 = 3,
}

static SELECTED: AtomicU8 = AtomicU8::new(0);

#[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
cpufeatures::new!(cpuid_aesni, "aes", "pclmulqdq");

#[cfg(all(
    target_arch = "x86_64",
    not(feature = "force-scalar"),
    not(feature = "force-aesni")
))]
cpufeatures::new!(cpuid_avx512, "avx512f", "avx512bw", "vaes", "vpclmulqdq");

fn probe() -> Backend {
    #[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
    if cpuid_aesni::get() {
        #[cfg(not(feature = "force-aesni"))]
        if cpuid_avx512::get() {
            return Backend::Avx512;
        }
        return Backend::AesNi;
    }
    Backend::Scalar
}

pub(crate) fn selected() -> Backend {
    match SELECTED.load(Ordering::Relaxed) {
        0 => {
            let backend = probe();
            SELECTED.store(backend as u8, Ordering::Relaxed);
            backend
        }
        1 => Backend::Scalar,
        2 => Backend::AesNi,
        _ => Backend::Avx512,
    }
}

/// Name of the kernel the dispatcher settled on.
pub fn backend_name() -> &'static str {
    match selected() {
        Backend::Scalar => "Portable",
        Backend::AesNi => "AES-NI",
        Backend::Avx512 => "AVX-512",
    }
}

/// One-shot kernel call through the selected back-end.
pub(crate) fn kernel_oneshot(
    data: &[u8],
    domain: u64,
    seed: u64,
    key: Option<&[u8; KEY_SIZE]>,
    out: &mut [u8; DIGEST_SIZE],
) {
    match selected() {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
        Backend::AesNi => {
            // SAFETY: the probe verified AES-NI and PCLMULQDQ support.
            unsafe { aesni::oneshot(data, domain, seed, key, out) }
        }
        #[cfg(all(
            target_arch = "x86_64",
            not(feature = "force-scalar"),
            not(feature = "force-aesni")
        ))]
        Backend::Avx512 => {
            // SAFETY: the probe verified the full AVX-512 feature set.
            unsafe { avx512::oneshot(data, domain, seed, key, out) }
        }
        _ => crate::kernel::oneshot(data, domain, seed, key, out),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Direct access to individual kernels for equivalence tests.

    use super::*;

    pub(crate) fn scalar_oneshot(
        data: &[u8],
        domain: u64,
        seed: u64,
        key: Option<&[u8; KEY_SIZE]>,
        out: &mut [u8; DIGEST_SIZE],
    ) {
        crate::kernel::oneshot(data, domain, seed, key, out);
    }

    #[cfg(all(target_arch = "x86_64", not(feature = "force-scalar")))]
    pub(crate) fn aesni_oneshot(
        data: &[u8],
        domain: u64,
        seed: u64,
        key: Option<&[u8; KEY_SIZE]>,
        out: &mut [u8; DIGEST_SIZE],
    ) -> bool {
        if !cpuid_aesni::get() {
            return false;
        }
        // SAFETY: support checked just above.
        unsafe { aesni::oneshot(data, domain, seed, key, out) };
        true
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(feature = "force-scalar"),
        not(feature = "force-aesni")
    ))]
    pub(crate) fn avx512_oneshot(
        data: &[u8],
        domain: u64,
        seed: u64,
        key: Option<&[u8; KEY_SIZE]>,
        out: &mut [u8; DIGEST_SIZE],
    ) -> bool {
        if !cpuid_avx512::get() {
            return false;
        }
        // SAFETY: support checked just above.
        unsafe { avx512::oneshot(data, domain, seed, key, out) };
        true
    }
}
