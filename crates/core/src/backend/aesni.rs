//! AES-NI + PCLMULQDQ kernel.
//!
//! One `__m128i` per state vector, same flat layout as the portable kernel.
//! Every function in this module requires the `aes` and `pclmulqdq` target
//! features; callers must verify support before entering.

#![allow(unsafe_op_in_unsafe_fn)]

use core::arch::x86_64::*;

use crate::params::*;

#[inline(always)]
unsafe fn pair(lo: u64, hi: u64) -> __m128i {
    _mm_set_epi64x(hi as i64, lo as i64)
}

#[inline(always)]
unsafe fn splat(v: u64) -> __m128i {
    _mm_set1_epi64x(v as i64)
}

#[inline(always)]
unsafe fn load(bytes: &[u8]) -> __m128i {
    debug_assert!(bytes.len() >= 16);
    _mm_loadu_si128(bytes.as_ptr() as *const __m128i)
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn whiten(bytes: &[u8], d: &mut [__m128i]) {
    let w = pair(WHITENING0, WHITENING1);
    for (j, dj) in d.iter_mut().enumerate() {
        *dj = _mm_aesenc_si128(load(&bytes[j * 16..]), w);
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn initialize(seed: u64, key: Option<&[u8; KEY_SIZE]>) -> [__m128i; STATE_VECTORS] {
    let mut v = [_mm_setzero_si128(); STATE_VECTORS];
    for lane in 0..LANES {
        let c = INIT_CONSTANTS[lane];
        for vec in 0..VECS_PER_LANE {
            v[lane * 4 + vec] = pair(
                c.wrapping_add(2 * vec as u64),
                c.wrapping_add(2 * vec as u64 + 1),
            );
        }
    }

    let s = if seed != 0 { seed } else { INIT_CONSTANTS[5] };
    let sv = splat(s);
    for x in v.iter_mut() {
        *x = _mm_aesenc_si128(*x, sv);
    }

    if let Some(key) = key {
        let phi = splat(GOLDEN_RATIO);
        let k0 = load(&key[0..16]);
        let k1 = load(&key[16..32]);
        let ks = [k0, k1, _mm_xor_si128(k0, phi), _mm_xor_si128(k1, phi)];
        for lane in 0..LANES {
            let off = splat(LANE_OFFSETS[lane]);
            for (vec, &k) in ks.iter().enumerate() {
                let x = &mut v[lane * 4 + vec];
                *x = _mm_aesenc_si128(*x, _mm_add_epi64(k, off));
                *x = _mm_aesenc_si128(*x, k);
            }
        }
    }

    v
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn compress_block(v: &mut [__m128i; STATE_VECTORS], block: &[u8], block_count: u64) {
    let mut d = [_mm_setzero_si128(); STATE_VECTORS];
    whiten(block, &mut d);

    let saves = *v;
    let blk = splat(block_count);

    for r in 0..10 {
        let rk = pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);

        for f in 0..STATE_VECTORS {
            let data_idx = if r < 5 {
                f
            } else {
                ((f / 4 + 4) % LANES) * 4 + (f % 4)
            };
            let material = _mm_add_epi64(
                _mm_add_epi64(d[data_idx], rk),
                _mm_add_epi64(splat(LANE_OFFSETS[f]), blk),
            );
            v[f] = _mm_aesenc_si128(v[f], material);
        }

        for lane in 0..LANES {
            let src = ((lane + 3) % LANES) * 4;
            for vec in 0..VECS_PER_LANE {
                d[lane * 4 + vec] = _mm_xor_si128(d[lane * 4 + vec], v[src + vec]);
            }
        }

        v.rotate_left(VECS_PER_LANE);

        if r == 4 {
            mid_block_diffusion(v);
        }
    }

    for lane in v.chunks_exact_mut(VECS_PER_LANE) {
        lane.rotate_left(1);
    }
    for (x, s) in v.iter_mut().zip(saves.iter()) {
        *x = _mm_xor_si128(*x, *s);
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn mid_block_diffusion(v: &mut [__m128i; STATE_VECTORS]) {
    for lane in v.chunks_exact_mut(VECS_PER_LANE) {
        lane.rotate_left(1);
    }

    for vec in 0..VECS_PER_LANE {
        for i in 0..4 {
            let lo = v[i * 4 + vec];
            let hi = v[(i + 4) * 4 + vec];
            v[i * 4 + vec] = _mm_xor_si128(lo, hi);
            v[(i + 4) * 4 + vec] = _mm_add_epi64(hi, lo);
        }
    }

    for vec in 0..VECS_PER_LANE {
        for (a, b) in [(0, 2), (1, 3), (4, 6), (5, 7)] {
            let x = v[a * 4 + vec];
            let y = v[b * 4 + vec];
            v[a * 4 + vec] = _mm_xor_si128(x, y);
            v[b * 4 + vec] = _mm_add_epi64(y, x);
        }
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn tree_merge(v: &mut [__m128i; STATE_VECTORS]) {
    let m = [
        splat(INIT_CONSTANTS[5]),
        splat(INIT_CONSTANTS[6]),
        splat(INIT_CONSTANTS[7]),
    ];
    for (level, width) in [(0usize, 16usize), (1, 8), (2, 4)] {
        for i in 0..width {
            let partner = _mm_xor_si128(v[i + width], m[level]);
            v[i] = _mm_aesenc_si128(v[i], partner);
            v[i] = _mm_aesenc_si128(v[i], _mm_xor_si128(v[i], m[level]));
        }
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn clmul_harden(sl: &mut [__m128i; 4]) {
    let k = pair(CLMUL_CONSTANT, CLMUL_CONSTANT2);
    for x in sl.iter_mut() {
        let cl1 = _mm_xor_si128(
            _mm_clmulepi64_si128::<0x00>(*x, k),
            _mm_clmulepi64_si128::<0x11>(*x, k),
        );
        let mid = _mm_aesenc_si128(*x, cl1);
        let cl2 = _mm_clmulepi64_si128::<0x10>(mid, mid);
        *x = _mm_aesenc_si128(*x, _mm_xor_si128(cl1, cl2));
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn final_block(sl: &mut [__m128i; 4], d_pad: &[__m128i; 4], domain: u64, total_len: u64) {
    let saves = *sl;
    let meta = [
        pair(domain ^ total_len, GOLDEN_RATIO),
        pair(total_len, domain),
        pair(GOLDEN_RATIO, total_len),
        pair(domain, GOLDEN_RATIO),
    ];
    for i in 0..4 {
        sl[i] = _mm_xor_si128(sl[i], _mm_xor_si128(d_pad[i], meta[i]));
    }

    let mut d = *d_pad;
    for r in 0..10 {
        let rk = pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
        for (x, dj) in sl.iter_mut().zip(d.iter()) {
            *x = _mm_aesenc_si128(*x, _mm_add_epi64(*dj, rk));
        }
        sl.rotate_left(1);
        if r % 2 == 1 {
            for (dj, x) in d.iter_mut().zip(sl.iter()) {
                *dj = _mm_xor_si128(*dj, *x);
            }
        }
    }

    for (x, s) in sl.iter_mut().zip(saves.iter()) {
        *x = _mm_xor_si128(*x, *s);
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn absorb_key(sl: &mut [__m128i; 4], key: &[u8; KEY_SIZE]) {
    let k0 = load(&key[0..16]);
    let k1 = load(&key[16..32]);
    const PATTERNS: [[usize; 4]; 4] = [[0, 1, 1, 0], [1, 0, 0, 1], [0, 1, 0, 1], [0, 0, 1, 1]];
    for pattern in PATTERNS {
        for (x, &sel) in sl.iter_mut().zip(pattern.iter()) {
            *x = _mm_aesenc_si128(*x, if sel == 0 { k0 } else { k1 });
        }
    }
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn reduce_lanes(sl: &[__m128i; 4], out: &mut [u8; DIGEST_SIZE]) {
    let m0 = splat(INIT_CONSTANTS[5]);
    let m1 = splat(INIT_CONSTANTS[6]);
    let m2 = splat(INIT_CONSTANTS[7]);

    let a = [
        _mm_aesenc_si128(sl[0], sl[0]),
        _mm_aesenc_si128(sl[1], sl[1]),
        _mm_aesenc_si128(sl[2], sl[2]),
        _mm_aesenc_si128(sl[3], sl[3]),
    ];
    let b = [
        _mm_aesenc_si128(a[0], a[2]),
        _mm_aesenc_si128(a[1], a[3]),
        _mm_aesenc_si128(a[2], a[0]),
        _mm_aesenc_si128(a[3], a[1]),
    ];
    let c = [
        _mm_aesenc_si128(b[0], b[1]),
        _mm_aesenc_si128(b[1], _mm_xor_si128(b[0], m2)),
        _mm_aesenc_si128(b[2], _mm_xor_si128(b[3], m1)),
        _mm_aesenc_si128(b[3], _mm_xor_si128(b[2], m0)),
    ];
    let d = [
        _mm_aesenc_si128(c[0], c[2]),
        _mm_aesenc_si128(c[1], c[3]),
        _mm_aesenc_si128(c[2], c[0]),
        _mm_aesenc_si128(c[3], c[1]),
    ];
    let e0 = _mm_aesenc_si128(d[0], d[1]);
    let e1 = _mm_aesenc_si128(d[1], _mm_xor_si128(d[0], m2));

    _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, e0);
    _mm_storeu_si128(out.as_mut_ptr().add(16) as *mut __m128i, e1);
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn finalize(
    v: &mut [__m128i; STATE_VECTORS],
    remainder: &[u8],
    total_len: u64,
    domain: u64,
    key: Option<&[u8; KEY_SIZE]>,
    out: &mut [u8; DIGEST_SIZE],
) {
    let mut off = 0;
    let mut chunk = 0;
    while remainder.len() - off >= SUB_BLOCK_SIZE && 4 * chunk < STATE_VECTORS {
        let base = 4 * chunk;
        let mut d = [_mm_setzero_si128(); 4];
        whiten(&remainder[off..off + SUB_BLOCK_SIZE], &mut d);
        let saves = [v[base], v[base + 1], v[base + 2], v[base + 3]];
        let mut sl = saves;
        for r in 0..10 {
            let rk = pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
            for (j, x) in sl.iter_mut().enumerate() {
                let material =
                    _mm_add_epi64(_mm_add_epi64(d[j], rk), splat(LANE_OFFSETS[base + j]));
                *x = _mm_aesenc_si128(*x, material);
            }
            for k in 0..4 {
                d[k] = _mm_xor_si128(d[k], sl[(k + 1) % 4]);
            }
            sl.rotate_left(1);
        }
        for (x, s) in sl.iter_mut().zip(saves.iter()) {
            *x = _mm_xor_si128(*x, *s);
        }
        v[base..base + 4].copy_from_slice(&sl);
        off += SUB_BLOCK_SIZE;
        chunk += 1;
    }

    let leftover = &remainder[off..];
    let mut pad = [0u8; SUB_BLOCK_SIZE];
    pad[..leftover.len()].copy_from_slice(leftover);
    pad[leftover.len()] = 0x80;
    let mut d_pad = [_mm_setzero_si128(); 4];
    whiten(&pad, &mut d_pad);

    tree_merge(v);

    let mut sl = [v[0], v[1], v[2], v[3]];
    clmul_harden(&mut sl);
    final_block(&mut sl, &d_pad, domain, total_len);

    if let Some(key) = key {
        absorb_key(&mut sl, key);
    }

    reduce_lanes(&sl, out);
}

#[target_feature(enable = "aes,pclmulqdq")]
unsafe fn short_oneshot(data: &[u8], domain: u64, out: &mut [u8; DIGEST_SIZE]) {
    let mut pad = [0u8; SUB_BLOCK_SIZE];
    pad[..data.len()].copy_from_slice(data);
    pad[data.len()] = 0x80;
    let mut d = [_mm_setzero_si128(); 4];
    whiten(&pad, &mut d);

    let mut acc = [
        pair(SHORT_INIT[0][0], SHORT_INIT[0][1]),
        pair(SHORT_INIT[1][0], SHORT_INIT[1][1]),
        pair(SHORT_INIT[2][0], SHORT_INIT[2][1]),
        pair(SHORT_INIT[3][0], SHORT_INIT[3][1]),
    ];
    let saves = acc;
    let len = data.len() as u64;
    let meta = [
        pair(domain ^ len, GOLDEN_RATIO),
        pair(len, domain),
        pair(GOLDEN_RATIO, len),
        pair(domain, GOLDEN_RATIO),
    ];
    for i in 0..4 {
        acc[i] = _mm_xor_si128(acc[i], _mm_xor_si128(d[i], meta[i]));
    }

    for r in 0..10 {
        let rk = pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
        for (i, x) in acc.iter_mut().enumerate() {
            let material = _mm_add_epi64(_mm_add_epi64(d[i], rk), splat(LANE_OFFSETS[i]));
            *x = _mm_aesenc_si128(*x, material);
        }
        if r % 2 == 1 {
            for k in 0..4 {
                d[k] = _mm_xor_si128(d[k], acc[(k + 1) % 4]);
            }
        }
        acc.rotate_left(1);
    }

    for (x, s) in acc.iter_mut().zip(saves.iter()) {
        *x = _mm_xor_si128(*x, *s);
    }

    reduce_lanes(&acc, out);
}

/// One-shot kernel entry.
///
/// # Safety
///
/// The CPU must support AES-NI and PCLMULQDQ.
#[target_feature(enable = "aes,pclmulqdq")]
pub(crate) unsafe fn oneshot(
    data: &[u8],
    domain: u64,
    seed: u64,
    key: Option<&[u8; KEY_SIZE]>,
    out: &mut [u8; DIGEST_SIZE],
) {
    if data.len() < SUB_BLOCK_SIZE && seed == 0 && key.is_none() {
        short_oneshot(data, domain, out);
        return;
    }

    let mut v = initialize(seed, key);
    let mut block_count = 0u64;
    let mut blocks = data.chunks_exact(BLOCK_SIZE);
    for block in blocks.by_ref() {
        compress_block(&mut v, block, block_count);
        block_count += 1;
    }
    finalize(
        &mut v,
        blocks.remainder(),
        data.len() as u64,
        domain,
        key,
        out,
    );
}
