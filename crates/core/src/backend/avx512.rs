//! AVX-512 + VAES + VPCLMULQDQ kernel.
//!
//! One `__m512i` per lane packs the lane's four 128-bit vectors; qwords
//! `2j, 2j+1` hold vector `j`. The intra-lane vector rotation becomes a
//! `valignq` by two qwords, the cross-lane mixing and the tree merge become
//! whole-register operations, and the 4-lane reduction maps onto
//! `vshufi64x2` element swaps. Semantics are identical to the portable
//! kernel, including the finalize-remainder ordering.

#![allow(unsafe_op_in_unsafe_fn)]

use core::arch::x86_64::*;

use crate::params::*;

/// `LANE_OFFSETS[f]` duplicated into both qwords of each 128-bit element;
/// lane `L` loads qwords `8L..8L+8`.
const LANE_OFFSET_PAIRS: [u64; 64] = {
    let mut t = [0u64; 64];
    let mut f = 0;
    while f < 32 {
        t[2 * f] = LANE_OFFSETS[f];
        t[2 * f + 1] = LANE_OFFSETS[f];
        f += 1;
    }
    t
};

#[inline(always)]
unsafe fn splat(v: u64) -> __m512i {
    _mm512_set1_epi64(v as i64)
}

#[inline(always)]
unsafe fn bcast_pair(lo: u64, hi: u64) -> __m512i {
    _mm512_broadcast_i32x4(_mm_set_epi64x(hi as i64, lo as i64))
}

#[inline(always)]
unsafe fn load(bytes: &[u8]) -> __m512i {
    debug_assert!(bytes.len() >= 64);
    _mm512_loadu_epi64(bytes.as_ptr() as *const i64)
}

#[inline(always)]
unsafe fn load_qwords(q: &[u64; 8]) -> __m512i {
    _mm512_loadu_epi64(q.as_ptr() as *const i64)
}

/// Rotate the four 128-bit vectors of a lane left by one position.
#[inline(always)]
unsafe fn rotate_vecs(a: __m512i) -> __m512i {
    _mm512_alignr_epi64::<2>(a, a)
}

#[inline(always)]
unsafe fn lane_offsets(lane: usize) -> __m512i {
    _mm512_loadu_epi64(LANE_OFFSET_PAIRS[lane * 8..].as_ptr() as *const i64)
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn whiten(bytes: &[u8]) -> __m512i {
    let w = bcast_pair(WHITENING0, WHITENING1);
    _mm512_aesenc_epi128(load(bytes), w)
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn initialize(seed: u64, key: Option<&[u8; KEY_SIZE]>) -> [__m512i; LANES] {
    // Vector j of a lane is (C + 2j, C + 2j + 1), so qword q is simply C + q.
    let index = _mm512_set_epi64(7, 6, 5, 4, 3, 2, 1, 0);
    let mut v = [_mm512_setzero_si512(); LANES];
    for (lane, x) in v.iter_mut().enumerate() {
        *x = _mm512_add_epi64(splat(INIT_CONSTANTS[lane]), index);
    }

    let s = if seed != 0 { seed } else { INIT_CONSTANTS[5] };
    let sv = splat(s);
    for x in v.iter_mut() {
        *x = _mm512_aesenc_epi128(*x, sv);
    }

    if let Some(key) = key {
        let kz = load_qwords(&key_qwords(key));
        for (lane, x) in v.iter_mut().enumerate() {
            // Key absorption offsets are lane-indexed, not vector-indexed.
            let off = splat(LANE_OFFSETS[lane]);
            *x = _mm512_aesenc_epi128(*x, _mm512_add_epi64(kz, off));
            *x = _mm512_aesenc_epi128(*x, kz);
        }
    }

    v
}

/// The four key-schedule vectors (k0, k1, k0 ^ φ, k1 ^ φ) as qwords.
#[inline(always)]
fn key_qwords(key: &[u8; KEY_SIZE]) -> [u64; 8] {
    let k0lo = u64::from_le_bytes(key[0..8].try_into().unwrap());
    let k0hi = u64::from_le_bytes(key[8..16].try_into().unwrap());
    let k1lo = u64::from_le_bytes(key[16..24].try_into().unwrap());
    let k1hi = u64::from_le_bytes(key[24..32].try_into().unwrap());
    [
        k0lo,
        k0hi,
        k1lo,
        k1hi,
        k0lo ^ GOLDEN_RATIO,
        k0hi ^ GOLDEN_RATIO,
        k1lo ^ GOLDEN_RATIO,
        k1hi ^ GOLDEN_RATIO,
    ]
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn compress_block(v: &mut [__m512i; LANES], block: &[u8], block_count: u64) {
    let mut d = [_mm512_setzero_si512(); LANES];
    for (lane, dl) in d.iter_mut().enumerate() {
        *dl = whiten(&block[lane * 64..]);
    }

    let saves = *v;
    let blk = splat(block_count);

    for r in 0..10 {
        let rk = bcast_pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);

        for lane in 0..LANES {
            let data_lane = if r < 5 { lane } else { (lane + 4) % LANES };
            let material = _mm512_add_epi64(
                _mm512_add_epi64(d[data_lane], rk),
                _mm512_add_epi64(lane_offsets(lane), blk),
            );
            v[lane] = _mm512_aesenc_epi128(v[lane], material);
        }

        for lane in 0..LANES {
            d[lane] = _mm512_xor_si512(d[lane], v[(lane + 3) % LANES]);
        }

        v.rotate_left(1);

        if r == 4 {
            mid_block_diffusion(v);
        }
    }

    for (x, s) in v.iter_mut().zip(saves.iter()) {
        *x = _mm512_xor_si512(rotate_vecs(*x), *s);
    }
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn mid_block_diffusion(v: &mut [__m512i; LANES]) {
    for x in v.iter_mut() {
        *x = rotate_vecs(*x);
    }

    for i in 0..4 {
        let lo = v[i];
        let hi = v[i + 4];
        v[i] = _mm512_xor_si512(lo, hi);
        v[i + 4] = _mm512_add_epi64(hi, lo);
    }

    for (a, b) in [(0, 2), (1, 3), (4, 6), (5, 7)] {
        let x = v[a];
        let y = v[b];
        v[a] = _mm512_xor_si512(x, y);
        v[b] = _mm512_add_epi64(y, x);
    }
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn tree_merge(v: &mut [__m512i; LANES]) {
    let m = [
        splat(INIT_CONSTANTS[5]),
        splat(INIT_CONSTANTS[6]),
        splat(INIT_CONSTANTS[7]),
    ];
    for (level, width) in [(0usize, 4usize), (1, 2), (2, 1)] {
        for i in 0..width {
            let partner = _mm512_xor_si512(v[i + width], m[level]);
            v[i] = _mm512_aesenc_epi128(v[i], partner);
            v[i] = _mm512_aesenc_epi128(v[i], _mm512_xor_si512(v[i], m[level]));
        }
    }
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn clmul_harden(sl: __m512i) -> __m512i {
    let k = bcast_pair(CLMUL_CONSTANT, CLMUL_CONSTANT2);
    let cl1 = _mm512_xor_si512(
        _mm512_clmulepi64_epi128::<0x00>(sl, k),
        _mm512_clmulepi64_epi128::<0x11>(sl, k),
    );
    let mid = _mm512_aesenc_epi128(sl, cl1);
    let cl2 = _mm512_clmulepi64_epi128::<0x10>(mid, mid);
    _mm512_aesenc_epi128(sl, _mm512_xor_si512(cl1, cl2))
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn final_block(mut sl: __m512i, d_pad: __m512i, domain: u64, total_len: u64) -> __m512i {
    let saves = sl;
    let phi = GOLDEN_RATIO as i64;
    let meta = _mm512_set_epi64(
        phi,
        domain as i64,
        total_len as i64,
        phi,
        domain as i64,
        total_len as i64,
        phi,
        (domain ^ total_len) as i64,
    );
    sl = _mm512_xor_si512(sl, _mm512_xor_si512(d_pad, meta));

    let mut d = d_pad;
    for r in 0..10 {
        let rk = bcast_pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
        sl = _mm512_aesenc_epi128(sl, _mm512_add_epi64(d, rk));
        sl = rotate_vecs(sl);
        if r % 2 == 1 {
            d = _mm512_xor_si512(d, sl);
        }
    }

    _mm512_xor_si512(sl, saves)
}

/// Build one re-absorption round key: `sel[j]` picks k0 or k1 for vector `j`.
#[inline(always)]
fn key_round_qwords(key: &[u8; KEY_SIZE], sel: [usize; 4]) -> [u64; 8] {
    let k0lo = u64::from_le_bytes(key[0..8].try_into().unwrap());
    let k0hi = u64::from_le_bytes(key[8..16].try_into().unwrap());
    let k1lo = u64::from_le_bytes(key[16..24].try_into().unwrap());
    let k1hi = u64::from_le_bytes(key[24..32].try_into().unwrap());
    let mut q = [0u64; 8];
    for (j, &s) in sel.iter().enumerate() {
        q[2 * j] = if s == 0 { k0lo } else { k1lo };
        q[2 * j + 1] = if s == 0 { k0hi } else { k1hi };
    }
    q
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn absorb_key(mut sl: __m512i, key: &[u8; KEY_SIZE]) -> __m512i {
    for pattern in [[0, 1, 1, 0], [1, 0, 0, 1], [0, 1, 0, 1], [0, 0, 1, 1]] {
        sl = _mm512_aesenc_epi128(sl, load_qwords(&key_round_qwords(key, pattern)));
    }
    sl
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn reduce_lanes(sl: __m512i, out: &mut [u8; DIGEST_SIZE]) {
    // Per-element constants (zero, M2, M1, M0) for the cross stages.
    let mswap = _mm512_set_epi64(
        INIT_CONSTANTS[5] as i64,
        INIT_CONSTANTS[5] as i64,
        INIT_CONSTANTS[6] as i64,
        INIT_CONSTANTS[6] as i64,
        INIT_CONSTANTS[7] as i64,
        INIT_CONSTANTS[7] as i64,
        0,
        0,
    );

    let a = _mm512_aesenc_epi128(sl, sl);
    // Key element j = a[(j + 2) mod 4].
    let b = _mm512_aesenc_epi128(a, _mm512_shuffle_i64x2::<0x4E>(a, a));
    // Key element j = b[j ^ 1] xor (zero, M2, M1, M0)[j].
    let c = _mm512_aesenc_epi128(
        b,
        _mm512_xor_si512(_mm512_shuffle_i64x2::<0xB1>(b, b), mswap),
    );
    let d = _mm512_aesenc_epi128(c, _mm512_shuffle_i64x2::<0x4E>(c, c));
    let e = _mm512_aesenc_epi128(
        d,
        _mm512_xor_si512(_mm512_shuffle_i64x2::<0xB1>(d, d), mswap),
    );

    let mut q = [0u64; 8];
    _mm512_storeu_epi64(q.as_mut_ptr() as *mut i64, e);
    for (i, w) in q[..4].iter().enumerate() {
        out[i * 8..i * 8 + 8].copy_from_slice(&w.to_le_bytes());
    }
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn finalize(
    v: &mut [__m512i; LANES],
    remainder: &[u8],
    total_len: u64,
    domain: u64,
    key: Option<&[u8; KEY_SIZE]>,
    out: &mut [u8; DIGEST_SIZE],
) {
    let mut off = 0;
    let mut chunk = 0;
    while remainder.len() - off >= SUB_BLOCK_SIZE && chunk < LANES {
        let mut d = whiten(&remainder[off..]);
        let saves = v[chunk];
        let mut sl = saves;
        let offs = lane_offsets(chunk);
        for r in 0..10 {
            let rk = bcast_pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
            sl = _mm512_aesenc_epi128(sl, _mm512_add_epi64(d, _mm512_add_epi64(rk, offs)));
            let rotated = rotate_vecs(sl);
            d = _mm512_xor_si512(d, rotated);
            sl = rotated;
        }
        v[chunk] = _mm512_xor_si512(sl, saves);
        off += SUB_BLOCK_SIZE;
        chunk += 1;
    }

    let leftover = &remainder[off..];
    let mut pad = [0u8; SUB_BLOCK_SIZE];
    pad[..leftover.len()].copy_from_slice(leftover);
    pad[leftover.len()] = 0x80;
    let d_pad = whiten(&pad);

    tree_merge(v);

    let mut sl = clmul_harden(v[0]);
    sl = final_block(sl, d_pad, domain, total_len);

    if let Some(key) = key {
        sl = absorb_key(sl, key);
    }

    reduce_lanes(sl, out);
}

#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
unsafe fn short_oneshot(data: &[u8], domain: u64, out: &mut [u8; DIGEST_SIZE]) {
    let mut pad = [0u8; SUB_BLOCK_SIZE];
    pad[..data.len()].copy_from_slice(data);
    pad[data.len()] = 0x80;
    let mut d = whiten(&pad);

    const SHORT_INIT_QWORDS: [u64; 8] = [
        SHORT_INIT[0][0],
        SHORT_INIT[0][1],
        SHORT_INIT[1][0],
        SHORT_INIT[1][1],
        SHORT_INIT[2][0],
        SHORT_INIT[2][1],
        SHORT_INIT[3][0],
        SHORT_INIT[3][1],
    ];
    let saves = load_qwords(&SHORT_INIT_QWORDS);
    let len = data.len() as u64;
    let phi = GOLDEN_RATIO as i64;
    let meta = _mm512_set_epi64(
        phi,
        domain as i64,
        len as i64,
        phi,
        domain as i64,
        len as i64,
        phi,
        (domain ^ len) as i64,
    );
    let mut acc = _mm512_xor_si512(saves, _mm512_xor_si512(d, meta));

    let offs = lane_offsets(0);
    for r in 0..10 {
        let rk = bcast_pair(RK_CHAIN[r][0], RK_CHAIN[r][1]);
        acc = _mm512_aesenc_epi128(acc, _mm512_add_epi64(d, _mm512_add_epi64(rk, offs)));
        let rotated = rotate_vecs(acc);
        if r % 2 == 1 {
            d = _mm512_xor_si512(d, rotated);
        }
        acc = rotated;
    }

    acc = _mm512_xor_si512(acc, saves);
    reduce_lanes(acc, out);
}

/// One-shot kernel entry.
///
/// # Safety
///
/// The CPU must support AVX-512F/BW, VAES, and VPCLMULQDQ, with ZMM state
/// enabled by the OS.
#[target_feature(enable = "avx512f,avx512bw,vaes,vpclmulqdq")]
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
