//! Portable (canonical) Tachyon kernel.
//!
//! The 512-byte permutation state is a flat array of 32 [`V128`]s, flat index
//! `i = lane * 4 + vec` over 8 lanes of 4 vectors. This module defines the
//! reference semantics; the AES-NI and AVX-512 kernels must produce
//! byte-identical digests and are tested against it.

use crate::params::*;
use crate::vector::{V128, clmul64};

/// Kernel state: 32 x 128-bit vectors plus the running block counter.
pub(crate) struct KernelState {
    pub(crate) v: [V128; STATE_VECTORS],
    block_count: u64,
}

#[inline(always)]
fn whitening() -> V128 {
    V128::new(WHITENING0, WHITENING1)
}

/// Pre-whiten one 64-byte sub-block into four vectors.
#[inline(always)]
fn load_whitened(bytes: &[u8]) -> [V128; 4] {
    let w = whitening();
    let mut d = [V128::default(); 4];
    for (j, dj) in d.iter_mut().enumerate() {
        *dj = V128::from_le_bytes(&bytes[j * 16..j * 16 + 16]).aes_round(w);
    }
    d
}

/// Finalization metadata vectors for domain `d` and total length `l`.
#[inline(always)]
fn meta_vectors(d: u64, l: u64) -> [V128; 4] {
    [
        V128::new(d ^ l, GOLDEN_RATIO),
        V128::new(l, d),
        V128::new(GOLDEN_RATIO, l),
        V128::new(d, GOLDEN_RATIO),
    ]
}

impl KernelState {
    /// Build the initial state from an optional seed and key.
    pub(crate) fn initialize(seed: u64, key: Option<&[u8; KEY_SIZE]>) -> Self {
        let mut v = [V128::default(); STATE_VECTORS];
        for lane in 0..LANES {
            let c = INIT_CONSTANTS[lane];
            for vec in 0..VECS_PER_LANE {
                v[lane * 4 + vec] = V128::new(
                    c.wrapping_add(2 * vec as u64),
                    c.wrapping_add(2 * vec as u64 + 1),
                );
            }
        }

        let s = if seed != 0 { seed } else { INIT_CONSTANTS[5] };
        let sv = V128::splat(s);
        for x in v.iter_mut() {
            *x = x.aes_round(sv);
        }

        if let Some(key) = key {
            let phi = V128::splat(GOLDEN_RATIO);
            let k0 = V128::from_le_bytes(&key[0..16]);
            let k1 = V128::from_le_bytes(&key[16..32]);
            let ks = [k0, k1, k0.xor(phi), k1.xor(phi)];
            for lane in 0..LANES {
                let off = V128::splat(LANE_OFFSETS[lane]);
                for (vec, &k) in ks.iter().enumerate() {
                    let x = &mut v[lane * 4 + vec];
                    *x = x.aes_round(k.add64(off)).aes_round(k);
                }
            }
        }

        Self { v, block_count: 0 }
    }

    /// Compress one full 512-byte block into the state.
    pub(crate) fn update(&mut self, block: &[u8]) {
        debug_assert_eq!(block.len(), BLOCK_SIZE);

        // Load and pre-whiten the 32 data vectors.
        let w = whitening();
        let mut d = [V128::default(); STATE_VECTORS];
        for (f, df) in d.iter_mut().enumerate() {
            *df = V128::from_le_bytes(&block[f * 16..f * 16 + 16]).aes_round(w);
        }

        let saves = self.v;
        let blk = V128::splat(self.block_count);

        for r in 0..10 {
            let rk = V128::from_pair(RK_CHAIN[r]);

            // Phase 1 maps data vectors directly; phase 2 shifts the data
            // lane index by four.
            for f in 0..STATE_VECTORS {
                let data_idx = if r < 5 {
                    f
                } else {
                    ((f / 4 + 4) % LANES) * 4 + (f % 4)
                };
                let material = d[data_idx]
                    .add64(rk)
                    .add64(V128::splat(LANE_OFFSETS[f]))
                    .add64(blk);
                self.v[f] = self.v[f].aes_round(material);
            }

            // Data feedback from the lane three places back.
            for lane in 0..LANES {
                let src = ((lane + 3) % LANES) * 4;
                for vec in 0..VECS_PER_LANE {
                    d[lane * 4 + vec] = d[lane * 4 + vec].xor(self.v[src + vec]);
                }
            }

            // Rotate accumulator lanes: lane i receives old lane i+1.
            self.v.rotate_left(VECS_PER_LANE);

            if r == 4 {
                self.mid_block_diffusion();
            }
        }

        // Davies-Meyer feed-forward.
        for lane in self.v.chunks_exact_mut(VECS_PER_LANE) {
            lane.rotate_left(1);
        }
        for (x, s) in self.v.iter_mut().zip(saves.iter()) {
            *x = x.xor(*s);
        }

        self.block_count += 1;
    }

    /// Cross-lane mixing between the two compression phases.
    fn mid_block_diffusion(&mut self) {
        // Rotate vectors within each lane.
        for lane in self.v.chunks_exact_mut(VECS_PER_LANE) {
            lane.rotate_left(1);
        }

        // Stage 1: pair lane i with lane i+4.
        for vec in 0..VECS_PER_LANE {
            for i in 0..4 {
                let lo = self.v[i * 4 + vec];
                let hi = self.v[(i + 4) * 4 + vec];
                self.v[i * 4 + vec] = lo.xor(hi);
                self.v[(i + 4) * 4 + vec] = hi.add64(lo);
            }
        }

        // Stage 2: pair within each half.
        for vec in 0..VECS_PER_LANE {
            for (a, b) in [(0, 2), (1, 3), (4, 6), (5, 7)] {
                let x = self.v[a * 4 + vec];
                let y = self.v[b * 4 + vec];
                self.v[a * 4 + vec] = x.xor(y);
                self.v[b * 4 + vec] = y.add64(x);
            }
        }
    }

    /// Absorb the remainder, merge, harden, commit metadata, and reduce to
    /// the 32-byte digest.
    pub(crate) fn finalize(
        mut self,
        remainder: &[u8],
        total_len: u64,
        domain: u64,
        key: Option<&[u8; KEY_SIZE]>,
        out: &mut [u8; DIGEST_SIZE],
    ) {
        debug_assert!(remainder.len() < BLOCK_SIZE);

        // Absorb whole 64-byte chunks of the remainder, one lane slice each.
        let mut off = 0;
        let mut chunk = 0;
        while remainder.len() - off >= SUB_BLOCK_SIZE && 4 * chunk < STATE_VECTORS {
            let base = 4 * chunk;
            let mut d = load_whitened(&remainder[off..off + SUB_BLOCK_SIZE]);
            let saves: [V128; 4] = self.v[base..base + 4].try_into().unwrap();
            let mut sl = saves;
            for r in 0..10 {
                let rk = V128::from_pair(RK_CHAIN[r]);
                for (j, x) in sl.iter_mut().enumerate() {
                    let material = d[j].add64(rk).add64(V128::splat(LANE_OFFSETS[base + j]));
                    *x = x.aes_round(material);
                }
                for k in 0..4 {
                    d[k] = d[k].xor(sl[(k + 1) % 4]);
                }
                sl.rotate_left(1);
            }
            for (x, s) in sl.iter_mut().zip(saves.iter()) {
                *x = x.xor(*s);
            }
            self.v[base..base + 4].copy_from_slice(&sl);
            off += SUB_BLOCK_SIZE;
            chunk += 1;
        }

        // Pad the leftover bytes: data, 0x80 marker, zeros.
        let leftover = &remainder[off..];
        let mut pad = [0u8; SUB_BLOCK_SIZE];
        pad[..leftover.len()].copy_from_slice(leftover);
        pad[leftover.len()] = 0x80;
        let d_pad = load_whitened(&pad);

        self.tree_merge();

        let mut sl: [V128; 4] = self.v[0..4].try_into().unwrap();
        clmul_harden(&mut sl);
        final_block(&mut sl, &d_pad, domain, total_len);

        if let Some(key) = key {
            absorb_key(&mut sl, key);
        }

        *out = reduce_lanes(&sl);
    }

    /// Binary merge 32 -> 16 -> 8 -> 4 vectors.
    fn tree_merge(&mut self) {
        let m = [
            V128::splat(INIT_CONSTANTS[5]),
            V128::splat(INIT_CONSTANTS[6]),
            V128::splat(INIT_CONSTANTS[7]),
        ];
        for (level, width) in [(0usize, 16usize), (1, 8), (2, 4)] {
            for i in 0..width {
                let partner = self.v[i + width].xor(m[level]);
                self.v[i] = self.v[i].aes_round(partner);
                self.v[i] = self.v[i].aes_round(self.v[i].xor(m[level]));
            }
        }
    }
}

/// Quadratic CLMUL hardening over the four surviving vectors.
#[inline(always)]
fn clmul_harden(sl: &mut [V128; 4]) {
    let k = V128::new(CLMUL_CONSTANT, CLMUL_CONSTANT2);
    for x in sl.iter_mut() {
        let cl1 = clmul64(x.lo, k.lo).xor(clmul64(x.hi, k.hi));
        let mid = x.aes_round(cl1);
        let cl2 = clmul64(mid.lo, mid.hi);
        *x = x.aes_round(cl1.xor(cl2));
    }
}

/// Absorb the padded tail together with the domain/length metadata.
#[inline(always)]
fn final_block(sl: &mut [V128; 4], d_pad: &[V128; 4], domain: u64, total_len: u64) {
    let saves = *sl;
    let meta = meta_vectors(domain, total_len);
    for i in 0..4 {
        sl[i] = sl[i].xor(d_pad[i]).xor(meta[i]);
    }

    let mut d = *d_pad;
    for r in 0..10 {
        let rk = V128::from_pair(RK_CHAIN[r]);
        for (x, dj) in sl.iter_mut().zip(d.iter()) {
            *x = x.aes_round(dj.add64(rk));
        }
        sl.rotate_left(1);
        if r % 2 == 1 {
            for (dj, x) in d.iter_mut().zip(sl.iter()) {
                *dj = dj.xor(*x);
            }
        }
    }

    for (x, s) in sl.iter_mut().zip(saves.iter()) {
        *x = x.xor(*s);
    }
}

/// Four fixed re-absorption rounds for keyed hashing.
#[inline(always)]
fn absorb_key(sl: &mut [V128; 4], key: &[u8; KEY_SIZE]) {
    let k0 = V128::from_le_bytes(&key[0..16]);
    let k1 = V128::from_le_bytes(&key[16..32]);
    const PATTERNS: [[usize; 4]; 4] = [[0, 1, 1, 0], [1, 0, 0, 1], [0, 1, 0, 1], [0, 0, 1, 1]];
    for pattern in PATTERNS {
        for (x, &sel) in sl.iter_mut().zip(pattern.iter()) {
            *x = x.aes_round(if sel == 0 { k0 } else { k1 });
        }
    }
}

/// Fold four vectors into the 256-bit digest.
#[inline(always)]
fn reduce_lanes(sl: &[V128; 4]) -> [u8; DIGEST_SIZE] {
    let m0 = V128::splat(INIT_CONSTANTS[5]);
    let m1 = V128::splat(INIT_CONSTANTS[6]);
    let m2 = V128::splat(INIT_CONSTANTS[7]);
    let zero = V128::default();

    let a: [V128; 4] = core::array::from_fn(|i| sl[i].aes_round(sl[i]));
    let b = [
        a[0].aes_round(a[2]),
        a[1].aes_round(a[3]),
        a[2].aes_round(a[0]),
        a[3].aes_round(a[1]),
    ];
    let c = [
        b[0].aes_round(b[1].xor(zero)),
        b[1].aes_round(b[0].xor(m2)),
        b[2].aes_round(b[3].xor(m1)),
        b[3].aes_round(b[2].xor(m0)),
    ];
    let d = [
        c[0].aes_round(c[2]),
        c[1].aes_round(c[3]),
        c[2].aes_round(c[0]),
        c[3].aes_round(c[1]),
    ];
    let e0 = d[0].aes_round(d[1].xor(zero));
    let e1 = d[1].aes_round(d[0].xor(m2));

    let mut out = [0u8; DIGEST_SIZE];
    out[0..16].copy_from_slice(&e0.to_le_bytes());
    out[16..32].copy_from_slice(&e1.to_le_bytes());
    out
}

/// Single-block fast path for `len < 64`, seed 0, no key.
fn short_oneshot(data: &[u8], domain: u64, out: &mut [u8; DIGEST_SIZE]) {
    debug_assert!(data.len() < SUB_BLOCK_SIZE);

    let mut pad = [0u8; SUB_BLOCK_SIZE];
    pad[..data.len()].copy_from_slice(data);
    pad[data.len()] = 0x80;
    let mut d = load_whitened(&pad);

    let mut acc: [V128; 4] = core::array::from_fn(|i| V128::from_pair(SHORT_INIT[i]));
    let saves = acc;
    let meta = meta_vectors(domain, data.len() as u64);
    for i in 0..4 {
        acc[i] = acc[i].xor(d[i]).xor(meta[i]);
    }

    for r in 0..10 {
        let rk = V128::from_pair(RK_CHAIN[r]);
        for (i, x) in acc.iter_mut().enumerate() {
            let material = d[i].add64(rk).add64(V128::splat(LANE_OFFSETS[i]));
            *x = x.aes_round(material);
        }
        if r % 2 == 1 {
            for k in 0..4 {
                d[k] = d[k].xor(acc[(k + 1) % 4]);
            }
        }
        acc.rotate_left(1);
    }

    for (x, s) in acc.iter_mut().zip(saves.iter()) {
        *x = x.xor(*s);
    }

    *out = reduce_lanes(&acc);
}

/// One-shot kernel entry for inputs below the Merkle chunk granularity.
pub(crate) fn oneshot(
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

    let mut state = KernelState::initialize(seed, key);
    let mut blocks = data.chunks_exact(BLOCK_SIZE);
    for block in blocks.by_ref() {
        state.update(block);
    }
    state.finalize(blocks.remainder(), data.len() as u64, domain, key, out);
}
