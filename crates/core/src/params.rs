//! Tachyon algorithm parameters and constant tables.
//!
//! Every ln-derived constant follows a single rule:
//!
//! ```text
//! constant = floor(frac(ln(p)) * 2^64)
//! ```
//!
//! evaluated in IEEE-754 double precision, where `p` is a prime and
//! `frac(x) = x - floor(x)`. Reproduce any entry with:
//!
//! ```text
//! python3 -c "import math; p=2; print(hex(int((math.log(p)%1)*2**64)))"
//! ```
//!
//! Prime assignment (consecutive, partitioned by purpose):
//! - `C0..C3, C5..C7`      : ln(2, 3, 5, 7, 11, 13, 17)
//! - `WHITENING0/1`        : ln(19), ln(23)
//! - `CLMUL_CONSTANT2`     : ln(29)
//! - `CLMUL_CONSTANT`      : ln(31)
//! - `LANE_OFFSETS`        : ln(37..191), 32 consecutive primes
//! - `C4`                  : golden ratio φ
//!
//! `RK_CHAIN` and `SHORT_INIT` are derived values; the test suite regenerates
//! both from scratch and fails if the tables drift.

/// Digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Key size in bytes for the keyed (MAC) mode.
pub const KEY_SIZE: usize = 32;

/// Compression block size in bytes (8 lanes x 64 bytes).
pub const BLOCK_SIZE: usize = 512;

/// Remainder / pad absorption unit in bytes (one lane's worth).
pub const SUB_BLOCK_SIZE: usize = 64;

/// Merkle leaf chunk size in bytes (256 KiB).
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Number of lanes in the kernel state.
pub const LANES: usize = 8;

/// 128-bit vectors per lane.
pub const VECS_PER_LANE: usize = 4;

/// Total 128-bit vectors in the kernel state.
pub const STATE_VECTORS: usize = LANES * VECS_PER_LANE;

/// Generic (default) domain.
pub const DOMAIN_GENERIC: u64 = 0;
/// File checksum domain.
pub const DOMAIN_FILE_CHECKSUM: u64 = 1;
/// Key derivation domain, used by [`crate::derive_key`].
pub const DOMAIN_KEY_DERIVATION: u64 = 2;
/// Message authentication domain, used by [`crate::hash_keyed`].
pub const DOMAIN_MESSAGE_AUTH: u64 = 3;
/// Database index domain.
pub const DOMAIN_DATABASE_INDEX: u64 = 4;
/// Content-addressed storage domain.
pub const DOMAIN_CONTENT_ADDRESSED: u64 = 5;

/// Internal domain tag for Merkle leaf chunks. Domains with the high 32 bits
/// all-set are reserved; external callers must not pass them.
pub const DOMAIN_MERKLE_LEAF: u64 = 0xFFFF_FFFF_0000_0000;
/// Internal domain tag for Merkle interior nodes.
pub const DOMAIN_MERKLE_NODE: u64 = 0xFFFF_FFFF_0000_0001;

/// φ as a 64-bit integer: `floor(2^64 / φ)`. Also serves as `C4`.
pub const GOLDEN_RATIO: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-lane initialization constants `C0..C7`.
pub const INIT_CONSTANTS: [u64; 8] = [
    0xB172_17F7_D1CF_7800, // ln(2)
    0x193E_A7AA_D030_B000, // ln(3)
    0x9C04_1F7E_D8D3_3000, // ln(5)
    0xF227_2AE3_25A5_7000, // ln(7)
    GOLDEN_RATIO,          // φ
    0x65DC_76EF_E6E9_8000, // ln(11)
    0x90A0_8566_318A_2000, // ln(13)
    0xD54D_783F_4FEF_4000, // ln(17)
];

/// Data pre-whitening constant, low half of the whitening vector. ln(19).
pub const WHITENING0: u64 = 0xF1C6_C0C0_9665_8000;
/// Data pre-whitening constant, high half of the whitening vector. ln(23).
pub const WHITENING1: u64 = 0x22AF_BFBA_367E_0000;

/// CLMUL hardening constant, low half of the multiplier vector. ln(31).
pub const CLMUL_CONSTANT: u64 = 0x6F19_C912_256B_4000;
/// CLMUL hardening constant, high half of the multiplier vector. ln(29).
pub const CLMUL_CONSTANT2: u64 = 0x5E07_1979_BFC3_E000;

/// Per-vector additive offsets, ln of the 32 consecutive primes 37..191.
pub const LANE_OFFSETS: [u64; 32] = [
    0x9C65_1DC7_58F7_A000, // ln(37)
    0xB6AC_A8B1_D589_C000, // ln(41)
    0xC2DE_02C2_9D82_2000, // ln(43)
    0xD9A3_45F2_1E16_C000, // ln(47)
    0xF865_0D04_4795_6000, // ln(53)
    0x13D9_7E71_CA5E_4000, // ln(59)
    0x1C62_3AC4_9B03_4000, // ln(61)
    0x3466_BC4A_044B_4000, // ln(67)
    0x433E_FD09_35B2_4000, // ln(71)
    0x4A5B_8CC8_8BF9_8000, // ln(73)
    0x5E94_226B_EC5C_C000, // ln(79)
    0x6B39_2358_B920_8000, // ln(83)
    0x7D17_45EB_A2BD_8000, // ln(89)
    0x9320_4239_52FE_0000, // ln(97)
    0x9D78_89C6_EE8C_4000, // ln(101)
    0xA27D_9956_44FB_0000, // ln(103)
    0xAC3E_82AF_D1D6_C000, // ln(107)
    0xB0FC_2CC0_5541_8000, // ln(109)
    0xBA36_168C_E0D7_0000, // ln(113)
    0xD81C_A518_0B90_8000, // ln(127)
    0xE00C_EE88_B218_8000, // ln(131)
    0xEB83_DEB5_6027_4000, // ln(137)
    0xEF39_AF05_C2C4_8000, // ln(139)
    0x0102_A006_F9CB_4000, // ln(149)
    0x046C_738E_0014_C000, // ln(151)
    0x0E66_2006_8217_0000, // ln(157)
    0x1800_035E_755E_C000, // ln(163)
    0x1E34_D7AD_75D7_C000, // ln(167)
    0x273E_1E31_1EA1_C000, // ln(173)
    0x2FF8_8423_D216_0000, // ln(179)
    0x32D0_B391_A3CA_C000, // ln(181)
    0x4094_FDCB_1C2E_8000, // ln(191)
];

/// Precomputed round-key chain: the trajectory of `v <- AES_ROUND(v, v)`
/// starting from `v = (φ, φ)`. Entry `r` holds `(lo, hi)` of the vector used
/// in mixing round `r`.
pub const RK_CHAIN: [[u64; 2]; 10] = [
    [0x5133_686D_E20F_38BB, 0x5133_686D_E20F_38BB],
    [0xFA26_9C47_4D24_131C, 0xFA26_9C47_4D24_131C],
    [0x5630_278F_407D_5F5D, 0x5630_278F_407D_5F5D],
    [0x1A9F_D42E_DED0_3BC4, 0x1A9F_D42E_DED0_3BC4],
    [0x4AC6_51B7_9D99_85F6, 0x4AC6_51B7_9D99_85F6],
    [0x3569_54B6_D3AC_8122, 0x3569_54B6_D3AC_8122],
    [0xDE68_74A1_FB87_6C78, 0xDE68_74A1_FB87_6C78],
    [0x8391_267F_9BA0_CBBC, 0x8391_267F_9BA0_CBBC],
    [0x5879_4674_E0C6_8C78, 0x5879_4674_E0C6_8C78],
    [0xFEC0_3CB0_05ED_292B, 0xFEC0_3CB0_05ED_292B],
];

/// Lane 0 of the kernel state immediately after `init(seed = 0, key = None)`,
/// as `(lo, hi)` pairs. Seeds the short path for sub-64-byte inputs.
pub const SHORT_INIT: [[u64; 2]; 4] = [
    [0x5DCA_839E_B236_558F, 0x5DCA_839E_9329_4AB1],
    [0x5DCA_839E_8E22_41A7, 0x5DCA_839E_9A2E_4DBF],
    [0x5DCA_839E_1AA7_C4B6, 0x5DCA_839E_AA3E_5D9F],
    [0x5DCA_839E_A63A_5997, 0x5DCA_839E_4390_F3D8],
];

#[cfg(test)]
mod tests {
    use super::*;

    // The primes backing each ln-derived table entry, in table order.
    const C_PRIMES: [u64; 8] = [2, 3, 5, 7, 0, 11, 13, 17];
    const LANE_PRIMES: [u64; 32] = [
        37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127,
        131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    ];

    fn frac_ln(p: u64) -> u64 {
        ((p as f64).ln().fract() * 18_446_744_073_709_551_616.0) as u64
    }

    #[test]
    fn init_constants_follow_derivation_rule() {
        for (i, (&c, &p)) in INIT_CONSTANTS.iter().zip(C_PRIMES.iter()).enumerate() {
            if p == 0 {
                assert_eq!(c, GOLDEN_RATIO, "C4 must be the golden ratio");
            } else {
                assert_eq!(c, frac_ln(p), "C{} does not match frac(ln({}))", i, p);
            }
        }
        assert_eq!(WHITENING0, frac_ln(19));
        assert_eq!(WHITENING1, frac_ln(23));
        assert_eq!(CLMUL_CONSTANT2, frac_ln(29));
        assert_eq!(CLMUL_CONSTANT, frac_ln(31));
    }

    #[test]
    fn lane_offsets_follow_derivation_rule() {
        for (i, (&off, &p)) in LANE_OFFSETS.iter().zip(LANE_PRIMES.iter()).enumerate() {
            assert_eq!(off, frac_ln(p), "LANE_OFFSETS[{}] does not match ln({})", i, p);
        }
    }

    #[test]
    fn lane_offsets_are_unique() {
        for i in 0..LANE_OFFSETS.len() {
            for j in (i + 1)..LANE_OFFSETS.len() {
                assert_ne!(LANE_OFFSETS[i], LANE_OFFSETS[j]);
            }
        }
    }
}
