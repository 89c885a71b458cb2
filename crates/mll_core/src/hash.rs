//! FNV-1a hashing
//!
//! Used to key content-addressed caches over raw descriptor bytes.

pub const FNV1A_SEED_32: u32 = 0x811c_9dc5;
pub const FNV1A_PRIME_32: u32 = 16_777_619;
pub const FNV1A_SEED_64: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV1A_PRIME_64: u64 = 1_099_511_628_211;

/// 32-bit FNV-1a over `bytes`, starting from the standard seed.
#[inline]
#[must_use]
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    fnv1a32_with(bytes, FNV1A_SEED_32)
}

/// Continues a 32-bit FNV-1a hash from a previous state.
#[inline]
#[must_use]
pub fn fnv1a32_with(bytes: &[u8], hash: u32) -> u32 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV1A_PRIME_32))
}

/// 64-bit FNV-1a over `bytes`.
#[inline]
#[must_use]
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_with(bytes, FNV1A_SEED_64)
}

#[inline]
#[must_use]
pub fn fnv1a64_with(bytes: &[u8], hash: u64) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV1A_PRIME_64))
}
