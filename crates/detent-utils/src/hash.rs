//! Hash functions for stable ID generation.

/// Compute the FNV-1a 32-bit hash of a string.
///
/// Parameter tables name each parameter with a stable string (`"GAIN"`,
/// `"MIX"`). The numeric `ParameterId` the store and hosts use is the
/// FNV-1a hash of that name, so it can be computed in a `const` item next
/// to the table:
///
/// ```
/// use detent_utils::fnv1a_32;
///
/// const GAIN: u32 = fnv1a_32("GAIN");
/// assert_eq!(GAIN, fnv1a_32("GAIN"));
/// ```
///
/// The result is identical across platforms and compiler versions, which
/// keeps saved automation lanes pointing at the same parameter.
/// Collisions inside one table are rejected when the store is built.
#[inline]
pub const fn fnv1a_32(s: &str) -> u32 {
    const FNV_OFFSET: u32 = 2166136261;
    const FNV_PRIME: u32 = 16777619;

    let bytes = s.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}
