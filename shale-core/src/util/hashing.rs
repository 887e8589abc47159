use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Folds `value` into `seed` and returns the combined hash. The combination is
/// order-sensitive: `hash_combine(a, hash_combine(b, 0))` differs from
/// `hash_combine(b, hash_combine(a, 0))` for almost all `a != b`.
pub fn hash_combine(value: u64, seed: u64) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Computes a deterministic content fingerprint of `bytes`. The fingerprint is stable
/// across runs and platforms with the same pointer width, which is all the structural
/// fingerprint of an attribute requires.
pub fn fingerprint_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.write_usize(bytes.len());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_combine_is_order_sensitive() {
        assert_ne!(
            hash_combine(1, hash_combine(2, 0)),
            hash_combine(2, hash_combine(1, 0))
        );
        assert_eq!(hash_combine(7, 13), hash_combine(7, 13));
    }

    #[test]
    fn fingerprint_changes_with_content_and_length() {
        assert_eq!(fingerprint_bytes(b"abc"), fingerprint_bytes(b"abc"));
        assert_ne!(fingerprint_bytes(b"abc"), fingerprint_bytes(b"abd"));
        assert_ne!(fingerprint_bytes(b"abc"), fingerprint_bytes(b"abc\0"));
        assert_ne!(fingerprint_bytes(b""), fingerprint_bytes(b"\0"));
    }
}
