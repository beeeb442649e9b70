//! Small helpers shared across the crate

use rand::{SeedableRng, rngs::StdRng};

/// Seeded RNG, or one seeded from the thread RNG when `seed` is `None`
pub fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Independent seed for the `stream`-th consumer of a run seeded with `seed`
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    // splitmix64 finalizer
    let mut z = seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// `part / total`, or 0 for an empty total
pub fn rate(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_seeded_rngs_agree() {
        let a: u64 = build_rng(Some(5)).random();
        let b: u64 = build_rng(Some(5)).random();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derived_seeds_differ_per_stream() {
        assert_eq!(derive_seed(42, 1), derive_seed(42, 1));
        assert_ne!(derive_seed(42, 1), derive_seed(42, 2));
        assert_ne!(derive_seed(42, 1), derive_seed(43, 1));
    }

    #[test]
    fn test_rate() {
        assert_eq!(rate(1, 4), 0.25);
        assert_eq!(rate(3, 0), 0.0);
    }
}
