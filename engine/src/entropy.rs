//! Pluggable sources of allocation randomness.
//!
//! The engine never assumes its randomness is adversarially robust; it only
//! requires an index in `[0, bound)`. [Wallclock] hashes the wall clock and a
//! caller salt and is predictable on purpose: it is a placeholder, not a
//! security boundary. Deployments that need selection to resist prediction
//! plug in any [rand::RngCore] (for example, `rand::rngs::OsRng`) through the
//! blanket implementation, without touching the pool or the catalog.

use crate::Salt;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::{
    num::NonZeroU64,
    time::{SystemTime, UNIX_EPOCH},
};

/// A source of bounded pseudo-random indices.
pub trait Entropy {
    /// Returns an index in `[0, bound)` for the given salt.
    ///
    /// The result must be a deterministic function of the source's state at
    /// call time and `salt`. The zero bound is unrepresentable; callers reject
    /// an empty selection range before ever reaching a source.
    fn next_index(&mut self, bound: NonZeroU64, salt: Salt) -> u64;
}

/// Every [rand] generator is an entropy source.
///
/// The salt is mixed into the generator's next word so the returned index
/// remains a function of both the generator state and the salt.
impl<R: RngCore> Entropy for R {
    fn next_index(&mut self, bound: NonZeroU64, salt: Salt) -> u64 {
        (self.next_u64() ^ salt) % bound.get()
    }
}

/// Derives indices from a hash of the wall clock, a domain tag, and the salt.
///
/// Every input is publicly reconstructible, so the selection can be predicted
/// (and, within a clock tick, steered) by anyone who controls the salt. It
/// must not be relied on where allocation order is worth attacking.
#[derive(Clone, Debug)]
pub struct Wallclock {
    domain: Vec<u8>,
}

impl Wallclock {
    /// Creates a source whose digests are namespaced by `domain`, so distinct
    /// callers sharing a clock tick and a salt still diverge.
    pub fn new(domain: &[u8]) -> Self {
        Self {
            domain: domain.to_vec(),
        }
    }
}

impl Entropy for Wallclock {
    fn next_index(&mut self, bound: NonZeroU64, salt: Salt) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&self.domain);
        hasher.update(now.as_nanos().to_be_bytes());
        hasher.update(salt.to_be_bytes());
        fold(&hasher.finalize(), bound)
    }
}

/// Maps the salt directly onto the bound.
///
/// Lets tests steer selection exactly; a salt of `i` resolves to index
/// `i % bound`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl Entropy for Direct {
    fn next_index(&mut self, bound: NonZeroU64, salt: Salt) -> u64 {
        salt % bound.get()
    }
}

/// Reduces a digest modulo `bound`, interpreting the bytes as one big-endian
/// integer.
fn fold(digest: &[u8], bound: NonZeroU64) -> u64 {
    let bound = u128::from(bound.get());
    let mut result: u128 = 0;
    for &byte in digest {
        result = ((result << 8) | u128::from(byte)) % bound;
    }
    result as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn bound(value: u64) -> NonZeroU64 {
        NonZeroU64::new(value).unwrap()
    }

    #[test]
    fn test_direct_maps_salt() {
        let mut direct = Direct;
        assert_eq!(direct.next_index(bound(5), 0), 0);
        assert_eq!(direct.next_index(bound(5), 3), 3);
        assert_eq!(direct.next_index(bound(5), 12), 2);
    }

    #[test]
    fn test_wallclock_within_bound() {
        let mut source = Wallclock::new(b"test");
        for limit in 1..64 {
            for salt in 0..16 {
                assert!(source.next_index(bound(limit), salt) < limit);
            }
        }
    }

    #[test]
    fn test_rng_within_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        for limit in 1..64 {
            for salt in 0..16 {
                assert!(rng.next_index(bound(limit), salt) < limit);
            }
        }
    }

    #[test]
    fn test_rng_deterministic() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for salt in 0..32 {
            assert_eq!(a.next_index(bound(13), salt), b.next_index(bound(13), salt));
        }
    }

    #[test]
    fn test_unit_bound_always_zero() {
        let mut direct = Direct;
        let mut wallclock = Wallclock::new(b"test");
        let mut rng = StdRng::seed_from_u64(0);
        for salt in 0..8 {
            assert_eq!(direct.next_index(bound(1), salt), 0);
            assert_eq!(wallclock.next_index(bound(1), salt), 0);
            assert_eq!(rng.next_index(bound(1), salt), 0);
        }
    }

    #[test]
    fn test_fold_spreads_over_bound() {
        // The fold of distinct digests should cover more than one index.
        let mut seen = std::collections::HashSet::new();
        for salt in 0u64..64 {
            let mut hasher = Sha256::new();
            hasher.update(salt.to_be_bytes());
            seen.insert(fold(&hasher.finalize(), bound(7)));
        }
        assert!(seen.len() > 1);
    }
}
