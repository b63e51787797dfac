//! The set of mosaics still eligible for allocation.
//!
//! Selection must be uniform over the survivors and removal must be O(1), so
//! the pool keeps an index-addressable array of eligible mosaics alongside a
//! reverse map from each mosaic to its current slot. Removal overwrites the
//! vacated slot with the last element and fixes up the moved element's
//! position, leaving order meaningless but membership exact.

use crate::{entropy::Entropy, Error, MosaicId, Salt};
use prometheus_client::{metrics::gauge::Gauge, registry::Registry};
use std::{collections::HashMap, num::NonZeroU64};

/// The mosaics whose quota is not yet exhausted.
pub struct Pool {
    eligible: Vec<MosaicId>,
    positions: HashMap<MosaicId, usize>,
    size: Gauge,
}

impl Pool {
    /// Creates a pool seeded with the given mosaics. Duplicates are ignored.
    pub fn init(registry: &mut Registry, mosaics: impl IntoIterator<Item = MosaicId>) -> Self {
        let mut pool = Self {
            eligible: Vec::new(),
            positions: HashMap::new(),
            size: Gauge::default(),
        };
        registry.register(
            "pool_size",
            "Number of mosaics still eligible for allocation",
            pool.size.clone(),
        );
        for mosaic in mosaics {
            if pool.positions.contains_key(&mosaic) {
                continue;
            }
            pool.positions.insert(mosaic, pool.eligible.len());
            pool.eligible.push(mosaic);
        }
        pool.size.set(pool.eligible.len() as i64);
        pool
    }

    /// Draws one of the eligible mosaics without mutating membership.
    ///
    /// Fails with [Error::PoolEmpty] if every mosaic has been exhausted.
    pub fn select(&self, entropy: &mut impl Entropy, salt: Salt) -> Result<MosaicId, Error> {
        let bound = NonZeroU64::new(self.eligible.len() as u64).ok_or(Error::PoolEmpty)?;
        let index = entropy.next_index(bound, salt);
        assert!(
            index < bound.get(),
            "entropy returned index {index} for bound {bound}"
        );
        Ok(self.eligible[index as usize])
    }

    /// Removes an exhausted mosaic in O(1) by swapping the last element into
    /// its slot.
    ///
    /// The caller only removes a mosaic once, at the moment its quota is
    /// reached; removing an absent mosaic signals a coordination bug between
    /// the pool and the catalog and is fatal.
    pub fn remove(&mut self, mosaic: MosaicId) {
        let Some(position) = self.positions.remove(&mosaic) else {
            unreachable!("removed mosaic {mosaic} not in pool");
        };
        let removed = self.eligible.swap_remove(position);
        debug_assert_eq!(removed, mosaic);
        if let Some(&moved) = self.eligible.get(position) {
            self.positions.insert(moved, position);
        }
        self.size.set(self.eligible.len() as i64);
    }

    /// Returns whether the mosaic is still eligible.
    pub fn contains(&self, mosaic: MosaicId) -> bool {
        self.positions.contains_key(&mosaic)
    }

    /// Returns the number of eligible mosaics.
    pub fn len(&self) -> usize {
        self.eligible.len()
    }

    /// Returns whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }

    /// Returns the eligible mosaics. Order carries no meaning.
    pub fn snapshot(&self) -> &[MosaicId] {
        &self.eligible
    }
}
