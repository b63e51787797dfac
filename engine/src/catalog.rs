//! Per-fragment records and per-mosaic allocation counters.
//!
//! The catalog owns everything minted: the immutable record of each fragment,
//! the dense `(mosaic, ordinal) -> fragment` index used to walk a set in
//! order, and the count of fragments minted per mosaic. Counts never decrease,
//! even after a set is destroyed on redemption; destruction tombstones the
//! records instead.

use crate::{FragmentId, MosaicId, Season, SET_SIZE};
use prometheus_client::{metrics::counter::Counter, registry::Registry};
use std::collections::HashMap;

/// The immutable record of one minted fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Globally unique fragment id, monotonically increasing in mint order.
    pub fragment: FragmentId,
    /// The mosaic this fragment belongs to.
    pub mosaic: MosaicId,
    /// 1-based position within the mosaic's set, dense over mint order.
    pub ordinal: u64,
    /// The season under which the fragment was minted.
    pub season: Season,
}

/// Registry of every fragment minted and of per-mosaic progress.
pub struct Catalog {
    counts: HashMap<MosaicId, u64>,
    records: HashMap<FragmentId, Record>,
    ordinals: HashMap<(MosaicId, u64), FragmentId>,
    last: FragmentId,
    allocated: Counter,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn init(registry: &mut Registry) -> Self {
        let catalog = Self {
            counts: HashMap::new(),
            records: HashMap::new(),
            ordinals: HashMap::new(),
            last: 0,
            allocated: Counter::default(),
        };
        registry.register(
            "allocated",
            "Number of fragments allocated",
            catalog.allocated.clone(),
        );
        catalog
    }

    /// Mints the next fragment of `mosaic`'s set, stamped with `season`.
    ///
    /// The pool stops offering a mosaic the moment its quota is reached, so an
    /// allocation past [SET_SIZE] can only mean the pool and the catalog have
    /// diverged; that is fatal, not recoverable.
    pub fn allocate(&mut self, mosaic: MosaicId, season: Season) -> (FragmentId, u64) {
        let count = self.counts.entry(mosaic).or_insert(0);
        let ordinal = *count + 1;
        assert!(ordinal <= SET_SIZE, "mosaic {mosaic} allocated past quota");

        self.last += 1;
        let fragment = self.last;
        self.records.insert(
            fragment,
            Record {
                fragment,
                mosaic,
                ordinal,
                season,
            },
        );
        self.ordinals.insert((mosaic, ordinal), fragment);
        *count = ordinal;
        self.allocated.inc();
        (fragment, ordinal)
    }

    /// Returns how many fragments have been minted for `mosaic`.
    pub fn minted(&self, mosaic: MosaicId) -> u64 {
        self.counts.get(&mosaic).copied().unwrap_or(0)
    }

    /// Returns how many fragments are still unminted for `mosaic`.
    ///
    /// Answers [SET_SIZE] for a mosaic that was never seeded and `0` for an
    /// exhausted one; the two are deliberately not distinguished.
    pub fn remaining(&self, mosaic: MosaicId) -> u64 {
        SET_SIZE - self.minted(mosaic)
    }

    /// Returns the surviving fragments of `mosaic` in ordinal order.
    pub fn fragments(&self, mosaic: MosaicId) -> Vec<FragmentId> {
        (1..=self.minted(mosaic))
            .filter_map(|ordinal| self.ordinals.get(&(mosaic, ordinal)).copied())
            .collect()
    }

    /// Returns the record of a fragment, if it exists and was not destroyed.
    pub fn record(&self, fragment: FragmentId) -> Option<&Record> {
        self.records.get(&fragment)
    }

    /// Tombstones a fragment: the record and its ordinal entry are dropped,
    /// while the mosaic's minted count stays put. Destroying a fragment twice
    /// is a coordination bug and fatal.
    pub fn destroy(&mut self, fragment: FragmentId) -> Record {
        let Some(record) = self.records.remove(&fragment) else {
            unreachable!("destroyed fragment {fragment} has no record");
        };
        self.ordinals.remove(&(record.mosaic, record.ordinal));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_dense_and_monotone() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);

        let mut previous = 0;
        for expected_ordinal in 1..=SET_SIZE {
            let (fragment, ordinal) = catalog.allocate(9, Season::Spring);
            assert_eq!(ordinal, expected_ordinal);
            assert!(fragment > previous);
            previous = fragment;

            let record = catalog.record(fragment).unwrap();
            assert_eq!(record.mosaic, 9);
            assert_eq!(record.ordinal, expected_ordinal);
            assert_eq!(record.season, Season::Spring);
        }

        let fragments = catalog.fragments(9);
        assert_eq!(fragments.len() as u64, SET_SIZE);
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(catalog.record(*fragment).unwrap().ordinal, i as u64 + 1);
        }
    }

    #[test]
    fn test_ids_unique_across_mosaics() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);
        let (a, _) = catalog.allocate(1, Season::Spring);
        let (b, _) = catalog.allocate(2, Season::Spring);
        let (c, _) = catalog.allocate(1, Season::Spring);
        assert!(a < b && b < c);
        assert_eq!(catalog.minted(1), 2);
        assert_eq!(catalog.minted(2), 1);
    }

    #[test]
    fn test_remaining_conflates_unknown_and_exhausted() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);
        assert_eq!(catalog.remaining(3), SET_SIZE);
        for _ in 0..SET_SIZE {
            catalog.allocate(3, Season::Spring);
        }
        assert_eq!(catalog.remaining(3), 0);
        assert_eq!(catalog.remaining(4), SET_SIZE);
    }

    #[test]
    #[should_panic(expected = "past quota")]
    fn test_allocate_past_quota_panics() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);
        for _ in 0..=SET_SIZE {
            catalog.allocate(1, Season::Spring);
        }
    }

    #[test]
    fn test_destroy_tombstones() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);
        let (first, _) = catalog.allocate(5, Season::Winter);
        let (second, _) = catalog.allocate(5, Season::Winter);

        let record = catalog.destroy(first);
        assert_eq!(record.fragment, first);
        assert_eq!(catalog.record(first), None);
        assert_eq!(catalog.fragments(5), vec![second]);
        // Counts are monotone: destruction leaves them untouched.
        assert_eq!(catalog.minted(5), 2);
    }

    #[test]
    #[should_panic(expected = "has no record")]
    fn test_destroy_twice_panics() {
        let mut registry = Registry::default();
        let mut catalog = Catalog::init(&mut registry);
        let (fragment, _) = catalog.allocate(5, Season::Winter);
        catalog.destroy(fragment);
        catalog.destroy(fragment);
    }
}
