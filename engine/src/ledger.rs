//! Replay protection for redemptions.
//!
//! Each `(mosaic, claimant)` pair may be redeemed at most once. Entries are
//! written before the corresponding set is destroyed and are never unset, so
//! a reentrant or repeated redemption is rejected before any verification is
//! attempted.

use crate::MosaicId;
use prometheus_client::{metrics::counter::Counter, registry::Registry};
use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

/// Records which claimants have redeemed which mosaics.
pub struct Ledger<H> {
    redeemed: HashMap<MosaicId, HashSet<H>>,
    redemptions: Counter,
}

impl<H: Eq + Hash> Ledger<H> {
    /// Creates an empty ledger.
    pub fn init(registry: &mut Registry) -> Self {
        let ledger = Self {
            redeemed: HashMap::new(),
            redemptions: Counter::default(),
        };
        registry.register(
            "redemptions",
            "Number of sets redeemed",
            ledger.redemptions.clone(),
        );
        ledger
    }

    /// Returns whether `claimant` has already redeemed `mosaic`.
    pub fn is_redeemed(&self, mosaic: MosaicId, claimant: &H) -> bool {
        self.redeemed
            .get(&mosaic)
            .map_or(false, |claimants| claimants.contains(claimant))
    }

    /// Marks `mosaic` as redeemed by `claimant`.
    ///
    /// The orchestrator checks [Ledger::is_redeemed] before verification, so
    /// committing a pair twice is a coordination bug and fatal.
    pub fn commit(&mut self, mosaic: MosaicId, claimant: H) {
        let fresh = self.redeemed.entry(mosaic).or_default().insert(claimant);
        assert!(fresh, "redemption committed twice for mosaic {mosaic}");
        self.redemptions.inc();
    }
}
