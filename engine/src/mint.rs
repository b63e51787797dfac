//! Composition root: the allocation transaction, set verification, and the
//! redemption (burn) orchestration.
//!
//! [Mint] wires the pool, the catalog, and the ledger together. Allocation is
//! a single transaction over `&mut self`: select a mosaic, mint its next
//! fragment, and shed the mosaic from the pool in the same call that exhausts
//! its quota. Redemption writes the ledger entry before any fragment is
//! destroyed, so a reentrant claimant is rejected at the already-redeemed gate
//! rather than observing a half-burned set.

use crate::{
    catalog::{Catalog, Record},
    custody::Custodian,
    entropy::Entropy,
    ledger::Ledger,
    pool::Pool,
    Error, FragmentId, MosaicId, Salt, Season, SET_SIZE,
};
use prometheus_client::registry::Registry;
use std::hash::Hash;
use tracing::{debug, info};

/// Configuration for a [Mint].
#[derive(Clone, Debug)]
pub struct Config<E> {
    /// The mosaics eligible for allocation. Seeded once; reseeding is the
    /// administrator's concern, outside the engine.
    pub mosaics: Vec<MosaicId>,
    /// Source of allocation randomness.
    pub entropy: E,
    /// The season stamped on fragments until [Mint::set_season] is called.
    pub season: Season,
}

/// Emitted when a claimant burns a complete set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redemption<H> {
    /// The mosaic whose set was burned.
    pub mosaic: MosaicId,
    /// The claimant that held the complete set.
    pub claimant: H,
    /// The season shared by every fragment in the set.
    pub season: Season,
}

/// Allocates fragments and redeems completed sets.
pub struct Mint<E, H> {
    pool: Pool,
    catalog: Catalog,
    ledger: Ledger<H>,
    entropy: E,
    season: Season,
}

impl<E: Entropy, H: Clone + Eq + Hash> Mint<E, H> {
    /// Creates a mint over the configured mosaics, registering its metrics.
    pub fn init(registry: &mut Registry, config: Config<E>) -> Self {
        Self {
            pool: Pool::init(registry, config.mosaics),
            catalog: Catalog::init(registry),
            ledger: Ledger::init(registry),
            entropy: config.entropy,
            season: config.season,
        }
    }

    /// Allocates one fragment from a randomly selected eligible mosaic.
    ///
    /// Fails with [Error::PoolEmpty] once every mosaic has exhausted its quota
    /// of [SET_SIZE] fragments; nothing changes on failure. The mosaic is
    /// removed from the pool in the same call that mints its final fragment.
    pub fn allocate(&mut self, salt: Salt) -> Result<FragmentId, Error> {
        let mosaic = self.pool.select(&mut self.entropy, salt)?;
        let (fragment, ordinal) = self.catalog.allocate(mosaic, self.season);
        debug!(mosaic, fragment, ordinal, "fragment allocated");
        if self.catalog.remaining(mosaic) == 0 {
            self.pool.remove(mosaic);
            debug!(mosaic, "mosaic exhausted");
        }
        Ok(fragment)
    }

    /// Checks that `claimant` holds a complete, consistently labeled set for
    /// `mosaic`, returning the shared season.
    ///
    /// Fragments are checked in ordinal order and the first failing check
    /// wins; the operation is read-only either way. The ledger is not
    /// consulted: a redeemed mosaic reads as incomplete because its records
    /// were tombstoned.
    pub fn verify(
        &self,
        mosaic: MosaicId,
        claimant: &H,
        custody: &impl Custodian<H>,
    ) -> Result<Season, Error> {
        if self.catalog.minted(mosaic) == 0 {
            return Err(Error::UnknownMosaic(mosaic));
        }
        let fragments = self.catalog.fragments(mosaic);
        if fragments.len() as u64 != SET_SIZE {
            return Err(Error::IncompleteSet {
                mosaic,
                held: fragments.len() as u64,
            });
        }

        let mut reference = None;
        for &fragment in &fragments {
            if custody.holder_of(fragment) != Some(claimant) {
                return Err(Error::NotSoleOwner(fragment));
            }
            let Some(record) = self.catalog.record(fragment) else {
                unreachable!("listed fragment {fragment} has no record");
            };
            let season = *reference.get_or_insert(record.season);
            if record.season != season {
                return Err(Error::SeasonMismatch(fragment));
            }
        }
        match reference {
            Some(season) => Ok(season),
            None => unreachable!("verified set of mosaic {mosaic} was empty"),
        }
    }

    /// Burns `claimant`'s complete set for `mosaic`.
    ///
    /// A pair can redeem at most once: the second attempt fails with
    /// [Error::AlreadyRedeemed] before any re-verification. Verification
    /// failures propagate unchanged and leave all state untouched.
    pub fn redeem(
        &mut self,
        mosaic: MosaicId,
        claimant: &H,
        custody: &mut impl Custodian<H>,
    ) -> Result<Redemption<H>, Error> {
        if self.ledger.is_redeemed(mosaic, claimant) {
            return Err(Error::AlreadyRedeemed(mosaic));
        }
        let season = self.verify(mosaic, claimant, custody)?;

        // The ledger entry must be visible before the first destructive step
        // so a reentrant call is rejected at the gate above.
        self.ledger.commit(mosaic, claimant.clone());
        for fragment in self.catalog.fragments(mosaic) {
            custody.destroy(fragment);
            self.catalog.destroy(fragment);
        }

        info!(mosaic, %season, "set redeemed");
        Ok(Redemption {
            mosaic,
            claimant: claimant.clone(),
            season,
        })
    }

    /// Returns the mosaics still eligible for allocation. Order carries no
    /// meaning.
    pub fn remaining_in_pool(&self) -> &[MosaicId] {
        self.pool.snapshot()
    }

    /// Returns how many fragments are still unminted for `mosaic`.
    ///
    /// A never-seeded mosaic and a fully allocated one are not distinguished
    /// beyond their counts ([SET_SIZE] and `0`).
    pub fn fragments_remaining(&self, mosaic: MosaicId) -> u64 {
        self.catalog.remaining(mosaic)
    }

    /// Returns how many fragments have been minted for `mosaic`.
    pub fn minted(&self, mosaic: MosaicId) -> u64 {
        self.catalog.minted(mosaic)
    }

    /// Returns the surviving fragments of `mosaic` in ordinal order.
    pub fn fragments(&self, mosaic: MosaicId) -> Vec<FragmentId> {
        self.catalog.fragments(mosaic)
    }

    /// Returns the record of a fragment.
    pub fn record(&self, fragment: FragmentId) -> Result<&Record, Error> {
        self.catalog
            .record(fragment)
            .ok_or(Error::UnknownFragment(fragment))
    }

    /// Returns whether `claimant` has already redeemed `mosaic`.
    pub fn is_redeemed(&self, mosaic: MosaicId, claimant: &H) -> bool {
        self.ledger.is_redeemed(mosaic, claimant)
    }

    /// Returns the season currently stamped on new fragments.
    pub fn season(&self) -> Season {
        self.season
    }

    /// Advances the ambient season. Fragments minted from here on carry the
    /// new label, so sets straddling the change will fail verification.
    /// Restricting who may call this is the caller's access-control concern.
    pub fn set_season(&mut self, season: Season) {
        self.season = season;
    }
}
