//! Allocate collectible fragments from a shrinking pool and redeem completed sets.
//!
//! A fixed population of composite collectibles ("mosaics") is seeded at
//! construction. Each call to [Mint::allocate] draws a mosaic at random from the
//! pool of those still eligible, mints the next fragment of its set, and removes
//! the mosaic from the pool in O(1) the moment its quota of [SET_SIZE] fragments
//! is reached. A claimant that has gathered a complete, internally consistent
//! set can later burn it exactly once through [Mint::redeem].
//!
//! # Status
//!
//! `tessera-engine` is **ALPHA** software and is not yet recommended for production
//! use. Developers should expect breaking changes and occasional instability.
//!
//! # Concurrency
//!
//! The engine is a single-writer state machine: [Mint::allocate] and
//! [Mint::redeem] take `&mut self`, so no two mutating operations can interleave
//! and no caller can observe a partially applied transaction. Read-only queries
//! take `&self` and always see a consistent snapshot. Callers that share a
//! [Mint] across tasks must serialize access through a lock owned by their
//! runtime.
//!
//! # Example
//!
//! ```rust
//! use prometheus_client::registry::Registry;
//! use tessera_engine::{entropy::Direct, Config, Mint, Season, Vault, SET_SIZE};
//!
//! let mut metrics = Registry::default();
//! let mut mint = Mint::<_, &str>::init(
//!     &mut metrics,
//!     Config {
//!         mosaics: vec![7],
//!         entropy: Direct,
//!         season: Season::Spring,
//!     },
//! );
//!
//! // Allocate the full set and hand each fragment to the same claimant.
//! let mut vault = Vault::new();
//! for salt in 0..SET_SIZE {
//!     let fragment = mint.allocate(salt)?;
//!     vault.assign(fragment, "alice");
//! }
//!
//! // A complete, consistently labeled set can be burned exactly once.
//! let redemption = mint.redeem(7, &"alice", &mut vault)?;
//! assert_eq!(redemption.season, Season::Spring);
//! assert!(mint.redeem(7, &"alice", &mut vault).is_err());
//! # Ok::<(), tessera_engine::Error>(())
//! ```

use std::fmt;
use thiserror::Error;

pub mod catalog;
pub mod custody;
pub mod entropy;
pub mod ledger;
pub mod mint;
pub mod pool;

pub use catalog::Record;
pub use custody::{Custodian, Vault};
pub use entropy::Entropy;
pub use mint::{Config, Mint, Redemption};

/// Identifies a composite collectible whose set of fragments can be completed.
pub type MosaicId = u64;

/// Identifies a single minted fragment. Globally unique and monotonically
/// increasing in allocation order.
pub type FragmentId = u64;

/// Caller-supplied disambiguator mixed into fragment selection.
pub type Salt = u64;

/// Number of fragments that complete a mosaic.
pub const SET_SIZE: u64 = 4;

/// Ambient label stamped on each fragment at allocation time.
///
/// A set only verifies if every fragment in it was minted under the same
/// season, so sets that straddle a season change can never be redeemed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// All seasons, in their canonical order.
    pub const ALL: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
    ];
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "spring"),
            Season::Summer => write!(f, "summer"),
            Season::Autumn => write!(f, "autumn"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

/// Errors that can occur when allocating, verifying, or redeeming fragments.
///
/// Every mutating operation that returns an error leaves the engine exactly as
/// it was before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Every mosaic has exhausted its quota; nothing is left to allocate.
    #[error("no mosaics eligible for allocation")]
    PoolEmpty,
    /// No fragment has ever been minted for this mosaic.
    #[error("no fragments minted for mosaic {0}")]
    UnknownMosaic(MosaicId),
    /// Fewer than [SET_SIZE] fragments exist for this mosaic.
    #[error("mosaic {mosaic} incomplete: {held} of {} fragments", SET_SIZE)]
    IncompleteSet { mosaic: MosaicId, held: u64 },
    /// The claimant does not hold this fragment of the set.
    #[error("fragment {0} not held by claimant")]
    NotSoleOwner(FragmentId),
    /// This fragment was minted under a different season than the rest of its set.
    #[error("fragment {0} minted in a different season")]
    SeasonMismatch(FragmentId),
    /// The claimant has already redeemed this mosaic.
    #[error("mosaic {0} already redeemed by claimant")]
    AlreadyRedeemed(MosaicId),
    /// No record exists for this fragment (never minted, or destroyed).
    #[error("unknown fragment {0}")]
    UnknownFragment(FragmentId),
}
