//! Bounded storage for prepared tile artifacts.
//!
//! [`EvictionCache`] keeps up to a fixed number of entries and discards the
//! least frequently used one when full. Tile sources key it by
//! [`TileFingerprint`].

mod frequency;
mod key;
mod stats;

pub use frequency::{CacheError, EvictionCache, INITIAL_FREQUENCY};
pub use key::TileFingerprint;
pub use stats::CacheStats;

/// Default number of tiles kept per tile source.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;
