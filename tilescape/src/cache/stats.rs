//! Cache statistics snapshot.

use std::fmt;

use serde::Serialize;

/// Counters of an [`EvictionCache`](super::EvictionCache) at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Stores of new keys.
    pub inserts: u64,
    /// Stores that replaced an existing value.
    pub updates: u64,
    pub entry_count: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fill level (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entry_count as f64 / self.capacity as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} entries, {} hits, {} misses ({:.1}% hit rate), {} evictions",
            self.entry_count,
            self.capacity,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_and_display() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            evictions: 2,
            entry_count: 5,
            capacity: 10,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.utilization(), 0.5);
        assert_eq!(
            stats.to_string(),
            "5/10 entries, 3 hits, 1 misses (75.0% hit rate), 2 evictions"
        );
    }
}
