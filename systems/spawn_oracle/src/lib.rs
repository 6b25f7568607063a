#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn oracle deciding where caches exist and how large they start.
//!
//! Every roll is a pure function of the seed and the comma-joined key parts,
//! so a cache discarded from memory can always be regenerated identically.

use std::fmt::{self, Write as _};

use geocache_core::Cell;
use sha2::{Digest, Sha256};

/// Label mixed into the key when sizing a freshly spawned cache.
pub const INITIAL_VALUE_LABEL: &str = "initialValue";

/// Seeded pseudo-random function mapping string keys to values in `[0, 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnOracle {
    seed: String,
}

impl SpawnOracle {
    /// Creates an oracle whose rolls are derived from the provided seed.
    #[must_use]
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into() }
    }

    /// Seed string mixed into every roll.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Rolls a value for the key formed by joining `parts` with commas.
    #[must_use]
    pub fn value(&self, parts: &[&dyn fmt::Display]) -> f64 {
        let mut key = String::new();
        for (index, part) in parts.iter().enumerate() {
            if index > 0 {
                key.push(',');
            }
            let _ = write!(key, "{part}");
        }
        self.roll(&key)
    }

    /// Rolls a value for a pre-built key.
    #[must_use]
    pub fn roll(&self, key: &str) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        unit_from_digest(&hasher.finalize())
    }

    /// Decides whether `cell` hosts a cache under the provided probability.
    #[must_use]
    pub fn spawns_cache(&self, cell: Cell, spawn_probability: f64) -> bool {
        self.value(&[&cell.row(), &cell.column()]) < spawn_probability
    }

    /// Number of coins a freshly spawned cache at `cell` starts with.
    ///
    /// The scaled roll is rounded up and clamped to `1..=max_coins`, so a
    /// spawning cell never starts empty.
    #[must_use]
    pub fn initial_coin_count(&self, cell: Cell, max_coins: u32) -> u32 {
        if max_coins == 0 {
            return 0;
        }
        let roll = self.value(&[&cell.row(), &cell.column(), &INITIAL_VALUE_LABEL]);
        let scaled = (roll * f64::from(max_coins)).ceil();
        (scaled as u32).clamp(1, max_coins)
    }
}

fn unit_from_digest(digest: &[u8]) -> f64 {
    const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    let value = u64::from_le_bytes(bytes) >> 11;
    (value as f64) * SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolls_are_repeatable_and_order_independent() {
        let oracle = SpawnOracle::new("seed");
        let first = oracle.roll("3,4");
        let _ = oracle.roll("something else");
        assert_eq!(oracle.roll("3,4"), first);
        assert_eq!(SpawnOracle::new("seed").roll("3,4"), first);
    }

    #[test]
    fn value_joins_parts_with_commas() {
        let oracle = SpawnOracle::new("seed");
        assert_eq!(oracle.value(&[&3, &-4, &"initialValue"]), oracle.roll("3,-4,initialValue"));
    }

    #[test]
    fn rolls_stay_within_unit_interval() {
        let oracle = SpawnOracle::new("bounds");
        for row in -20..20 {
            for column in -20..20 {
                let value = oracle.value(&[&row, &column]);
                assert!((0.0..1.0).contains(&value), "{value} escaped [0, 1)");
            }
        }
    }

    #[test]
    fn different_seeds_produce_different_worlds() {
        let left = SpawnOracle::new("left");
        let right = SpawnOracle::new("right");
        let differing = (0..64)
            .filter(|column| left.value(&[&0, column]) != right.value(&[&0, column]))
            .count();
        assert!(differing > 0);
    }

    #[test]
    fn initial_coin_count_is_never_zero() {
        let oracle = SpawnOracle::new("coins");
        for row in -10..10 {
            for column in -10..10 {
                let count = oracle.initial_coin_count(Cell::new(row, column), 5);
                assert!((1..=5).contains(&count), "count {count} outside 1..=5");
            }
        }
    }

    #[test]
    fn zero_probability_never_spawns() {
        let oracle = SpawnOracle::new("empty");
        assert!(!oracle.spawns_cache(Cell::new(0, 0), 0.0));
    }
}
