//! Per-cell coin reservoir.

use geocache_core::{Cell, Memento};
use geocache_system_spawn_oracle::SpawnOracle;
use serde::{Deserialize, Serialize};

/// Mutable coin reservoir hosted by a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(rename = "i")]
    row: i32,
    #[serde(rename = "j")]
    column: i32,
    #[serde(rename = "numCoins")]
    coins: u32,
}

impl Cache {
    /// Rolls a fresh cache for `cell` holding between 1 and `max_coins` coins.
    #[must_use]
    pub fn spawn(cell: Cell, oracle: &SpawnOracle, max_coins: u32) -> Self {
        Self::with_coins(cell, oracle.initial_coin_count(cell, max_coins))
    }

    /// Creates a cache at `cell` holding exactly `coins` coins.
    #[must_use]
    pub const fn with_coins(cell: Cell, coins: u32) -> Self {
        Self {
            row: cell.row(),
            column: cell.column(),
            coins,
        }
    }

    /// Cell hosting the cache.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.row, self.column)
    }

    /// Coins still available in the cache.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Removes a single coin, returning `false` when the cache is already empty.
    pub fn collect_one(&mut self) -> bool {
        match self.coins.checked_sub(1) {
            Some(remaining) => {
                self.coins = remaining;
                true
            }
            None => false,
        }
    }
}

impl Memento for Cache {}
