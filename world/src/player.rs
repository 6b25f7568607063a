//! Player-owned state: cache snapshots, collected coins and the movement trail.

use geocache_core::{Cell, CollectError, Coin, GameConfig, Point};
use geocache_system_spawn_oracle::SpawnOracle;

use crate::{cache::Cache, cache_store::CacheStore, path::PathRecorder};

/// Aggregate of every piece of mutable state that survives a restart.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub(crate) caches: CacheStore,
    pub(crate) collected: Vec<Coin>,
    pub(crate) path: PathRecorder,
}

impl PlayerState {
    /// Creates an empty player state whose fresh caches follow `config`.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            caches: CacheStore::new(
                SpawnOracle::new(config.seed()),
                config.max_coins_per_cache(),
            ),
            collected: Vec::new(),
            path: PathRecorder::new(),
        }
    }

    /// Current state of the cache hosted by `cell`.
    #[must_use]
    pub fn cache(&self, cell: Cell) -> Cache {
        self.caches.get(cell)
    }

    /// Coins currently held by the cache at `cell`, with serials
    /// `0..remaining`.
    #[must_use]
    pub fn coins_in_cell(&self, cell: Cell) -> Vec<Coin> {
        (0..self.caches.get(cell).coins())
            .map(|serial| Coin::new(cell, serial))
            .collect()
    }

    /// Takes one coin from the cache at `cell` and commits the decrement.
    ///
    /// The collected coin's serial is the count left behind in the cache.
    pub fn collect(&mut self, cell: Cell) -> Result<Coin, CollectError> {
        let mut cache = self.caches.get(cell);
        if !cache.collect_one() {
            return Err(CollectError::CacheEmpty);
        }
        self.caches.save(cell, &cache);
        let coin = Coin::new(cell, cache.coins());
        self.collected.push(coin);
        Ok(coin)
    }

    /// Appends `point` to the movement trail.
    pub fn add_point(&mut self, point: Point) {
        self.path.add_point(point);
    }

    /// Trail coordinates in recorded order.
    #[must_use]
    pub fn to_coordinates(&self) -> Vec<Point> {
        self.path.to_coordinates()
    }

    /// Coins collected so far, oldest first.
    #[must_use]
    pub fn collected(&self) -> &[Coin] {
        &self.collected
    }

    /// Saved cache snapshots.
    #[must_use]
    pub fn caches(&self) -> &CacheStore {
        &self.caches
    }

    /// Recorded movement trail.
    #[must_use]
    pub fn path(&self) -> &PathRecorder {
        &self.path
    }

    pub(crate) fn reset(&mut self) {
        self.caches.clear();
        self.collected.clear();
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(&GameConfig::default().with_seed("player"))
    }

    #[test]
    fn collecting_drains_exactly_the_initial_count() {
        let mut player = player();
        let cell = Cell::new(3, 3);
        let initial = player.cache(cell).coins();

        for k in 1..=initial {
            let coin = player.collect(cell).expect("coin available");
            assert_eq!(coin.cell(), cell);
            assert_eq!(coin.serial(), initial - k);
            assert_eq!(player.cache(cell).coins(), initial - k);
            assert_eq!(player.collected().len() as u32, k);
        }

        assert_eq!(player.collect(cell), Err(CollectError::CacheEmpty));
        assert_eq!(player.collected().len() as u32, initial);
    }

    #[test]
    fn coins_in_cell_reflect_the_current_count() {
        let mut player = player();
        let cell = Cell::new(-2, 6);
        let before = player.coins_in_cell(cell);
        let serials: Vec<u32> = before.iter().map(Coin::serial).collect();
        assert_eq!(serials, (0..before.len() as u32).collect::<Vec<_>>());

        let _ = player.collect(cell).expect("fresh caches are never empty");
        assert_eq!(player.coins_in_cell(cell).len(), before.len() - 1);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut player = player();
        let cell = Cell::new(0, 0);
        let fresh = player.cache(cell);
        let _ = player.collect(cell).expect("coin available");
        player.add_point(Point::new(0.0, 0.0).expect("finite"));

        player.reset();

        assert_eq!(player.cache(cell), fresh);
        assert!(player.collected().is_empty());
        assert!(player.to_coordinates().is_empty());
    }
}
