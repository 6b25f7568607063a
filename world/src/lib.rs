#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the geocache engine.

mod board;
mod cache;
mod cache_store;
mod path;
mod player;
mod session;

pub use board::{Board, CellRegistry};
pub use cache::Cache;
pub use cache_store::CacheStore;
pub use path::PathRecorder;
pub use player::PlayerState;
pub use session::LoadReport;

use geocache_core::{
    Cell, CollectError, Coin, Command, Event, GameConfig, KeyValueStore, Point, StoreError,
};
use tracing::debug;

/// Represents the authoritative geocache world state.
#[derive(Clone, Debug)]
pub struct World {
    config: GameConfig,
    board: Board,
    player: PlayerState,
    position: Point,
}

impl World {
    /// Creates a fresh world with the player standing at the configured origin.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            board: Board::new(&config),
            player: PlayerState::new(&config),
            position: config.origin(),
            config,
        }
    }

    /// Persists the player's session into `store`.
    pub fn save_session(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        self.player.save_session(store)
    }

    /// Replaces the player's state with the session held by `store`.
    ///
    /// The player resumes at the last recorded trail point, or at the origin
    /// when the trail is empty.
    pub fn load_session(&mut self, store: &dyn KeyValueStore) -> Result<LoadReport, StoreError> {
        let report = self.player.load_session(store)?;
        self.position = self.player.path().last().unwrap_or(self.config.origin());
        Ok(report)
    }

    /// Erases the persisted session and returns the player to the origin.
    pub fn clear_session(&mut self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        self.player.clear_session(store)?;
        self.position = self.config.origin();
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MovePlayer { to } => {
            let from = world.position;
            world.position = to;
            world.player.add_point(to);
            let cell = world.board.cell_for_point(to);
            out_events.push(Event::PlayerMoved { from, to, cell });
        }
        Command::CollectCoin { cell } => {
            let cell = world.board.canonical(cell);
            match try_collect(world, cell) {
                Ok(coin) => {
                    debug!(key = %cell.key(), serial = coin.serial(), "collected coin");
                    out_events.push(Event::CoinCollected {
                        coin,
                        remaining: world.player.cache(cell).coins(),
                    });
                }
                Err(reason) => out_events.push(Event::CollectRejected { cell, reason }),
            }
        }
    }
}

fn try_collect(world: &mut World, cell: Cell) -> Result<Coin, CollectError> {
    let player_cell = world.board.cell_for_point(world.position);
    if !world.board.is_visible_from(player_cell, cell) {
        return Err(CollectError::OutOfRange);
    }
    if !world.board.spawns_cache(cell) {
        return Err(CollectError::NoCache);
    }
    world.player.collect(cell)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geocache_core::{Cell, CellBounds, Coin, CoordinateError, GameConfig, Point};

    use super::{PlayerState, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Player's current geographic position.
    #[must_use]
    pub fn position(world: &World) -> Point {
        world.position
    }

    /// Cell containing the player's current position.
    #[must_use]
    pub fn player_cell(world: &World) -> Cell {
        world.board.cell_for_point(world.position)
    }

    /// Cache-hosting cells visible from `point`, in row-major order.
    #[must_use]
    pub fn cells_near_point(world: &World, point: Point) -> Vec<Cell> {
        world.board.cells_near_point(point)
    }

    /// Cache-hosting cells visible from the player's current position.
    #[must_use]
    pub fn nearby_caches(world: &World) -> Vec<Cell> {
        world.board.cells_near_point(world.position)
    }

    /// Geographic rectangle covered by `cell`.
    pub fn cell_bounds(world: &World, cell: Cell) -> Result<CellBounds, CoordinateError> {
        world.board.cell_bounds(cell)
    }

    /// Reports whether `cell` hosts a cache.
    #[must_use]
    pub fn hosts_cache(world: &World, cell: Cell) -> bool {
        world.board.spawns_cache(cell)
    }

    /// Coins currently held by the cache at `cell`.
    #[must_use]
    pub fn coins_in_cell(world: &World, cell: Cell) -> Vec<Coin> {
        world.player.coins_in_cell(cell)
    }

    /// Coins the player has collected, oldest first.
    #[must_use]
    pub fn collected_coins(world: &World) -> &[Coin] {
        world.player.collected()
    }

    /// Trail of visited positions, oldest first.
    #[must_use]
    pub fn trail(world: &World) -> Vec<Point> {
        world.player.to_coordinates()
    }

    /// Number of distinct cells canonicalized so far.
    #[must_use]
    pub fn known_cell_count(world: &World) -> usize {
        world.board.registry().len()
    }

    /// Read-only access to the player's persisted state.
    #[must_use]
    pub fn player(world: &World) -> &PlayerState {
        &world.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(GameConfig::default().with_seed("world"))
    }

    fn first_cache(world: &World) -> Cell {
        *query::nearby_caches(world)
            .first()
            .expect("default neighbourhood hosts at least one cache")
    }

    #[test]
    fn move_player_records_trail_and_reports_cell() {
        let mut world = world();
        let origin = query::position(&world);
        let to = origin.offset(1e-4, 0.0).expect("finite");
        let mut events = Vec::new();

        apply(&mut world, Command::MovePlayer { to }, &mut events);

        assert_eq!(query::position(&world), to);
        assert_eq!(query::trail(&world), vec![to]);
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                from: origin,
                to,
                cell: query::player_cell(&world),
            }]
        );
    }

    #[test]
    fn collect_from_visible_cache_emits_coin() {
        let mut world = world();
        let cell = first_cache(&world);
        let before = query::coins_in_cell(&world, cell).len() as u32;
        let mut events = Vec::new();

        apply(&mut world, Command::CollectCoin { cell }, &mut events);

        let coin = query::collected_coins(&world)[0];
        assert_eq!(
            events,
            vec![Event::CoinCollected {
                coin,
                remaining: before - 1,
            }]
        );
        assert_eq!(coin.serial(), before - 1);
    }

    #[test]
    fn collect_outside_radius_is_rejected() {
        let mut world = world();
        let player_cell = query::player_cell(&world);
        let radius = i32::try_from(query::config(&world).visibility_radius()).expect("fits");
        let far = player_cell.offset(radius + 1, 0).expect("representable");
        let mut events = Vec::new();

        apply(&mut world, Command::CollectCoin { cell: far }, &mut events);

        assert_eq!(
            events,
            vec![Event::CollectRejected {
                cell: far,
                reason: CollectError::OutOfRange,
            }]
        );
        assert!(query::collected_coins(&world).is_empty());
    }

    #[test]
    fn collect_from_cell_without_cache_is_rejected() {
        let mut world = world();
        let player_cell = query::player_cell(&world);
        let empty = (-8..=8)
            .flat_map(|d_row| (-8..=8).map(move |d_column| (d_row, d_column)))
            .filter_map(|(d_row, d_column)| player_cell.offset(d_row, d_column))
            .find(|cell| !query::hosts_cache(&world, *cell))
            .expect("most cells host no cache");
        let mut events = Vec::new();

        apply(&mut world, Command::CollectCoin { cell: empty }, &mut events);

        assert_eq!(
            events,
            vec![Event::CollectRejected {
                cell: empty,
                reason: CollectError::NoCache,
            }]
        );
    }

    #[test]
    fn draining_a_cache_ends_in_cache_empty() {
        let mut world = world();
        let cell = first_cache(&world);
        let initial = query::coins_in_cell(&world, cell).len();
        let mut events = Vec::new();

        for _ in 0..=initial {
            apply(&mut world, Command::CollectCoin { cell }, &mut events);
        }

        assert_eq!(query::collected_coins(&world).len(), initial);
        assert_eq!(
            events.last(),
            Some(&Event::CollectRejected {
                cell,
                reason: CollectError::CacheEmpty,
            })
        );
    }
}
