#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the geocache engine.
//!
//! This crate defines the value types and message surface that connect
//! adapters, the authoritative world, and pure systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that presentation layers and systems react to. Persistent state travels
//! through the [`Memento`] codec and the [`KeyValueStore`] seam.

use std::{fmt, io, path::PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Seed string mixed into every spawn oracle roll unless configured otherwise.
pub const DEFAULT_SEED: &str = "geocache";

/// Store key holding the serialized cache snapshot list.
pub const CACHES_KEY: &str = "caches";
/// Store key holding the collected coin list.
pub const COINS_KEY: &str = "coins";
/// Store key holding the serialized movement trail.
pub const POLYLINE_KEY: &str = "polyline";
/// Every key written by a session save, in write order.
pub const SESSION_KEYS: [&str; 3] = [CACHES_KEY, COINS_KEY, POLYLINE_KEY];

const DEFAULT_TILE_WIDTH: f64 = 1e-4;
const DEFAULT_VISIBILITY_RADIUS: u32 = 8;
const DEFAULT_SPAWN_PROBABILITY: f64 = 0.1;
const DEFAULT_MAX_COINS_PER_CACHE: u32 = 5;

/// Largest visibility radius a [`GameConfig`] accepts.
pub const MAX_VISIBILITY_RADIUS: u32 = 64;
const DEFAULT_ORIGIN: Point = Point {
    lat: 36.989_493_795_784_01,
    lng: -122.062_771_285_485_04,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves the player to the provided position and records it on the trail.
    MovePlayer {
        /// Geographic position the player now occupies.
        to: Point,
    },
    /// Requests that a single coin be taken from the cache hosted by a cell.
    CollectCoin {
        /// Cell hosting the cache to collect from.
        cell: Cell,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the player moved between two positions.
    PlayerMoved {
        /// Position occupied before the move.
        from: Point,
        /// Position occupied after the move.
        to: Point,
        /// Grid cell containing the new position.
        cell: Cell,
    },
    /// Confirms that a coin left a cache and joined the player's inventory.
    CoinCollected {
        /// Coin appended to the collected list.
        coin: Coin,
        /// Coins left in the cache after the collection.
        remaining: u32,
    },
    /// Reports that a collection request had no effect.
    CollectRejected {
        /// Cell named by the rejected request.
        cell: Cell,
        /// Specific reason nothing was collected.
        reason: CollectError,
    },
}

/// Reasons a collection request may leave the world untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectError {
    /// The cell lies outside the visibility radius around the player.
    OutOfRange,
    /// The cell does not host a cache.
    NoCache,
    /// The cache exists but holds no coins.
    CacheEmpty,
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing latitude.
    North,
    /// Movement toward increasing longitude.
    East,
    /// Movement toward decreasing latitude.
    South,
    /// Movement toward decreasing longitude.
    West,
}

impl Direction {
    /// Latitude and longitude multipliers for a single step in this direction.
    #[must_use]
    pub const fn unit_step(self) -> (f64, f64) {
        match self {
            Self::North => (1.0, 0.0),
            Self::East => (0.0, 1.0),
            Self::South => (-1.0, 0.0),
            Self::West => (0.0, -1.0),
        }
    }
}

/// Discrete grid cell identified by row (`i`) and column (`j`).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    #[serde(rename = "i")]
    row: i32,
    #[serde(rename = "j")]
    column: i32,
}

impl Cell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Row index of the cell, derived from latitude.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Column index of the cell, derived from longitude.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Canonical string key of the cell, formatted as `"{row}.{column}"`.
    #[must_use]
    pub fn key(&self) -> CellKey {
        CellKey::from(*self)
    }

    /// Returns the cell displaced by the provided offsets, if representable.
    #[must_use]
    pub fn offset(self, d_row: i32, d_column: i32) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add(d_row)?,
            column: self.column.checked_add(d_column)?,
        })
    }

    /// Largest per-axis distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: Cell) -> u32 {
        self.row
            .abs_diff(other.row)
            .max(self.column.abs_diff(other.column))
    }
}

impl Memento for Cell {}

/// String key under which per-cell state is stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    /// Borrows the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Cell> for CellKey {
    fn from(cell: Cell) -> Self {
        Self(format!("{}.{}", cell.row, cell.column))
    }
}

impl From<String> for CellKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single collectible unit identified by its origin cell and serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    #[serde(rename = "i")]
    row: i32,
    #[serde(rename = "j")]
    column: i32,
    serial: u32,
}

impl Coin {
    /// Creates a coin that originated from the provided cell.
    #[must_use]
    pub const fn new(cell: Cell, serial: u32) -> Self {
        Self {
            row: cell.row,
            column: cell.column,
            serial,
        }
    }

    /// Cell the coin was spawned in.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.row, self.column)
    }

    /// Serial number assigned when the coin was read or collected.
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

impl Memento for Coin {}

/// Geographic coordinate stored as latitude (`i`) and longitude (`j`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "i")]
    lat: f64,
    #[serde(rename = "j")]
    lng: f64,
}

impl Point {
    /// Creates a point, rejecting coordinates that are NaN or infinite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if lat.is_finite() && lng.is_finite() {
            Ok(Self { lat, lng })
        } else {
            Err(CoordinateError::NonFinite { lat, lng })
        }
    }

    /// Latitude component of the point.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude component of the point.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Returns the point displaced by the provided deltas.
    pub fn offset(self, d_lat: f64, d_lng: f64) -> Result<Self, CoordinateError> {
        Self::new(self.lat + d_lat, self.lng + d_lng)
    }

    /// Reports whether both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl Memento for Point {}

/// Geographic rectangle covered by a single cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds {
    /// Corner with the smallest latitude and longitude.
    pub south_west: Point,
    /// Corner with the largest latitude and longitude.
    pub north_east: Point,
}

/// Errors raised when constructing coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum CoordinateError {
    /// A component was NaN or infinite.
    #[error("coordinate ({lat}, {lng}) is not finite")]
    NonFinite {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lng: f64,
    },
}

/// Serialize and restore contract shared by every persisted entity.
///
/// Mementos are JSON strings. Restoring a malformed or incomplete memento
/// yields a [`MementoError`] rather than a partially initialised value.
pub trait Memento: Serialize + DeserializeOwned {
    /// Encodes the value as a memento string.
    fn to_memento(&self) -> String {
        serde_json::to_string(self).expect("memento serialization never fails")
    }

    /// Decodes a value previously produced by [`Memento::to_memento`].
    fn from_memento(memento: &str) -> Result<Self, MementoError> {
        serde_json::from_str(memento).map_err(MementoError::from)
    }
}

/// Errors that can occur while restoring a memento.
#[derive(Debug, Error)]
pub enum MementoError {
    /// The memento was not well-formed JSON.
    #[error("memento is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    /// The memento parsed but lacked fields or carried values of the wrong type.
    #[error("memento does not describe the expected record: {0}")]
    Shape(#[source] serde_json::Error),
}

impl From<serde_json::Error> for MementoError {
    fn from(error: serde_json::Error) -> Self {
        match error.classify() {
            serde_json::error::Category::Data => Self::Shape(error),
            _ => Self::Syntax(error),
        }
    }
}

/// Fixed configuration supplied when the world is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    tile_width: f64,
    visibility_radius: u32,
    spawn_probability: f64,
    max_coins_per_cache: u32,
    seed: String,
    origin: Point,
}

impl GameConfig {
    /// Creates a configuration with explicit grid parameters and default
    /// cache sizing, seed and origin.
    #[must_use]
    pub fn new(tile_width: f64, visibility_radius: u32, spawn_probability: f64) -> Self {
        Self {
            tile_width,
            visibility_radius,
            spawn_probability,
            ..Self::default()
        }
    }

    /// Replaces the maximum number of coins a fresh cache may hold.
    #[must_use]
    pub fn with_max_coins_per_cache(mut self, max_coins: u32) -> Self {
        self.max_coins_per_cache = max_coins;
        self
    }

    /// Replaces the seed string mixed into spawn rolls.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Replaces the position the player starts from.
    #[must_use]
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Side length of a square cell in degrees.
    #[must_use]
    pub const fn tile_width(&self) -> f64 {
        self.tile_width
    }

    /// Number of cells visible on each side of the player's cell.
    #[must_use]
    pub const fn visibility_radius(&self) -> u32 {
        self.visibility_radius
    }

    /// Probability that any given cell hosts a cache.
    #[must_use]
    pub const fn spawn_probability(&self) -> f64 {
        self.spawn_probability
    }

    /// Upper bound on the number of coins a freshly spawned cache holds.
    #[must_use]
    pub const fn max_coins_per_cache(&self) -> u32 {
        self.max_coins_per_cache
    }

    /// Seed string mixed into spawn rolls.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Position the player starts from when no trail exists.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Checks that every parameter lies in its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tile_width.is_finite() || self.tile_width <= 0.0 {
            return Err(ConfigError::TileWidth(self.tile_width));
        }
        if self.visibility_radius > MAX_VISIBILITY_RADIUS {
            return Err(ConfigError::VisibilityRadius(self.visibility_radius));
        }
        if !(0.0..1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::SpawnProbability(self.spawn_probability));
        }
        if self.max_coins_per_cache == 0 {
            return Err(ConfigError::MaxCoins);
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::Origin);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            visibility_radius: DEFAULT_VISIBILITY_RADIUS,
            spawn_probability: DEFAULT_SPAWN_PROBABILITY,
            max_coins_per_cache: DEFAULT_MAX_COINS_PER_CACHE,
            seed: DEFAULT_SEED.to_owned(),
            origin: DEFAULT_ORIGIN,
        }
    }
}

/// Reasons a [`GameConfig`] may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Tile width must be finite and strictly positive.
    #[error("tile width {0} must be finite and positive")]
    TileWidth(f64),
    /// Visibility radius exceeds [`MAX_VISIBILITY_RADIUS`].
    #[error("visibility radius {0} exceeds {max}", max = MAX_VISIBILITY_RADIUS)]
    VisibilityRadius(u32),
    /// Spawn probability must lie in `[0, 1)`.
    #[error("spawn probability {0} must lie in [0, 1)")]
    SpawnProbability(f64),
    /// Caches must be able to hold at least one coin.
    #[error("max coins per cache must be at least 1")]
    MaxCoins,
    /// Origin must be a finite coordinate.
    #[error("origin must be a finite coordinate")]
    Origin,
}

/// A single mutation applied to a [`KeyValueStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreWrite {
    /// Stores `value` under `key`, replacing any prior value.
    Set {
        /// Key to write.
        key: String,
        /// Value stored under the key.
        value: String,
    },
    /// Deletes `key` if present.
    Remove {
        /// Key to delete.
        key: String,
    },
}

/// External string-valued key-value storage holding persisted sessions.
///
/// Implementations must apply a batch passed to [`KeyValueStore::write`]
/// entirely or not at all.
pub trait KeyValueStore {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Applies every write in the batch.
    fn write(&mut self, batch: Vec<StoreWrite>) -> Result<(), StoreError>;
}

/// Errors reported by [`KeyValueStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("could not access store at {path}: {source}")]
    Io {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file did not contain a valid key-value document.
    #[error("store at {path} is corrupt: {source}")]
    Corrupt {
        /// Location of the backing file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}
