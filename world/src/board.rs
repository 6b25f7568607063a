//! Cell registry and grid geometry.

use std::{cell::RefCell, collections::HashMap};

use geocache_core::{Cell, CellBounds, CellKey, CoordinateError, GameConfig, Point};
use geocache_system_spawn_oracle::SpawnOracle;
use tracing::debug;

/// Registry handing out exactly one canonical [`Cell`] per coordinate pair.
///
/// The registry only grows. Lookups take `&self` so that read-only queries
/// can canonicalize cells; the world is driven from a single control flow.
#[derive(Clone, Debug, Default)]
pub struct CellRegistry {
    known: RefCell<HashMap<CellKey, Cell>>,
}

impl CellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical cell stored under `"{row}.{column}"`, inserting it
    /// on first request.
    pub fn canonicalize(&self, row: i32, column: i32) -> Cell {
        let candidate = Cell::new(row, column);
        let mut known = self.known.borrow_mut();
        let total = known.len();
        *known.entry(candidate.key()).or_insert_with(|| {
            debug!(key = %candidate.key(), known = total + 1, "registered cell");
            candidate
        })
    }

    /// Number of distinct cells registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.borrow().len()
    }

    /// Reports whether no cell has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.borrow().is_empty()
    }
}

/// Maps geographic points onto the cell grid and decides which cells spawn caches.
#[derive(Clone, Debug)]
pub struct Board {
    tile_width: f64,
    visibility_radius: u32,
    spawn_probability: f64,
    oracle: SpawnOracle,
    registry: CellRegistry,
}

impl Board {
    /// Creates a board from the grid parameters of `config`.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tile_width: config.tile_width(),
            visibility_radius: config.visibility_radius(),
            spawn_probability: config.spawn_probability(),
            oracle: SpawnOracle::new(config.seed()),
            registry: CellRegistry::new(),
        }
    }

    /// Canonical cell for an already discrete coordinate.
    pub fn canonical(&self, cell: Cell) -> Cell {
        self.registry.canonicalize(cell.row(), cell.column())
    }

    /// Cell containing `point`, found by floor division on both axes.
    ///
    /// Grid indices beyond the `i32` range saturate.
    pub fn cell_for_point(&self, point: Point) -> Cell {
        let row = (point.lat() / self.tile_width).floor() as i32;
        let column = (point.lng() / self.tile_width).floor() as i32;
        self.registry.canonicalize(row, column)
    }

    /// Geographic rectangle covered by `cell`.
    pub fn cell_bounds(&self, cell: Cell) -> Result<CellBounds, CoordinateError> {
        let row = f64::from(cell.row());
        let column = f64::from(cell.column());
        Ok(CellBounds {
            south_west: Point::new(row * self.tile_width, column * self.tile_width)?,
            north_east: Point::new(
                (row + 1.0) * self.tile_width,
                (column + 1.0) * self.tile_width,
            )?,
        })
    }

    /// Reports whether `cell` hosts a cache.
    #[must_use]
    pub fn spawns_cache(&self, cell: Cell) -> bool {
        self.oracle.spawns_cache(cell, self.spawn_probability)
    }

    /// Reports whether `cell` lies inside the visibility square around `centre`.
    #[must_use]
    pub fn is_visible_from(&self, centre: Cell, cell: Cell) -> bool {
        centre.chebyshev_distance(cell) <= self.visibility_radius
    }

    /// Every cache-hosting cell within the visibility radius of `point`, in
    /// row-major order.
    pub fn cells_near_point(&self, point: Point) -> Vec<Cell> {
        let origin = self.cell_for_point(point);
        let radius = i32::try_from(self.visibility_radius).unwrap_or(i32::MAX);
        let mut cells = Vec::new();
        for d_row in -radius..=radius {
            for d_column in -radius..=radius {
                let Some(candidate) = origin.offset(d_row, d_column) else {
                    continue;
                };
                if self.spawns_cache(candidate) {
                    cells.push(self.canonical(candidate));
                }
            }
        }
        cells
    }

    /// Registry backing the board's canonical cells.
    #[must_use]
    pub fn registry(&self) -> &CellRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(&GameConfig::new(1e-4, 8, 0.1))
    }

    #[test]
    fn canonicalize_returns_equal_cells_and_counts_distinct_keys() {
        let registry = CellRegistry::new();
        let first = registry.canonicalize(3, 4);
        let second = registry.canonicalize(3, 4);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        let _ = registry.canonicalize(4, 3);
        let _ = registry.canonicalize(-3, 4);
        let _ = registry.canonicalize(3, 4);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn cell_for_point_floors_negative_coordinates() {
        let board = board();
        let point = Point::new(-0.000_05, 0.000_25).expect("finite");
        assert_eq!(board.cell_for_point(point), Cell::new(-1, 2));
    }

    #[test]
    fn cell_bounds_span_one_tile() {
        let board = board();
        let bounds = board.cell_bounds(Cell::new(2, -3)).expect("finite bounds");
        assert!((bounds.south_west.lat() - 2e-4).abs() < 1e-12);
        assert!((bounds.south_west.lng() + 3e-4).abs() < 1e-12);
        assert!((bounds.north_east.lat() - 3e-4).abs() < 1e-12);
        assert!((bounds.north_east.lng() + 2e-4).abs() < 1e-12);
    }

    #[test]
    fn nearby_cells_stay_within_radius_and_all_spawn() {
        let board = board();
        let point = Point::new(0.0, 0.0).expect("finite");
        let cells = board.cells_near_point(point);
        assert!(cells.len() <= 17 * 17);
        for cell in &cells {
            assert!(board.is_visible_from(Cell::new(0, 0), *cell));
            assert!(board.spawns_cache(*cell));
        }
    }

    #[test]
    fn nearby_cells_are_row_major() {
        let board = board();
        let cells = board.cells_near_point(Point::new(0.0, 0.0).expect("finite"));
        let mut sorted = cells.clone();
        sorted.sort();
        assert_eq!(cells, sorted);
    }

    #[test]
    fn nearby_cells_skip_offsets_past_the_grid_edge() {
        let board = Board::new(&GameConfig::new(1.0, 2, 0.999));
        let edge = Point::new(f64::from(i32::MAX), 0.0).expect("finite");
        let cells = board.cells_near_point(edge);
        assert!(cells.iter().all(|cell| cell.row() >= i32::MAX - 2));
    }
}
