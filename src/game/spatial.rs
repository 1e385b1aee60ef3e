//! Uniform grid for O(n) neighbor queries
//!
//! Divides the canvas into square cells and stores particle slots in each cell.
//! A query returns everything in the 3x3 block of cells around a point, which
//! is a superset of the particles within one cell size of it. Callers must
//! apply their own exact distance test.
//!
//! The grid is a snapshot: it is rebuilt once per tick from current positions
//! and is stale as soon as any particle moves.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::game::constants::grid::CELL_SIZE;
use crate::game::state::ParticleId;
use crate::util::vec2::Vec2;

/// Initial capacity for the cell map (number of expected non-empty cells)
const GRID_INITIAL_CAPACITY: usize = 1024;

/// Initial capacity for particle vectors within cells
const CELL_INITIAL_CAPACITY: usize = 8;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// Spatial hash grid over particle slots
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    /// Map from cell key to particle slots in that cell, in insertion order
    cells: HashMap<CellKey, Vec<ParticleId>, FxBuildHasher>,
    /// Number of particles inserted since the last clear
    len: usize,
    /// Offsets of the 3x3 query block, scanned in row-major order
    neighbor_offsets: [(i32, i32); 9],
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity_and_hasher(GRID_INITIAL_CAPACITY, FxBuildHasher),
            len: 0,
            neighbor_offsets: [
                (-1, -1), (0, -1), (1, -1),
                (-1,  0), (0,  0), (1,  0),
                (-1,  1), (0,  1), (1,  1),
            ],
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Discard all cell contents; cell allocations are kept for reuse
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.len = 0;
    }

    /// Convert a position to its cell key. No bounds checking: positions
    /// outside the canvas map to their own cells.
    #[inline]
    pub fn cell_of(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn insert(&mut self, id: ParticleId, position: Vec2) {
        let key = self.cell_of(position);
        self.cells
            .entry(key)
            .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY))
            .push(id);
        self.len += 1;
    }

    /// Clear and reinsert every particle
    pub fn rebuild(&mut self, positions: impl Iterator<Item = (ParticleId, Vec2)>) {
        self.clear();
        for (id, position) in positions {
            self.insert(id, position);
        }
    }

    /// All particle slots in the cell containing `position` and its 8 neighbors.
    ///
    /// Iteration order is deterministic: cells row-major from the top-left,
    /// slots within a cell in insertion order.
    pub fn query_nearby(&self, position: Vec2) -> impl Iterator<Item = ParticleId> + '_ {
        let (cx, cy) = self.cell_of(position);

        self.neighbor_offsets.iter().flat_map(move |&(dx, dy)| {
            self.cells
                .get(&(cx + dx, cy + dy))
                .into_iter()
                .flat_map(|cell| cell.iter().copied())
        })
    }

    /// Number of particles currently indexed
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get occupancy statistics
    pub fn stats(&self) -> SpatialIndexStats {
        let occupied_cells = self.cells.values().filter(|c| !c.is_empty()).count();
        let max_per_cell = self.cells.values().map(|c| c.len()).max().unwrap_or(0);

        SpatialIndexStats {
            occupied_cells,
            particle_count: self.len,
            max_per_cell,
        }
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}

/// Occupancy statistics for the spatial index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialIndexStats {
    pub occupied_cells: usize,
    pub particle_count: usize,
    pub max_per_cell: usize,
}
