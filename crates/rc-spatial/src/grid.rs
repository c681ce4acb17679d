//! Dense walkability grid used by the reference oracle.
//!
//! # Data layout
//!
//! Cells are stored row-major in flat arrays indexed by
//! `y * width + x`:
//!
//! ```text
//! wall_height[i]  : Option<i32>  None = open floor
//! terrain_cost[i] : u32          step-cost multiplier, 1 = normal
//! ```
//!
//! A wall blocks a traveller whose elevation is below its height.  Full walls
//! have height `i32::MAX` and block everyone.

use rc_core::{Cell, GridBounds};

/// Read-only grid.  Build it with [`GridMapBuilder`].
///
/// # Example
///
/// ```
/// use rc_core::{Cell, GridBounds};
/// use rc_spatial::GridMapBuilder;
///
/// let mut b = GridMapBuilder::new(GridBounds::new(8, 8));
/// b.wall(Cell::new(3, 3));
/// b.terrain(Cell::new(4, 4), 2);
/// let grid = b.build();
/// assert!(!grid.is_passable(Cell::new(3, 3), 0));
/// assert_eq!(grid.terrain_cost(Cell::new(4, 4)), 2);
/// ```
#[derive(Clone, Debug)]
pub struct GridMap {
    bounds:       GridBounds,
    wall_height:  Vec<Option<i32>>,
    terrain_cost: Vec<u32>,
}

impl GridMap {
    /// An open grid with no walls and uniform terrain.
    pub fn open(bounds: GridBounds) -> Self {
        GridMapBuilder::new(bounds).build()
    }

    #[inline]
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        self.bounds
            .contains(cell)
            .then(|| cell.y as usize * self.bounds.width as usize + cell.x as usize)
    }

    /// `true` if `cell` is in bounds and not blocked at `elevation`.
    pub fn is_passable(&self, cell: Cell, elevation: i32) -> bool {
        match self.index(cell) {
            Some(i) => self.wall_height[i].is_none_or(|h| elevation >= h),
            None => false,
        }
    }

    /// Terrain multiplier of `cell`; 1 outside the grid.
    pub fn terrain_cost(&self, cell: Cell) -> u32 {
        self.index(cell).map_or(1, |i| self.terrain_cost[i])
    }

    /// Cost of stepping into `cell`.  Diagonal and orthogonal steps cost the
    /// same.
    #[inline]
    pub fn step_cost(&self, cell: Cell, ignore_terrain: bool) -> u32 {
        if ignore_terrain { 1 } else { self.terrain_cost(cell) }
    }

    /// Flat index → cell, for the router's predecessor table.
    #[inline]
    pub(crate) fn cell_at(&self, index: usize) -> Cell {
        let w = self.bounds.width as usize;
        Cell::new((index % w) as i32, (index / w) as i32)
    }

    #[inline]
    pub(crate) fn flat_index(&self, cell: Cell) -> Option<usize> {
        self.index(cell)
    }

    #[inline]
    pub(crate) fn cell_count(&self) -> usize {
        self.bounds.area()
    }
}

// ── GridMapBuilder ────────────────────────────────────────────────────────────

/// Incrementally constructs a [`GridMap`].  Cells outside the bounds are
/// ignored.
pub struct GridMapBuilder {
    bounds:       GridBounds,
    wall_height:  Vec<Option<i32>>,
    terrain_cost: Vec<u32>,
}

impl GridMapBuilder {
    pub fn new(bounds: GridBounds) -> Self {
        let n = bounds.area();
        Self { bounds, wall_height: vec![None; n], terrain_cost: vec![1; n] }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.bounds
            .contains(cell)
            .then(|| cell.y as usize * self.bounds.width as usize + cell.x as usize)
    }

    /// A wall nobody can cross.
    pub fn wall(&mut self, cell: Cell) -> &mut Self {
        self.wall_with_height(cell, i32::MAX)
    }

    /// A wall that travellers at `height` or above can cross.
    pub fn wall_with_height(&mut self, cell: Cell, height: i32) -> &mut Self {
        if let Some(i) = self.index(cell) {
            self.wall_height[i] = Some(height);
        }
        self
    }

    /// Full walls along the straight/diagonal line from `from` to `to`.
    pub fn wall_line(&mut self, from: Cell, to: Cell) -> &mut Self {
        for cell in crate::densify(&[from, to]) {
            self.wall(cell);
        }
        self
    }

    /// Set the step-cost multiplier of `cell` (clamped to at least 1).
    pub fn terrain(&mut self, cell: Cell, cost: u32) -> &mut Self {
        if let Some(i) = self.index(cell) {
            self.terrain_cost[i] = cost.max(1);
        }
        self
    }

    pub fn build(&self) -> GridMap {
        GridMap {
            bounds:       self.bounds,
            wall_height:  self.wall_height.clone(),
            terrain_cost: self.terrain_cost.clone(),
        }
    }
}
