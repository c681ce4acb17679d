//! Discrete cells, continuous scene points, and the conversion between them.
//!
//! The engine itself only ever reasons about [`Cell`]s.  On gridded scenes a
//! cell is a grid square; on gridless scenes it is a square of
//! `gridless_step` pixels on a virtual grid.  [`SceneGeometry`] performs the
//! conversion once, at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Cell ──────────────────────────────────────────────────────────────────────

/// A discrete unit of space, addressed by integer column/row.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell displaced by `(dx, dy)`.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Cell {
        Cell::new(self.x + dx, self.y + dy)
    }

    /// King-move distance: diagonal steps count as one.
    #[inline]
    pub fn chebyshev(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// `true` if `other` is one of the eight cells surrounding `self`.
    #[inline]
    pub fn is_adjacent(self, other: Cell) -> bool {
        self != other && self.chebyshev(other) == 1
    }

    /// The eight surrounding cells, orthogonal neighbours first.
    pub fn neighbors(self) -> [Cell; 8] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(-1, -1),
        ]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// A continuous scene coordinate in pixels.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// The point `t` of the way from `self` to `other`.
    #[inline]
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

// ── Footprint ─────────────────────────────────────────────────────────────────

/// Pixel size of an agent's body.  Agent positions are top-left corners, so
/// the footprint is needed to find the body centre.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Footprint {
    pub w: f32,
    pub h: f32,
}

impl Footprint {
    #[inline]
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    /// Body centre of an agent whose top-left corner is at `top_left`.
    #[inline]
    pub fn center_of(self, top_left: Point) -> Point {
        Point::new(top_left.x + self.w / 2.0, top_left.y + self.h / 2.0)
    }

    /// Top-left corner that puts the body centre on `center`.
    #[inline]
    pub fn top_left_for(self, center: Point) -> Point {
        Point::new(center.x - self.w / 2.0, center.y - self.h / 2.0)
    }

    /// Spacing added to the gridless search ring so neighbouring bodies do
    /// not overlap.  Roughly half the mean side length.
    #[inline]
    pub fn spacing_offset(self) -> f32 {
        (self.w + self.h) / 1.8 / 1.8
    }
}

// ── GridBounds ────────────────────────────────────────────────────────────────

/// The playable area: columns `0..width`, rows `0..height`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GridBounds {
    pub width:  i32,
    pub height: i32,
}

impl GridBounds {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Number of cells in the area.
    #[inline]
    pub fn area(self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}

// ── SceneGeometry ─────────────────────────────────────────────────────────────

/// How cells map onto scene pixels.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneGeometry {
    /// A real grid with square cells of `cell_size` pixels.
    Gridded { cell_size: f32 },
    /// A continuous scene, stepped on a virtual grid of `step` pixels.
    Gridless { step: f32 },
}

impl SceneGeometry {
    #[inline]
    pub fn is_gridless(self) -> bool {
        matches!(self, SceneGeometry::Gridless { .. })
    }

    /// Side length of one cell in pixels.
    #[inline]
    pub fn cell_size(self) -> f32 {
        match self {
            SceneGeometry::Gridded { cell_size } => cell_size,
            SceneGeometry::Gridless { step } => step,
        }
    }

    /// The cell containing `point`.
    pub fn point_to_cell(self, point: Point) -> Cell {
        let size = self.cell_size();
        Cell::new((point.x / size).floor() as i32, (point.y / size).floor() as i32)
    }

    /// Top-left pixel of `cell`.
    pub fn cell_origin(self, cell: Cell) -> Point {
        let size = self.cell_size();
        Point::new(cell.x as f32 * size, cell.y as f32 * size)
    }

    /// Centre pixel of `cell`.
    pub fn cell_center(self, cell: Cell) -> Point {
        let size = self.cell_size();
        Point::new(cell.x as f32 * size + size / 2.0, cell.y as f32 * size + size / 2.0)
    }

    /// The cell an agent occupies, judged from its body centre.
    pub fn agent_cell(self, top_left: Point, footprint: Footprint) -> Cell {
        match self {
            SceneGeometry::Gridded { .. } => self.point_to_cell(top_left),
            SceneGeometry::Gridless { .. } => self.point_to_cell(footprint.center_of(top_left)),
        }
    }
}
