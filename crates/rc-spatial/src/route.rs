//! Routes and route shaping.
//!
//! A [`Route`] is the ordered list of cells an agent visits, start and
//! destination included.  Consecutive cells of a route handed to the engine
//! are adjacent (king-move), so one tick advances exactly one entry.
//!
//! Oracles that return sparse waypoints are expanded with [`densify`].
//! Gridless scenes step through continuous points first with
//! [`interpolate_points`] before those points are snapped to cells.

use std::ops::Index;
use std::sync::Arc;

use rc_core::{Cell, Point};

// ── Route ─────────────────────────────────────────────────────────────────────

/// An immutable, non-empty sequence of cells.
///
/// Cloning is cheap: the cells are shared behind an `Arc`, so movement
/// snapshots and the camera can hold the same route the scheduler steps.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    cells: Arc<[Cell]>,
}

impl Route {
    /// `None` if `cells` is empty.
    pub fn new(cells: Vec<Cell>) -> Option<Route> {
        (!cells.is_empty()).then(|| Route { cells: cells.into() })
    }

    /// A one-cell route: the agent is already where it needs to be.
    pub fn single(cell: Cell) -> Route {
        Route { cells: Arc::from([cell]) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `true` when start and destination coincide.
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.cells.len() == 1
    }

    #[inline]
    pub fn start(&self) -> Cell {
        self.cells[0]
    }

    #[inline]
    pub fn destination(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    #[inline]
    pub fn last_index(&self) -> usize {
        self.cells.len() - 1
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// The cell at `index`, clamped to the destination.
    #[inline]
    pub fn clamped(&self, index: usize) -> Cell {
        self.cells[index.min(self.last_index())]
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// `true` if every consecutive pair of cells is adjacent.
    pub fn is_contiguous(&self) -> bool {
        self.cells.windows(2).all(|w| w[0].is_adjacent(w[1]))
    }
}

impl Index<usize> for Route {
    type Output = Cell;

    fn index(&self, index: usize) -> &Cell {
        &self.cells[index]
    }
}

// ── Shaping ───────────────────────────────────────────────────────────────────

/// Expand waypoints into a per-cell path.
///
/// Each segment is walked diagonally until one axis is aligned, then
/// straight.  Repeated waypoints collapse.  The first and last waypoints are
/// always kept.
pub fn densify(waypoints: &[Cell]) -> Vec<Cell> {
    let Some(&first) = waypoints.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    let mut cur = first;
    for &target in &waypoints[1..] {
        while cur != target {
            cur = cur.offset((target.x - cur.x).signum(), (target.y - cur.y).signum());
            out.push(cur);
        }
    }
    out
}

/// Collapse a per-cell path to the cells where its direction changes.
///
/// Start and destination are always kept.
pub fn minimize_waypoints(cells: &[Cell]) -> Vec<Cell> {
    if cells.len() <= 2 {
        return cells.to_vec();
    }
    let dir = |a: Cell, b: Cell| ((b.x - a.x).signum(), (b.y - a.y).signum());
    let mut out = vec![cells[0]];
    for w in cells.windows(3) {
        if dir(w[0], w[1]) != dir(w[1], w[2]) {
            out.push(w[1]);
        }
    }
    out.push(cells[cells.len() - 1]);
    out
}

/// Subdivide a polyline so no segment is much longer than `step`.
///
/// Each segment of length `d` receives `max(floor(d / step), 1) - 1` evenly
/// spaced interior points.  The final point is always kept; an empty or
/// single-point input is returned unchanged.
pub fn interpolate_points(points: &[Point], step: f32) -> Vec<Point> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);
        let steps = ((a.distance(b) / step).floor() as usize).max(1);
        for i in 1..steps {
            out.push(a.lerp(b, i as f32 / steps as f32));
        }
    }
    out.push(last);
    out
}

/// Drop consecutive duplicates, e.g. after snapping points to cells.
pub fn dedup_cells(cells: impl IntoIterator<Item = Cell>) -> Vec<Cell> {
    let mut out: Vec<Cell> = Vec::new();
    for c in cells {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    out
}
