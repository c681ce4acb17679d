//! Path-oracle interface and the reference grid implementation.
//!
//! # Pluggability
//!
//! The engine and the planner call routing through the [`PathOracle`] trait,
//! so hosts can plug in their own pathfinder (a navmesh, a remote service)
//! without touching the engine.  [`GridOracle`] is the reference
//! implementation: Dijkstra over an 8-connected [`GridMap`].
//!
//! # Cost units
//!
//! Costs are unitless `u32`s: one per step, multiplied by the terrain cost of
//! the entered cell unless terrain is ignored.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use async_trait::async_trait;
use rc_core::Cell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::grid::GridMap;
use crate::route::{minimize_waypoints, Route};
use crate::{OracleError, OracleResult};

// ── Query types ───────────────────────────────────────────────────────────────

/// Options recognised by a path query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathOptions {
    /// Treat every step as cost 1.
    pub ignore_terrain: bool,
    /// Traveller elevation; walls at or below it are crossable.  `None` = 0.
    pub elevation:      Option<i32>,
    /// Reject routes costing more than this.
    pub max_distance:   Option<u32>,
    /// `true`: minimal waypoints.  `false`: one entry per traversed cell.
    pub interpolate:    bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self { ignore_terrain: false, elevation: None, max_distance: None, interpolate: true }
    }
}

/// A successful query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    pub route: Route,
    pub cost:  u32,
}

// ── PathOracle trait ──────────────────────────────────────────────────────────

/// Pluggable asynchronous pathfinder.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the planner issues queries
/// concurrently and the engine shares the oracle as `Arc<dyn PathOracle>`.
#[async_trait]
pub trait PathOracle: Send + Sync {
    /// Route from `from` to `to`.  `from == to` yields a one-cell route.
    async fn calculate(
        &self,
        from: Cell,
        to: Cell,
        options: &PathOptions,
    ) -> OracleResult<PathResult>;
}

#[async_trait]
impl<T: PathOracle + ?Sized> PathOracle for Arc<T> {
    async fn calculate(
        &self,
        from: Cell,
        to: Cell,
        options: &PathOptions,
    ) -> OracleResult<PathResult> {
        (**self).calculate(from, to, options).await
    }
}

/// Run a query that resolves to [`OracleError::Cancelled`] as soon as
/// `token` fires.
pub async fn query_cancellable(
    oracle: &dyn PathOracle,
    from: Cell,
    to: Cell,
    options: &PathOptions,
    token: &CancellationToken,
) -> OracleResult<PathResult> {
    if token.is_cancelled() {
        return Err(OracleError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(OracleError::Cancelled),
        result = oracle.calculate(from, to, options) => result,
    }
}

// ── GridOracle ────────────────────────────────────────────────────────────────

/// Dijkstra over a shared [`GridMap`].
///
/// Queries are CPU-bound and finish without suspending.
#[derive(Clone, Debug)]
pub struct GridOracle {
    grid: Arc<GridMap>,
}

impl GridOracle {
    pub fn new(grid: GridMap) -> Self {
        Self { grid: Arc::new(grid) }
    }

    pub fn from_shared(grid: Arc<GridMap>) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Synchronous form of [`PathOracle::calculate`].
    pub fn route(&self, from: Cell, to: Cell, options: &PathOptions) -> OracleResult<PathResult> {
        let grid = &*self.grid;
        for cell in [from, to] {
            if !grid.bounds().contains(cell) {
                return Err(OracleError::OutOfBounds(cell));
            }
        }
        let elevation = options.elevation.unwrap_or(0);
        if !grid.is_passable(to, elevation) {
            return Err(OracleError::NoRoute { from, to });
        }

        let Some((cells, cost)) = dijkstra(grid, from, to, elevation, options.ignore_terrain)
        else {
            debug!(%from, %to, elevation, "grid oracle: destination unreachable");
            return Err(OracleError::NoRoute { from, to });
        };

        if let Some(max) = options.max_distance {
            if cost > max {
                return Err(OracleError::ExceedsMaxDistance { cost, max });
            }
        }

        let cells = if options.interpolate { minimize_waypoints(&cells) } else { cells };
        let route = Route::new(cells).ok_or(OracleError::NoRoute { from, to })?;
        Ok(PathResult { route, cost })
    }
}

#[async_trait]
impl PathOracle for GridOracle {
    async fn calculate(
        &self,
        from: Cell,
        to: Cell,
        options: &PathOptions,
    ) -> OracleResult<PathResult> {
        self.route(from, to, options)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

const UNREACHED: usize = usize::MAX;

/// Per-cell path and total cost, or `None` if `to` is unreachable.
///
/// The start cell is never checked for passability: an agent standing on a
/// wall can still walk off it.
fn dijkstra(
    grid: &GridMap,
    from: Cell,
    to: Cell,
    elevation: i32,
    ignore_terrain: bool,
) -> Option<(Vec<Cell>, u32)> {
    let (start, goal) = (grid.flat_index(from)?, grid.flat_index(to)?);
    if start == goal {
        return Some((vec![from], 0));
    }

    let n = grid.cell_count();
    // dist[i] = best known cost to reach cell i.
    let mut dist = vec![u32::MAX; n];
    // prev[i] = flat index that reached cell i.
    let mut prev = vec![UNREACHED; n];
    dist[start] = 0;

    // Secondary key Cell gives deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u32, Cell)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, cell))) = heap.pop() {
        let Some(i) = grid.flat_index(cell) else { continue };
        if i == goal {
            return Some((reconstruct(grid, &prev, start, goal), cost));
        }
        // Skip stale heap entries.
        if cost > dist[i] {
            continue;
        }
        for next in cell.neighbors() {
            if !grid.is_passable(next, elevation) {
                continue;
            }
            let Some(j) = grid.flat_index(next) else { continue };
            let new_cost = cost.saturating_add(grid.step_cost(next, ignore_terrain));
            if new_cost < dist[j] {
                dist[j] = new_cost;
                prev[j] = i;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }
    None
}

fn reconstruct(grid: &GridMap, prev: &[usize], start: usize, goal: usize) -> Vec<Cell> {
    let mut cells = vec![grid.cell_at(goal)];
    let mut cur = goal;
    while cur != start {
        cur = prev[cur];
        cells.push(grid.cell_at(cur));
    }
    cells.reverse();
    cells
}
