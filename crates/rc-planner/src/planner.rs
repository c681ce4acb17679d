//! Candidate generation and ranking.
//!
//! # Gridded scenes
//!
//! Every in-bounds cell of a square around the destination is costed with a
//! path query *from the destination to the cell*.  The cheapest entry (the
//! destination itself) is kept for the primary agent and dropped; the next
//! `n` are returned.
//!
//! # Gridless scenes
//!
//! `ceil(n × oversample)` points are spread evenly on a ring around the
//! destination and costed from the group's body-centre centroid.  Failed
//! queries rank last at `u32::MAX`.
//!
//! In both modes the queries run concurrently and a failed query only
//! demotes its candidate.

use futures::future::join_all;
use rc_core::{Cell, Footprint, GridBounds, PlannerConfig, Point, SceneGeometry};
use rc_spatial::{query_cancellable, PathOptions, PathOracle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{PlannerError, PlannerResult};

// ── Types ─────────────────────────────────────────────────────────────────────

/// A ranked alternative destination.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub cell: Cell,
    /// Oracle cost used for ranking; `u32::MAX` if the query failed.
    pub cost: u32,
}

impl Candidate {
    /// `false` for candidates whose query failed.
    #[inline]
    pub fn is_reachable(&self) -> bool {
        self.cost != u32::MAX
    }
}

/// Where an agent's body is, for centroid and spacing calculations.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AgentBody {
    /// Top-left corner in scene pixels.
    pub top_left:  Point,
    pub footprint: Footprint,
}

impl AgentBody {
    #[inline]
    pub fn center(&self) -> Point {
        self.footprint.center_of(self.top_left)
    }
}

/// Body-centre centroid of a group.  `None` for an empty group.
pub fn centroid(bodies: &[AgentBody]) -> Option<Point> {
    if bodies.is_empty() {
        return None;
    }
    let (sx, sy) = bodies
        .iter()
        .map(AgentBody::center)
        .fold((0.0f32, 0.0f32), |(x, y), c| (x + c.x, y + c.y));
    let n = bodies.len() as f32;
    Some(Point::new(sx / n, sy / n))
}

// ── Planner ───────────────────────────────────────────────────────────────────

/// Stateless alternative-destination planner for one scene.
#[derive(Clone, Debug)]
pub struct Planner {
    config:   PlannerConfig,
    bounds:   GridBounds,
    geometry: SceneGeometry,
}

impl Planner {
    pub fn new(config: PlannerConfig, bounds: GridBounds, geometry: SceneGeometry) -> Self {
        Self { config, bounds, geometry }
    }

    #[inline]
    pub fn geometry(&self) -> SceneGeometry {
        self.geometry
    }

    /// Up to `bodies.len() - 1` alternatives around `destination`, one per
    /// non-primary agent, using the algorithm for the scene's geometry.
    pub async fn alternatives(
        &self,
        oracle: &dyn PathOracle,
        destination: Point,
        bodies: &[AgentBody],
        token: &CancellationToken,
    ) -> PlannerResult<Vec<Candidate>> {
        if bodies.is_empty() {
            return Err(PlannerError::EmptyGroup);
        }
        if self.geometry.is_gridless() {
            self.gridless(oracle, destination, bodies, token).await
        } else {
            let cell = self.geometry.point_to_cell(destination);
            self.gridded(oracle, cell, bodies.len(), token).await
        }
    }

    /// Up to `group - 1` distinct cells near `destination`, cheapest first.
    /// The search square's half-width is the group size, capped.
    pub async fn gridded(
        &self,
        oracle: &dyn PathOracle,
        destination: Cell,
        group: usize,
        token: &CancellationToken,
    ) -> PlannerResult<Vec<Candidate>> {
        let n = group.saturating_sub(1);
        if n == 0 {
            return Ok(Vec::new());
        }
        let half = group.min(self.config.max_half_width as usize) as i32;
        let cells: Vec<Cell> = (-half..=half)
            .flat_map(|dx| (-half..=half).map(move |dy| destination.offset(dx, dy)))
            .filter(|&c| self.bounds.contains(c))
            .collect();

        let options = PathOptions { interpolate: false, ..PathOptions::default() };
        let queries = cells
            .iter()
            .map(|&cell| query_cancellable(oracle, destination, cell, &options, token));
        let results = join_all(queries).await;
        if token.is_cancelled() {
            return Err(PlannerError::Cancelled);
        }

        let mut ranked: Vec<Candidate> = cells
            .iter()
            .zip(results)
            .filter_map(|(&cell, result)| match result {
                Ok(path) => Some(Candidate { cell, cost: path.cost }),
                Err(e) => {
                    debug!(%cell, error = %e, "planner: candidate unreachable");
                    None
                }
            })
            .collect();
        if ranked.is_empty() {
            return Err(PlannerError::NoCandidates { destination });
        }

        // Stable: equal costs keep enumeration order.
        ranked.sort_by_key(|c| c.cost);
        let picked: Vec<Candidate> = ranked.into_iter().skip(1).take(n).collect();
        debug!(%destination, requested = n, found = picked.len(), "planner: gridded alternatives");
        Ok(picked)
    }

    /// Up to `bodies.len() - 1` distinct cells on a ring around
    /// `destination`, cheapest first.  The ring is sized from the
    /// non-primary agents and queried from their centroid.
    pub async fn gridless(
        &self,
        oracle: &dyn PathOracle,
        destination: Point,
        bodies: &[AgentBody],
        token: &CancellationToken,
    ) -> PlannerResult<Vec<Candidate>> {
        let Some((_, others)) = bodies.split_first() else {
            return Err(PlannerError::EmptyGroup);
        };
        let (Some(center), Some(lead)) = (centroid(others), others.first()) else {
            return Ok(Vec::new());
        };
        let n = others.len();

        let total = (n as f32 * self.config.oversample).ceil().max(1.0) as usize;
        let radius = self.config.search_radius + lead.footprint.spacing_offset();
        let angle_step = 360.0 / total as f32;
        let cells: Vec<Cell> = (0..total)
            .map(|i| {
                let angle = (angle_step * i as f32).to_radians();
                let p = Point::new(
                    destination.x + radius * angle.cos(),
                    destination.y + radius * angle.sin(),
                );
                self.geometry.point_to_cell(p)
            })
            .collect();

        let from = self.geometry.point_to_cell(center);
        let options = PathOptions { ignore_terrain: false, ..PathOptions::default() };
        let queries = cells
            .iter()
            .map(|&cell| query_cancellable(oracle, from, cell, &options, token));
        let results = join_all(queries).await;
        if token.is_cancelled() {
            return Err(PlannerError::Cancelled);
        }

        let mut ranked: Vec<Candidate> = cells
            .iter()
            .zip(results)
            .map(|(&cell, result)| Candidate { cell, cost: result.map_or(u32::MAX, |p| p.cost) })
            .collect();
        if ranked.iter().all(|c| !c.is_reachable()) {
            return Err(PlannerError::NoCandidates { destination: self.geometry.point_to_cell(destination) });
        }

        ranked.sort_by_key(|c| c.cost);
        // Several ring points can snap to the same cell.
        let mut picked: Vec<Candidate> = Vec::with_capacity(n);
        for c in ranked {
            if picked.len() == n {
                break;
            }
            if !picked.iter().any(|p| p.cell == c.cell) {
                picked.push(c);
            }
        }
        debug!(%destination, requested = n, found = picked.len(), "planner: gridless alternatives");
        Ok(picked)
    }
}

/// One destination per agent: the requested cell for the first agent, then
/// alternative `i - 1` for agent `i`, falling back to the requested cell.
pub fn assign_destinations(destination: Cell, candidates: &[Candidate], agent_count: usize) -> Vec<Cell> {
    (0..agent_count)
        .map(|i| match i {
            0 => destination,
            _ => candidates.get(i - 1).map_or(destination, |c| c.cell),
        })
        .collect()
}
