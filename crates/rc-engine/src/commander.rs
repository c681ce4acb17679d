//! Move-order entry point and lifecycle signals.
//!
//! The [`Commander`] turns host input into engine commands:
//!
//! ```text
//! order(agents, target):
//!   gate      disabled → Disabled, combat → CombatLocked, [] → NoAgents
//!   fan out   agents > 1: planner alternatives around the target
//!             agent 0 → target, agent i → alternative i-1 (or the target)
//!   route     one oracle query per agent, concurrently
//!   submit    EngineHandle::order per routed agent; failures → NoRoute
//!   follow    camera follows the first agent that started or redirected
//! ```
//!
//! Planning never blocks the tick loop: it runs on the caller's task, and
//! only finished routes reach the engine.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use rc_core::{AgentId, Cell, EngineConfig, Footprint, GridBounds, Point, SceneGeometry};
use rc_planner::{assign_destinations, AgentBody, Candidate, Planner};
use rc_spatial::{
    dedup_cells, densify, interpolate_points, query_cancellable, OracleError, PathOptions, PathOracle, Route,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::EngineHandle;
use crate::scheduler::OrderOutcome;
use crate::{EngineResult, OrderError, OrderResult};

// ── Inputs ────────────────────────────────────────────────────────────────────

/// A selected agent as the host sees it.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AgentRef {
    pub id:        AgentId,
    /// Top-left corner in scene pixels.
    pub top_left:  Point,
    pub footprint: Footprint,
}

impl AgentRef {
    pub fn new(id: AgentId, top_left: Point, footprint: Footprint) -> Self {
        Self { id, top_left, footprint }
    }

    /// The cell the agent stands on.
    #[inline]
    pub fn cell(&self, geometry: SceneGeometry) -> Cell {
        geometry.agent_cell(self.top_left, self.footprint)
    }

    #[inline]
    fn body(&self) -> AgentBody {
        AgentBody { top_left: self.top_left, footprint: self.footprint }
    }
}

/// Where to go.
#[derive(Clone, PartialEq, Debug)]
pub enum OrderTarget {
    /// A scene pixel, e.g. a translated click.
    Point(Point),
    Cell(Cell),
    /// An explicit route for a single agent.  No planning or path query.
    Route(Vec<Cell>),
}

/// Host state at the time of the order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct OrderContext {
    pub in_combat: bool,
}

/// Per-agent result of [`Commander::order`].
#[derive(Clone, PartialEq, Debug)]
pub enum AgentOrderResult {
    Accepted { agent: AgentId, destination: Cell, outcome: OrderOutcome },
    /// No movement started for this agent.  Not retried.
    NoRoute { agent: AgentId, destination: Cell, error: OracleError },
}

impl AgentOrderResult {
    pub fn agent(&self) -> AgentId {
        match self {
            AgentOrderResult::Accepted { agent, .. } | AgentOrderResult::NoRoute { agent, .. } => *agent,
        }
    }

    pub fn destination(&self) -> Cell {
        match self {
            AgentOrderResult::Accepted { destination, .. }
            | AgentOrderResult::NoRoute { destination, .. } => *destination,
        }
    }

    /// `true` if the agent now has a movement for this order.
    pub fn is_moving(&self) -> bool {
        matches!(self, AgentOrderResult::Accepted { outcome, .. } if outcome.is_accepted())
    }
}

/// Push-based host lifecycle events.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Signal {
    GlobalPause,
    GlobalResume,
    /// The scene was reset or replaced.
    SceneReset,
    /// The user asked to stop everything (e.g. Escape).
    CancelGesture,
    /// The user panned the viewport by hand.
    ManualPan,
}

// ── Commander ─────────────────────────────────────────────────────────────────

/// Move-order entry point for one scene.
pub struct Commander {
    config:   EngineConfig,
    engine:   EngineHandle,
    oracle:   Arc<dyn PathOracle>,
    planner:  Planner,
    /// Parent of every in-flight planning token.  Replaced on reset.
    planning: Mutex<CancellationToken>,
}

impl Commander {
    pub fn new(config: EngineConfig, bounds: GridBounds, oracle: Arc<dyn PathOracle>, engine: EngineHandle) -> Self {
        let planner = Planner::new(config.planner.clone(), bounds, engine.geometry());
        Self { config, engine, oracle, planner, planning: Mutex::new(CancellationToken::new()) }
    }

    #[inline]
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Move `agents` to `target`.  The first agent is the primary one.
    pub async fn order(
        &self,
        agents: &[AgentRef],
        target: OrderTarget,
        context: OrderContext,
    ) -> OrderResult<Vec<AgentOrderResult>> {
        if !self.config.enabled {
            return Err(OrderError::Disabled);
        }
        if context.in_combat && !self.config.allow_orders_in_combat {
            return Err(OrderError::CombatLocked);
        }
        let Some(primary) = agents.first() else {
            return Err(OrderError::NoAgents);
        };

        let results = match target {
            OrderTarget::Route(cells) => {
                if agents.len() > 1 {
                    return Err(OrderError::InvalidRoute("an explicit route moves a single agent"));
                }
                let route = Route::new(cells).ok_or(OrderError::InvalidRoute("route is empty"))?;
                let destination = route.destination();
                let outcome = self.engine.order(primary.id, route).await?;
                vec![AgentOrderResult::Accepted { agent: primary.id, destination, outcome }]
            }
            OrderTarget::Cell(cell) => {
                let point = self.engine.geometry().cell_center(cell);
                self.fan_out(agents, point).await?
            }
            OrderTarget::Point(point) => self.fan_out(agents, point).await?,
        };

        if self.config.camera_panning {
            self.follow_primary(&results);
        }
        Ok(results)
    }

    /// React to a host lifecycle event.
    pub async fn signal(&self, signal: Signal) -> EngineResult<()> {
        info!(?signal, "lifecycle signal");
        match signal {
            Signal::GlobalPause if self.config.cancel_on_pause => {
                self.engine.cancel_all().await?;
            }
            Signal::GlobalPause => {
                self.engine.pause_all().await?;
            }
            Signal::GlobalResume => {
                self.engine.resume_all().await?;
            }
            Signal::SceneReset => self.reset().await?,
            Signal::CancelGesture => {
                self.reset().await?;
                if let Some(effects) = self.engine.effects() {
                    effects.clear_all()?;
                }
            }
            Signal::ManualPan => {
                if let Some(camera) = self.engine.camera() {
                    camera.manual_pan()?;
                }
            }
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    async fn fan_out(&self, agents: &[AgentRef], destination: Point) -> OrderResult<Vec<AgentOrderResult>> {
        let geometry = self.engine.geometry();
        let token = self.planning_token();
        let target = geometry.point_to_cell(destination);

        let alternatives: Vec<Candidate> = if agents.len() > 1 {
            let bodies: Vec<AgentBody> = agents.iter().map(AgentRef::body).collect();
            match self.planner.alternatives(self.oracle.as_ref(), destination, &bodies, &token).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(destination = %target, error = %e, "no alternatives, agents share the destination");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let destinations = assign_destinations(target, &alternatives, agents.len());

        let options = PathOptions {
            ignore_terrain: false,
            elevation:      None,
            max_distance:   self.config.max_path_distance,
            interpolate:    geometry.is_gridless(),
        };
        let queries = agents
            .iter()
            .zip(&destinations)
            .map(|(agent, &to)| query_cancellable(self.oracle.as_ref(), agent.cell(geometry), to, &options, &token));
        let paths = join_all(queries).await;

        let mut results = Vec::with_capacity(agents.len());
        for ((agent, &destination), path) in agents.iter().zip(&destinations).zip(paths) {
            match path {
                Ok(path) => {
                    let route = shape_route(&path.route, geometry);
                    let outcome = self.engine.order(agent.id, route).await?;
                    results.push(AgentOrderResult::Accepted { agent: agent.id, destination, outcome });
                }
                Err(error) => {
                    warn!(agent = %agent.id, %destination, %error, "no route, movement not started");
                    results.push(AgentOrderResult::NoRoute { agent: agent.id, destination, error });
                }
            }
        }
        Ok(results)
    }

    fn follow_primary(&self, results: &[AgentOrderResult]) {
        let Some(camera) = self.engine.camera() else { return };
        let Some(first) = results.iter().find(|r| r.is_moving()) else { return };
        if let Err(e) = camera.follow(first.agent()) {
            warn!(agent = %first.agent(), error = %e, "camera follow failed");
        }
    }

    fn planning_token(&self) -> CancellationToken {
        self.planning.lock().unwrap_or_else(PoisonError::into_inner).child_token()
    }

    /// Abort in-flight planning, cancel every movement and hold the camera.
    async fn reset(&self) -> EngineResult<()> {
        {
            let mut parent = self.planning.lock().unwrap_or_else(PoisonError::into_inner);
            parent.cancel();
            *parent = CancellationToken::new();
        }
        let cancelled = self.engine.cancel_all().await?;
        debug!(cancelled, "scene reset");
        if let Some(camera) = self.engine.camera() {
            camera.manual_pan()?;
        }
        Ok(())
    }
}

/// Turn an oracle route into one entry per traversed cell.
///
/// Gridless routes arrive as waypoints.  Their centres are subdivided at the
/// virtual step size and snapped back to cells before densifying.
fn shape_route(route: &Route, geometry: SceneGeometry) -> Route {
    let cells = if geometry.is_gridless() {
        let centres: Vec<Point> = route.iter().map(|c| geometry.cell_center(c)).collect();
        let snapped = interpolate_points(&centres, geometry.cell_size())
            .into_iter()
            .map(|p| geometry.point_to_cell(p));
        densify(&dedup_cells(snapped))
    } else {
        densify(route.cells())
    };
    Route::new(cells).unwrap_or_else(|| route.clone())
}
