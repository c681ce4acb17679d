//! skirmish: a scripted tactical scene for the rts_controls movement engine.
//!
//! A squad starts on the west side of a walled 32×24 grid, is ordered through
//! a gap in the wall, has its leader redirected mid-route, and is finally
//! stopped by a cancel gesture.  Everything a host would draw or scroll is
//! logged instead.

mod sinks;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rc_core::{AgentId, Cell, EngineConfig, Footprint, GridBounds, SceneGeometry};
use rc_engine::{AgentOrderResult, AgentRef, Commander, EngineBuilder, EngineHandle, OrderContext, OrderTarget, Signal};
use rc_output::{CsvTraceWriter, TraceErrors, TraceObserver};
use rc_spatial::{GridMapBuilder, GridOracle};
use tracing::{info, warn};

use sinks::{LoggingEffects, LoggingPositions, LoggingViewport};

// ── Constants ─────────────────────────────────────────────────────────────────

const BOUNDS:    GridBounds = GridBounds::new(32, 24);
const CELL_SIZE: f32        = 100.0;
const RALLY:     Cell       = Cell::new(26, 12);
const FLANK:     Cell       = Cell::new(22, 20);

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "skirmish", version, about = "Scripted multi-agent movement demo")]
struct Cli {
    /// Engine configuration (JSON).  Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Squad size.
    #[arg(short, long, default_value = "6")]
    agents: u32,

    /// Tie-break seed; overrides the config file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write movement_trace.csv and tick_summaries.csv here.
    #[arg(short, long)]
    trace_dir: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("failed to create log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig { draw_trails: true, ..EngineConfig::default() },
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let period = config.tick_period();
    info!(agents = cli.agents, period_ms = period.as_millis() as u64, "starting skirmish");

    // 1. Terrain: a north-south wall with one gap, and a marsh east of it.
    let mut map = GridMapBuilder::new(BOUNDS);
    map.wall_line(Cell::new(14, 0), Cell::new(14, 9))
        .wall_line(Cell::new(14, 13), Cell::new(14, 23));
    for y in 14..20 {
        for x in 18..24 {
            map.terrain(Cell::new(x, y), 3);
        }
    }
    let oracle = Arc::new(GridOracle::new(map.build()));

    // 2. Engine, optionally traced.
    let geometry = SceneGeometry::Gridded { cell_size: CELL_SIZE };
    let mut builder = EngineBuilder::new(config.clone(), geometry, Arc::new(LoggingPositions))
        .effects(Arc::new(LoggingEffects))
        .viewport(Arc::new(LoggingViewport));
    let mut trace_errors: Option<TraceErrors> = None;
    if let Some(dir) = &cli.trace_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let trace = TraceObserver::new(CsvTraceWriter::new(dir)?);
        trace_errors = Some(trace.errors());
        builder = builder.observer(trace);
    }
    let (engine, task) = builder.build()?.spawn();
    let commander = Commander::new(config, BOUNDS, oracle, engine.clone());

    // 3. Squad order through the gap.
    let squad: Vec<AgentId> = (1..=cli.agents).map(AgentId).collect();
    let refs = agent_refs(&engine, &squad, geometry);
    let results = commander.order(&refs, OrderTarget::Cell(RALLY), OrderContext::default()).await?;
    report(&results);
    wait_ticks(period, 8).await;

    // 4. Send the leader around the marsh instead.
    if let Some(&leader) = squad.first() {
        let refs = agent_refs(&engine, &[leader], geometry);
        let results = commander.order(&refs, OrderTarget::Cell(FLANK), OrderContext::default()).await?;
        report(&results);
    }
    wait_ticks(period, 6).await;

    // 5. Pause, look around, resume.
    commander.signal(Signal::GlobalPause).await?;
    info!(moving = engine.snapshot().len(), "paused");
    tokio::time::sleep(period * 3).await;
    commander.signal(Signal::GlobalResume).await?;
    wait_ticks(period, 4).await;

    // 6. Stop everything.
    commander.signal(Signal::CancelGesture).await?;
    let snapshot = engine.snapshot();
    info!(tick = %snapshot.tick, moving = snapshot.len(), "cancel gesture");

    engine.shutdown();
    task.await.context("engine task panicked")?;

    if let Some(e) = trace_errors.and_then(|errors| errors.take()) {
        warn!(error = %e, "trace incomplete");
    } else if let Some(dir) = &cli.trace_dir {
        info!(dir = %dir.display(), "trace written");
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Where each agent stands right now.  Agents without a movement start in a
/// column two cells in from the west edge.
fn agent_refs(engine: &EngineHandle, agents: &[AgentId], geometry: SceneGeometry) -> Vec<AgentRef> {
    let snapshot = engine.snapshot();
    let body = Footprint::new(CELL_SIZE, CELL_SIZE);
    agents
        .iter()
        .map(|&id| {
            let cell = match snapshot.get(id) {
                Some(view) => view.current_cell(),
                None => Cell::new(2, 8 + id.0 as i32 % (BOUNDS.height - 8)),
            };
            AgentRef::new(id, geometry.cell_origin(cell), body)
        })
        .collect()
}

fn report(results: &[AgentOrderResult]) {
    for r in results {
        match r {
            AgentOrderResult::Accepted { agent, destination, outcome } => {
                info!(%agent, %destination, ?outcome, "order accepted");
            }
            AgentOrderResult::NoRoute { agent, destination, error } => {
                warn!(%agent, %destination, %error, "order failed");
            }
        }
    }
}

async fn wait_ticks(period: Duration, ticks: u32) {
    tokio::time::sleep(period * ticks + period / 2).await;
}
