//! Camera controller task.
//!
//! The controller owns its own sampling timer, independent of the engine's
//! tick.  It reads the latest committed [`MovementSnapshot`] from a `watch`
//! channel and never writes movement state.
//!
//! Only one agent is followed at a time.  A new `follow` replaces the
//! previous one and restarts the timer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rc_core::{AgentId, CameraConfig, Point, SceneGeometry};
use rc_movement::MovementSnapshot;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::follow::{CameraFollow, FollowDecision};
use crate::{CameraError, CameraResult};

// ── ViewportSink ──────────────────────────────────────────────────────────────

/// A smooth pan of the host viewport.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PanRequest {
    /// Scene pixel to centre on.
    pub target:   Point,
    pub duration: Duration,
}

/// Host viewport.
#[async_trait]
pub trait ViewportSink: Send + Sync {
    async fn pan_to(&self, request: PanRequest) -> CameraResult<()>;
}

// ── Commands ──────────────────────────────────────────────────────────────────

enum CameraCommand {
    Follow(AgentId),
    /// Stop following `agent` if it is the one being followed.
    Unfollow(AgentId),
    Stop,
    ManualPan,
    Current(oneshot::Sender<Option<AgentId>>),
}

/// Cloneable handle to the controller task.
#[derive(Clone, Debug)]
pub struct CameraHandle {
    tx:       mpsc::UnboundedSender<CameraCommand>,
    shutdown: CancellationToken,
}

impl CameraHandle {
    /// Start following `agent`, replacing any current follow.
    pub fn follow(&self, agent: AgentId) -> CameraResult<()> {
        self.send(CameraCommand::Follow(agent))
    }

    /// Stop following `agent`; a no-op if another agent is followed.
    pub fn unfollow(&self, agent: AgentId) -> CameraResult<()> {
        self.send(CameraCommand::Unfollow(agent))
    }

    pub fn stop(&self) -> CameraResult<()> {
        self.send(CameraCommand::Stop)
    }

    /// A user-initiated pan was detected.
    pub fn manual_pan(&self) -> CameraResult<()> {
        self.send(CameraCommand::ManualPan)
    }

    /// The agent currently followed.
    pub async fn current(&self) -> CameraResult<Option<AgentId>> {
        let (tx, rx) = oneshot::channel();
        self.send(CameraCommand::Current(tx))?;
        rx.await.map_err(|_| CameraError::Closed)
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn send(&self, cmd: CameraCommand) -> CameraResult<()> {
        self.tx.send(cmd).map_err(|_| CameraError::Closed)
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

struct Following {
    agent:  AgentId,
    ticker: Interval,
}

/// Camera follow controller for one scene.
pub struct CameraController {
    config:    CameraConfig,
    geometry:  SceneGeometry,
    snapshots: watch::Receiver<Arc<MovementSnapshot>>,
    viewport:  Arc<dyn ViewportSink>,
    logic:     CameraFollow,
}

impl CameraController {
    pub fn new(
        config: CameraConfig,
        geometry: SceneGeometry,
        snapshots: watch::Receiver<Arc<MovementSnapshot>>,
        viewport: Arc<dyn ViewportSink>,
    ) -> Self {
        let gridless = geometry.is_gridless();
        let logic = CameraFollow::new(config.lookahead(gridless), config.manual_pan_cooldown());
        Self { config, geometry, snapshots, viewport, logic }
    }

    /// Spawn the controller on the current runtime.
    pub fn spawn(self) -> (CameraHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(rx, shutdown.clone()));
        (CameraHandle { tx, shutdown }, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CameraCommand>, shutdown: CancellationToken) {
        let gridless = self.geometry.is_gridless();
        let period = self.config.sample_interval(gridless);
        info!(period_ms = period.as_millis() as u64, gridless, "camera controller started");

        let mut following: Option<Following> = None;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                cmd = rx.recv() => match cmd {
                    None => break,
                    Some(CameraCommand::Follow(agent)) => {
                        debug!(%agent, "camera: follow");
                        let mut ticker = interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        following = Some(Following { agent, ticker });
                    }
                    Some(CameraCommand::Unfollow(agent)) => {
                        if following.as_ref().is_some_and(|f| f.agent == agent) {
                            debug!(%agent, "camera: unfollow");
                            following = None;
                        }
                    }
                    Some(CameraCommand::Stop) => following = None,
                    Some(CameraCommand::ManualPan) => {
                        debug!("camera: manual pan, suppressing follow");
                        self.logic.suppress(Instant::now());
                    }
                    Some(CameraCommand::Current(reply)) => {
                        let _ = reply.send(following.as_ref().map(|f| f.agent));
                    }
                },
                agent = next_sample(&mut following) => {
                    if !self.sample(agent, gridless).await {
                        debug!(%agent, "camera: followed movement ended");
                        following = None;
                    }
                }
            }
        }
        info!("camera controller stopped");
    }

    /// Returns `false` when following should stop.
    async fn sample(&mut self, agent: AgentId, gridless: bool) -> bool {
        let snapshot = Arc::clone(&self.snapshots.borrow());
        match self.logic.sample(snapshot.get(agent), Instant::now()) {
            FollowDecision::Stop => false,
            FollowDecision::Skip => true,
            FollowDecision::Pan(cell) => {
                let request = PanRequest {
                    target:   self.geometry.cell_center(cell),
                    duration: self.config.pan_duration(gridless),
                };
                if let Err(e) = self.viewport.pan_to(request).await {
                    warn!(%agent, error = %e, "camera pan failed");
                }
                true
            }
        }
    }
}

/// Resolves on the followed agent's next sampling instant; never resolves
/// while nothing is followed.
async fn next_sample(following: &mut Option<Following>) -> AgentId {
    match following {
        Some(f) => {
            f.ticker.tick().await;
            f.agent
        }
        None => std::future::pending().await,
    }
}
