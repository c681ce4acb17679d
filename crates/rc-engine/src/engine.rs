//! The async engine actor and its handle.
//!
//! One task owns the [`Scheduler`] and is the only writer of movement and
//! reservation state.  It reacts to three sources, in priority order:
//!
//! 1. shutdown (a `CancellationToken`),
//! 2. commands from [`EngineHandle`]s (each answered on a `oneshot`),
//! 3. the tick timer, which only exists while some movement wants to
//!    advance.  It is dropped when the last movement finishes or the host
//!    pauses, and recreated (one full period out) when work reappears.
//!
//! A tick runs detection, awaits the position sink for every approved step
//! concurrently, then commits.  Commands that arrive meanwhile wait in the
//! channel and are handled after the commit.
//!
//! After every command and every tick the actor forwards the scheduler's
//! effect requests to the [`EffectQueue`] and publishes a fresh
//! [`MovementSnapshot`] on a `watch` channel, before replying.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rc_camera::{CameraController, CameraHandle, ViewportSink};
use rc_core::{AgentId, EngineConfig, SceneGeometry};
use rc_effects::{EffectQueue, EffectSink};
use rc_movement::{Movement, MovementSnapshot};
use rc_spatial::Route;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::observer::{notify_tick, EngineObserver};
use crate::scheduler::{OrderOutcome, Scheduler};
use crate::sink::PositionSink;
use crate::{EngineError, EngineResult};

// ── Engine ────────────────────────────────────────────────────────────────────

/// A configured, not yet running engine.  Create via
/// [`EngineBuilder`](crate::EngineBuilder).
pub struct Engine {
    pub(crate) scheduler: Scheduler,
    pub(crate) config:    EngineConfig,
    pub(crate) geometry:  SceneGeometry,
    pub(crate) positions: Arc<dyn PositionSink>,
    pub(crate) effects:   Option<Arc<dyn EffectSink>>,
    pub(crate) viewport:  Option<Arc<dyn ViewportSink>>,
    pub(crate) observer:  Box<dyn EngineObserver>,
}

impl Engine {
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn the engine, its effect worker and its camera controller on the
    /// current runtime.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<()>) {
        let Engine { scheduler, config, geometry, positions, effects, viewport, observer } = self;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(scheduler.snapshot()));
        let effects = effects.map(|sink| EffectQueue::spawn(sink).0);
        let camera = viewport.map(|sink| {
            CameraController::new(config.camera.clone(), geometry, snapshot_rx.clone(), sink)
                .spawn()
                .0
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let actor = EngineActor {
            scheduler,
            positions,
            effects: effects.clone(),
            camera: camera.clone(),
            observer,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(actor.run(rx, shutdown.clone()));

        let handle = EngineHandle { tx, shutdown, snapshots: snapshot_rx, effects, camera, geometry };
        (handle, task)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

enum EngineCommand {
    Order { agent: AgentId, route: Route, reply: oneshot::Sender<OrderOutcome> },
    Cancel { agent: AgentId, reply: oneshot::Sender<bool> },
    CancelAll { reply: oneshot::Sender<usize> },
    PauseAll { reply: oneshot::Sender<usize> },
    ResumeAll { reply: oneshot::Sender<usize> },
    IsMoving { agent: AgentId, reply: oneshot::Sender<bool> },
}

/// Cloneable handle to a running engine.
///
/// The engine stops on [`shutdown`](Self::shutdown) or once every handle is
/// dropped.  Either way, every movement is cancelled on the way out.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx:        mpsc::UnboundedSender<EngineCommand>,
    shutdown:  CancellationToken,
    snapshots: watch::Receiver<Arc<MovementSnapshot>>,
    effects:   Option<EffectQueue>,
    camera:    Option<CameraHandle>,
    geometry:  SceneGeometry,
}

impl EngineHandle {
    /// Start or redirect the movement of `agent`.
    pub async fn order(&self, agent: AgentId, route: Route) -> EngineResult<OrderOutcome> {
        self.request(|reply| EngineCommand::Order { agent, route, reply }).await
    }

    /// `true` if a movement was cancelled.
    pub async fn cancel(&self, agent: AgentId) -> EngineResult<bool> {
        self.request(|reply| EngineCommand::Cancel { agent, reply }).await
    }

    /// Number of movements cancelled.
    pub async fn cancel_all(&self) -> EngineResult<usize> {
        self.request(|reply| EngineCommand::CancelAll { reply }).await
    }

    /// Host-pause every movement and stop ticking.
    pub async fn pause_all(&self) -> EngineResult<usize> {
        self.request(|reply| EngineCommand::PauseAll { reply }).await
    }

    /// Clear host pauses.  Ticking restarts if anything is left to move.
    pub async fn resume_all(&self) -> EngineResult<usize> {
        self.request(|reply| EngineCommand::ResumeAll { reply }).await
    }

    pub async fn is_moving(&self, agent: AgentId) -> EngineResult<bool> {
        self.request(|reply| EngineCommand::IsMoving { agent, reply }).await
    }

    /// The latest committed movement state.
    pub fn snapshot(&self) -> Arc<MovementSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// A receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MovementSnapshot>> {
        self.snapshots.clone()
    }

    /// The effect queue, when the engine was built with an effect sink.
    pub fn effects(&self) -> Option<&EffectQueue> {
        self.effects.as_ref()
    }

    /// The camera controller, when the engine was built with a viewport.
    pub fn camera(&self) -> Option<&CameraHandle> {
        self.camera.as_ref()
    }

    #[inline]
    pub fn geometry(&self) -> SceneGeometry {
        self.geometry
    }

    /// Cancel every movement and stop the engine task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> EngineCommand) -> EngineResult<T> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(make(tx)).map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

struct EngineActor {
    scheduler: Scheduler,
    positions: Arc<dyn PositionSink>,
    effects:   Option<EffectQueue>,
    camera:    Option<CameraHandle>,
    observer:  Box<dyn EngineObserver>,
    snapshots: watch::Sender<Arc<MovementSnapshot>>,
}

impl EngineActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineCommand>, shutdown: CancellationToken) {
        let period = self.scheduler.clock().period;
        info!(period_ms = period.as_millis() as u64, "engine started");

        let mut ticker: Option<Interval> = None;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                () = next_tick(&mut ticker) => self.tick().await,
            }
            self.sync_ticker(&mut ticker, period);
        }

        let cancelled = self.scheduler.cancel_all();
        self.cancelled(cancelled);
        self.settle();
        if let Some(queue) = &self.effects {
            let _ = queue.flush().await;
        }
        if let Some(camera) = &self.camera {
            camera.shutdown();
        }
        info!(tick = %self.scheduler.current_tick(), "engine stopped");
    }

    fn handle(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Order { agent, route, reply } => {
                let destination = route.destination();
                let outcome = self.scheduler.order(agent, route);
                self.observer.on_order(self.scheduler.current_tick(), agent, destination, outcome);
                if !outcome.is_accepted() {
                    self.release_camera(agent);
                }
                self.settle();
                let _ = reply.send(outcome);
            }
            EngineCommand::Cancel { agent, reply } => {
                let cancelled: Vec<Movement> = self.scheduler.cancel(agent).into_iter().collect();
                let found = !cancelled.is_empty();
                self.cancelled(cancelled);
                self.settle();
                let _ = reply.send(found);
            }
            EngineCommand::CancelAll { reply } => {
                let cancelled = self.scheduler.cancel_all();
                let n = cancelled.len();
                self.cancelled(cancelled);
                self.settle();
                info!(cancelled = n, "all movements cancelled");
                let _ = reply.send(n);
            }
            EngineCommand::PauseAll { reply } => {
                let n = self.scheduler.pause_all();
                self.settle();
                info!(paused = n, "host pause");
                let _ = reply.send(n);
            }
            EngineCommand::ResumeAll { reply } => {
                let n = self.scheduler.resume_all();
                self.settle();
                info!(resumed = n, "host resume");
                let _ = reply.send(n);
            }
            EngineCommand::IsMoving { agent, reply } => {
                let _ = reply.send(self.scheduler.is_moving(agent));
            }
        }
    }

    async fn tick(&mut self) {
        let plan = self.scheduler.detect();

        let positions = &self.positions;
        let updates = plan.steps.iter().map(|s| positions.update_position(s.agent, s.to));
        let results = join_all(updates).await;
        let failed: Vec<AgentId> = plan
            .steps
            .iter()
            .zip(results)
            .filter_map(|(step, result)| {
                let e = result.err()?;
                warn!(agent = %step.agent, cell = %step.to, error = %e, "position update failed, retrying next tick");
                Some(step.agent)
            })
            .collect();

        let report = self.scheduler.commit(plan, &failed);
        notify_tick(self.observer.as_mut(), &report);
        for &agent in &report.completed {
            self.release_camera(agent);
        }
        debug!(
            tick      = %report.tick,
            advanced  = report.advanced.len(),
            yielded   = report.yielded.len(),
            completed = report.completed.len(),
            failed    = report.failed.len(),
            active    = report.active,
            "tick committed"
        );
        self.settle();
    }

    /// Keep the timer in step with the scheduler: present while anything
    /// wants to move, absent otherwise.
    fn sync_ticker(&self, ticker: &mut Option<Interval>, period: Duration) {
        let wanted = self.scheduler.has_moving();
        match (wanted, ticker.is_some()) {
            (true, false) => {
                let mut t = interval_at(Instant::now() + period, period);
                t.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(t);
                debug!("ticker started");
            }
            (false, true) => {
                *ticker = None;
                debug!(tick = %self.scheduler.current_tick(), "ticker suspended");
            }
            _ => {}
        }
    }

    fn cancelled(&mut self, movements: Vec<Movement>) {
        let tick = self.scheduler.current_tick();
        for m in movements {
            self.observer.on_cancel(tick, m.agent, m.current_cell());
            self.release_camera(m.agent);
        }
    }

    fn release_camera(&self, agent: AgentId) {
        if let Some(camera) = &self.camera {
            if let Err(e) = camera.unfollow(agent) {
                debug!(%agent, error = %e, "camera unavailable");
            }
        }
    }

    /// Forward pending effects and publish the current snapshot.
    fn settle(&mut self) {
        let effects = self.scheduler.take_effects();
        if !effects.is_empty() {
            match &self.effects {
                Some(queue) => {
                    if let Err(e) = queue.submit_all(effects) {
                        warn!(error = %e, "effect queue unavailable, visuals dropped");
                    }
                }
                None => debug!(dropped = effects.len(), "no effect sink"),
            }
        }
        self.snapshots.send_replace(Arc::new(self.scheduler.snapshot()));
    }
}

/// Resolves on the next tick; never resolves while the ticker is suspended.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
