//! Unit tests for rc-engine.

#[cfg(test)]
mod helpers {
    use std::collections::{BTreeSet, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rc_camera::{CameraResult, PanRequest, ViewportSink};
    use rc_core::{AgentId, Cell, EngineConfig, Tick};
    use rc_effects::{EffectKey, EffectPayload, EffectResult, EffectSink};
    use rc_movement::PauseReason;
    use rc_spatial::{densify, Route};

    use crate::{
        EngineObserver, LowestIdTieBreak, OrderOutcome, PositionSink, Scheduler, SinkError, TickReport,
    };

    pub const A: AgentId = AgentId(1);
    pub const B: AgentId = AgentId(2);
    pub const C: AgentId = AgentId(3);
    pub const D: AgentId = AgentId(4);

    /// Per-cell route through the given waypoints.
    pub fn route(points: &[(i32, i32)]) -> Route {
        let cells: Vec<Cell> = points.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        Route::new(densify(&cells)).unwrap()
    }

    pub fn config() -> EngineConfig {
        EngineConfig { seed: Some(7), ..EngineConfig::default() }
    }

    pub fn trails_config() -> EngineConfig {
        EngineConfig { draw_trails: true, ..config() }
    }

    pub fn scheduler() -> Scheduler {
        Scheduler::new(&config(), Box::new(LowestIdTieBreak))
    }

    /// Tick until nothing wants to move, at most `max` times.
    pub fn run_until_idle(s: &mut Scheduler, max: usize) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while s.has_moving() && reports.len() < max {
            reports.push(s.run_tick());
        }
        reports
    }

    // ── Recording collaborators ───────────────────────────────────────────

    #[derive(Default)]
    pub struct RecordingPositions {
        pub updates: Mutex<Vec<(AgentId, Cell)>>,
        pub fail:    Mutex<HashSet<AgentId>>,
    }

    impl RecordingPositions {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn updates(&self) -> Vec<(AgentId, Cell)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PositionSink for RecordingPositions {
        async fn update_position(&self, agent: AgentId, cell: Cell) -> Result<(), SinkError> {
            if self.fail.lock().unwrap().contains(&agent) {
                return Err(SinkError("host offline".into()));
            }
            self.updates.lock().unwrap().push((agent, cell));
            Ok(())
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum Event {
        Order(AgentId, OrderOutcome),
        Step(Tick, AgentId, Cell),
        Yield(AgentId, PauseReason),
        Failed(AgentId, Cell),
        Complete(AgentId),
        Cancel(AgentId, Cell),
    }

    #[derive(Clone, Default)]
    pub struct RecordingObserver {
        pub events: Arc<Mutex<Vec<Event>>>,
        pub ticks:  Arc<Mutex<Vec<Tick>>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn tick_count(&self) -> usize {
            self.ticks.lock().unwrap().len()
        }

        fn push(&self, e: Event) {
            self.events.lock().unwrap().push(e);
        }
    }

    impl EngineObserver for RecordingObserver {
        fn on_order(&mut self, _tick: Tick, agent: AgentId, _destination: Cell, outcome: OrderOutcome) {
            self.push(Event::Order(agent, outcome));
        }

        fn on_step(&mut self, tick: Tick, agent: AgentId, cell: Cell) {
            self.push(Event::Step(tick, agent, cell));
        }

        fn on_yield(&mut self, _tick: Tick, agent: AgentId, reason: PauseReason) {
            self.push(Event::Yield(agent, reason));
        }

        fn on_step_failed(&mut self, _tick: Tick, agent: AgentId, cell: Cell) {
            self.push(Event::Failed(agent, cell));
        }

        fn on_complete(&mut self, _tick: Tick, agent: AgentId) {
            self.push(Event::Complete(agent));
        }

        fn on_cancel(&mut self, _tick: Tick, agent: AgentId, at: Cell) {
            self.push(Event::Cancel(agent, at));
        }

        fn on_tick_end(&mut self, report: &TickReport) {
            self.ticks.lock().unwrap().push(report.tick);
        }
    }

    /// Records sink calls and which visuals are currently drawn.
    #[derive(Default)]
    pub struct RecordingEffects {
        pub ops:  Mutex<Vec<(&'static str, EffectKey)>>,
        pub live: Mutex<BTreeSet<EffectKey>>,
    }

    impl RecordingEffects {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn ops(&self) -> Vec<(&'static str, EffectKey)> {
            self.ops.lock().unwrap().clone()
        }

        pub fn live(&self) -> BTreeSet<EffectKey> {
            self.live.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EffectSink for RecordingEffects {
        async fn create_effect(&self, key: EffectKey, _payload: &EffectPayload) -> EffectResult<()> {
            self.ops.lock().unwrap().push(("create", key));
            self.live.lock().unwrap().insert(key);
            Ok(())
        }

        async fn update_effect(&self, key: EffectKey, _payload: &EffectPayload) -> EffectResult<()> {
            self.ops.lock().unwrap().push(("update", key));
            Ok(())
        }

        async fn delete_effect(&self, key: EffectKey) -> EffectResult<()> {
            self.ops.lock().unwrap().push(("delete", key));
            self.live.lock().unwrap().remove(&key);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingViewport {
        pub pans: Mutex<Vec<PanRequest>>,
    }

    #[async_trait]
    impl ViewportSink for RecordingViewport {
        async fn pan_to(&self, request: PanRequest) -> CameraResult<()> {
            self.pans.lock().unwrap().push(request);
            Ok(())
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use std::collections::HashSet;

    use rc_core::{AgentId, Cell, EngineRng};
    use rc_effects::{EffectKey, EffectKind, EffectRequest};
    use rc_movement::{MovementState, PauseReason};

    use super::helpers::{config, route, run_until_idle, scheduler, trails_config, A, B, C, D};
    use crate::{LowestIdTieBreak, OrderOutcome, RandomTieBreak, Scheduler};

    #[test]
    fn single_occupancy_per_tick() {
        let mut s = Scheduler::new(&config(), Box::new(RandomTieBreak::new(EngineRng::new(3))));
        s.order(A, route(&[(0, 0), (4, 4)]));
        s.order(B, route(&[(4, 0), (0, 4)]));
        s.order(C, route(&[(0, 2), (4, 2)]));
        s.order(D, route(&[(2, 0), (2, 4)]));

        let reports = run_until_idle(&mut s, 200);
        for r in &reports {
            let cells: HashSet<Cell> = r.advanced.iter().map(|&(_, c)| c).collect();
            assert_eq!(cells.len(), r.advanced.len(), "two agents entered one cell in {}", r.tick);
        }
        let completed: usize = reports.iter().map(|r| r.completed.len()).sum();
        assert_eq!(completed, 4);
        assert!(s.movements().is_empty());
    }

    #[test]
    fn conflict_pause_lasts_one_tick() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 1), (2, 1)]));
        s.order(B, route(&[(1, 0), (1, 2)]));

        // Both want (1, 1); the lowest id wins.
        let t1 = s.run_tick();
        assert_eq!(t1.advanced, vec![(A, Cell::new(1, 1))]);
        assert_eq!(t1.yielded, vec![(B, PauseReason::Conflict)]);
        assert_eq!(s.movement(B).unwrap().state, MovementState::Paused(PauseReason::Conflict));

        // The conflict is over, but A still stands on (1, 1).
        let t2 = s.run_tick();
        assert_eq!(t2.yielded, vec![(B, PauseReason::Blocked)]);
        assert_eq!(t2.completed, vec![A]);

        let t3 = s.run_tick();
        assert_eq!(t3.advanced, vec![(B, Cell::new(1, 1))]);
        assert!(t3.yielded.is_empty());
    }

    #[test]
    fn converging_agents_both_arrive() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (1, 0)]));
        s.order(B, route(&[(2, 0), (1, 0)]));

        let t1 = s.run_tick();
        assert_eq!(t1.advanced, vec![(A, Cell::new(1, 0))]);
        assert_eq!(t1.completed, vec![A]);
        assert_eq!(t1.yielded, vec![(B, PauseReason::Conflict)]);

        let t2 = s.run_tick();
        assert_eq!(t2.advanced, vec![(B, Cell::new(1, 0))]);
        assert_eq!(t2.completed, vec![B]);
        assert!(!s.has_moving());
    }

    #[test]
    fn converging_agents_arrive_for_any_coin_flip() {
        for seed in 0..32 {
            let mut s = Scheduler::new(&config(), Box::new(RandomTieBreak::new(EngineRng::new(seed))));
            s.order(A, route(&[(0, 0), (1, 0)]));
            s.order(B, route(&[(2, 0), (1, 0)]));
            let reports = run_until_idle(&mut s, 10);
            assert!(reports.len() <= 3, "seed {seed} took {} ticks", reports.len());
            let done: HashSet<AgentId> = reports.iter().flat_map(|r| r.completed.clone()).collect();
            assert_eq!(done, HashSet::from([A, B]));
        }
    }

    #[test]
    fn reservations_released_on_completion() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (3, 0)]));
        s.run_tick();
        assert_eq!(s.reservations().cells_held_by(A), vec![Cell::new(1, 0)]);

        run_until_idle(&mut s, 10);
        assert!(s.reservations().cells_held_by(A).is_empty());
        assert!(s.reservations().is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = Scheduler::new(&trails_config(), Box::new(LowestIdTieBreak));
        s.order(A, route(&[(0, 0), (4, 0)]));
        s.run_tick();
        s.take_effects();

        let cancelled = s.cancel(A).unwrap();
        assert_eq!(cancelled.state, MovementState::Cancelled);
        assert_eq!(cancelled.current_cell(), Cell::new(1, 0));
        assert_eq!(s.take_effects(), vec![EffectRequest::ClearAgent { agent: A }]);

        assert!(s.cancel(A).is_none());
        assert!(s.take_effects().is_empty());
        assert!(s.cancel(B).is_none());
        assert!(!s.is_moving(A));
        assert!(s.reservations().is_empty());
    }

    #[test]
    fn second_order_replaces_first() {
        let mut s = Scheduler::new(&trails_config(), Box::new(LowestIdTieBreak));
        let first = s.order(A, route(&[(0, 0), (5, 0)]));
        assert!(matches!(first, OrderOutcome::Started(_)));
        assert_eq!(s.take_effects().len(), 2);
        s.run_tick();
        s.take_effects();

        let r2 = route(&[(1, 0), (1, 3)]);
        let second = s.order(A, r2.clone());
        assert!(matches!(second, OrderOutcome::Redirected(_)));
        assert_ne!(first.order(), second.order());

        let m = s.movement(A).unwrap();
        assert_eq!((m.cursor, &m.route), (0, &r2));
        assert_eq!(s.movements().len(), 1);
        assert_eq!(s.reservations().cells_held_by(A), vec![Cell::new(1, 0)]);

        let effects = s.take_effects();
        assert_eq!(effects[0], EffectRequest::delete(A, EffectKind::Trail));
        assert_eq!(effects[1], EffectRequest::delete(A, EffectKind::Marker));
        assert!(matches!(
            &effects[2],
            EffectRequest::Create { key, .. } if *key == EffectKey::trail(A)
        ));
        assert!(matches!(
            &effects[3],
            EffectRequest::Create { key, payload: rc_effects::EffectPayload::Marker { at, .. } }
                if *key == EffectKey::marker(A) && *at == Cell::new(1, 3)
        ));

        let reports = run_until_idle(&mut s, 10);
        assert_eq!(reports.last().unwrap().advanced, vec![(A, Cell::new(1, 3))]);
        assert!(s.reservations().is_empty());
    }

    #[test]
    fn head_on_swap_makes_progress() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (1, 0)]));
        s.order(B, route(&[(1, 0), (0, 0)]));

        let reports = run_until_idle(&mut s, 20);
        assert_eq!(reports.len(), 5);
        for r in &reports[..4] {
            assert_eq!(r.yielded, vec![(A, PauseReason::Blocked), (B, PauseReason::Blocked)]);
        }
        assert_eq!(reports[4].advanced, vec![(A, Cell::new(1, 0)), (B, Cell::new(0, 0))]);
        assert_eq!(reports[4].completed, vec![A, B]);
    }

    #[test]
    fn blocked_agent_never_enters_a_stationary_occupant() {
        let mut s = scheduler();
        s.order(A, route(&[(1, 0), (2, 0)]));
        s.order(B, route(&[(0, 0), (1, 0)]));

        // A never gets its position update through, so it keeps standing on
        // (1, 0) in front of B, well past the blocked limit.
        for _ in 0..10 {
            let plan = s.detect();
            assert_eq!(plan.yielded, vec![(B, PauseReason::Blocked)]);
            assert!(plan.steps.iter().all(|step| step.agent != B));
            let report = s.commit(plan, &[A]);
            assert_eq!(report.failed, vec![(A, Cell::new(2, 0))]);
            assert_eq!(s.movement(B).unwrap().current_cell(), Cell::new(0, 0));
            assert_eq!(s.movement(A).unwrap().current_cell(), Cell::new(1, 0));
        }

        // Once A gets away, B follows into the vacated cell.
        let plan = s.detect();
        let report = s.commit(plan, &[]);
        assert_eq!(report.advanced, vec![(A, Cell::new(2, 0))]);
        assert_eq!(s.run_tick().advanced, vec![(B, Cell::new(1, 0))]);
    }

    #[test]
    fn three_way_cycle_steps_together() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (1, 0)]));
        s.order(B, route(&[(1, 0), (1, 1)]));
        s.order(C, route(&[(1, 1), (0, 0)]));

        let reports = run_until_idle(&mut s, 20);
        assert_eq!(reports.len(), 5);
        for r in &reports[..4] {
            assert_eq!(r.yielded.len(), 3);
            assert!(r.advanced.is_empty());
        }
        assert_eq!(
            reports[4].advanced,
            vec![(A, Cell::new(1, 0)), (B, Cell::new(1, 1)), (C, Cell::new(0, 0))]
        );
    }

    #[test]
    fn stale_step_is_dropped() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (3, 0)]));
        let plan = s.detect();
        assert_eq!(plan.steps.len(), 1);

        s.order(A, route(&[(0, 0), (0, 3)]));
        let report = s.commit(plan, &[]);
        assert!(report.advanced.is_empty());
        assert_eq!(s.movement(A).unwrap().cursor, 0);

        assert_eq!(s.run_tick().advanced, vec![(A, Cell::new(0, 1))]);
    }

    #[test]
    fn failed_update_retries_same_cell() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (2, 0)]));

        let plan = s.detect();
        let report = s.commit(plan, &[A]);
        assert_eq!(report.failed, vec![(A, Cell::new(1, 0))]);
        assert!(report.advanced.is_empty());
        let m = s.movement(A).unwrap();
        assert_eq!((m.cursor, m.state), (0, MovementState::Moving));

        assert_eq!(s.run_tick().advanced, vec![(A, Cell::new(1, 0))]);
    }

    #[test]
    fn host_pause_and_resume() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (3, 0)]));
        assert_eq!(s.pause_all(), 1);
        assert!(!s.has_moving());
        assert!(s.run_tick().advanced.is_empty());

        s.order(B, route(&[(0, 5), (3, 5)]));
        assert_eq!(s.movement(B).unwrap().state, MovementState::Paused(PauseReason::Host));
        assert_eq!(s.movement(A).unwrap().cursor, 0);

        assert_eq!(s.resume_all(), 2);
        assert_eq!(s.run_tick().advanced.len(), 2);
    }

    #[test]
    fn one_cell_route_is_already_there() {
        let mut s = scheduler();
        assert_eq!(s.order(A, route(&[(2, 2)])), OrderOutcome::AlreadyThere);
        assert!(s.movements().is_empty());

        s.order(A, route(&[(0, 0), (3, 0)]));
        s.run_tick();
        assert_eq!(s.order(A, route(&[(1, 0)])), OrderOutcome::AlreadyThere);
        assert!(s.movement(A).is_none());
        assert!(s.reservations().is_empty());
    }

    #[test]
    fn trail_fades_with_progress() {
        let mut s = Scheduler::new(&trails_config(), Box::new(LowestIdTieBreak));
        s.order(A, route(&[(0, 0), (4, 0)]));
        s.take_effects();

        s.run_tick();
        assert_eq!(s.take_effects(), vec![EffectRequest::fade_trail(A, 0.75)]);
        s.run_tick();
        assert_eq!(s.take_effects(), vec![EffectRequest::fade_trail(A, 0.5)]);
        run_until_idle(&mut s, 10);
        assert_eq!(s.take_effects().last(), Some(&EffectRequest::ClearAgent { agent: A }));
    }

    #[test]
    fn no_effects_without_trails() {
        let mut s = scheduler();
        s.order(A, route(&[(0, 0), (2, 0)]));
        run_until_idle(&mut s, 10);
        s.cancel(A);
        assert!(s.take_effects().is_empty());
    }

    #[test]
    fn closure_tie_break() {
        let highest = |contenders: &[AgentId]| contenders.len() - 1;
        let mut s = Scheduler::new(&config(), Box::new(highest));
        s.order(A, route(&[(0, 0), (1, 0)]));
        s.order(B, route(&[(2, 0), (1, 0)]));
        assert_eq!(s.run_tick().completed, vec![B]);
    }

    #[test]
    fn seeded_runs_replay_identically() {
        let run = || {
            let mut s = Scheduler::new(&config(), Box::new(RandomTieBreak::new(EngineRng::new(99))));
            for x in 0..6 {
                s.order(AgentId(x as u32), route(&[(x, 0), (3, 3), (3, 6)]));
            }
            run_until_idle(&mut s, 200)
        };
        assert_eq!(run(), run());
    }
}

// ── Engine actor ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use std::sync::Arc;
    use std::time::Duration;

    use rc_core::{Cell, SceneGeometry};
    use rc_effects::EffectKey;
    use rc_movement::{MovementState, PauseReason};
    use tokio::time::sleep;

    use super::helpers::{
        config, route, trails_config, Event, RecordingEffects, RecordingObserver, RecordingPositions, A, B,
    };
    use crate::{EngineBuilder, EngineError, LowestIdTieBreak, OrderOutcome};

    const GRID: SceneGeometry = SceneGeometry::Gridded { cell_size: 100.0 };

    #[tokio::test(start_paused = true)]
    async fn ticks_at_period_until_complete() {
        let positions = RecordingPositions::new();
        let (engine, _task) = EngineBuilder::new(config(), GRID, positions.clone()).build().unwrap().spawn();

        let outcome = engine.order(A, route(&[(0, 0), (2, 0)])).await.unwrap();
        assert!(matches!(outcome, OrderOutcome::Started(_)));
        assert!(engine.snapshot().is_moving(A));

        sleep(Duration::from_millis(399)).await;
        assert!(engine.is_moving(A).await.unwrap());
        assert!(positions.updates().is_empty());

        sleep(Duration::from_millis(402)).await;
        assert_eq!(positions.updates(), vec![(A, Cell::new(1, 0)), (A, Cell::new(2, 0))]);
        assert!(!engine.is_moving(A).await.unwrap());
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_suspends_when_idle() {
        let observer = RecordingObserver::default();
        let (engine, _task) = EngineBuilder::new(config(), GRID, RecordingPositions::new())
            .observer(observer.clone())
            .build()
            .unwrap()
            .spawn();

        engine.order(A, route(&[(0, 0), (2, 0)])).await.unwrap();
        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(observer.tick_count(), 2);

        // A new order restarts the timer one full period out.
        engine.order(A, route(&[(2, 0), (3, 0)])).await.unwrap();
        sleep(Duration::from_millis(399)).await;
        assert_eq!(engine.snapshot().len(), 1);
        sleep(Duration::from_millis(2)).await;
        engine.is_moving(A).await.unwrap();
        assert_eq!(observer.tick_count(), 3);
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_halts_ticks_and_resume_restarts() {
        let positions = RecordingPositions::new();
        let (engine, _task) = EngineBuilder::new(config(), GRID, positions.clone()).build().unwrap().spawn();

        engine.order(A, route(&[(0, 0), (5, 0)])).await.unwrap();
        sleep(Duration::from_millis(401)).await;
        assert_eq!(engine.pause_all().await.unwrap(), 1);
        sleep(Duration::from_millis(2_000)).await;
        assert_eq!(positions.updates().len(), 1);
        assert_eq!(engine.snapshot().get(A).unwrap().state, MovementState::Paused(PauseReason::Host));

        assert_eq!(engine.resume_all().await.unwrap(), 1);
        sleep(Duration::from_millis(401)).await;
        assert_eq!(positions.updates().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_position_update_retries_next_tick() {
        let positions = RecordingPositions::new();
        positions.fail.lock().unwrap().insert(A);
        let observer = RecordingObserver::default();
        let (engine, _task) = EngineBuilder::new(config(), GRID, positions.clone())
            .observer(observer.clone())
            .build()
            .unwrap()
            .spawn();

        engine.order(A, route(&[(0, 0), (3, 0)])).await.unwrap();
        sleep(Duration::from_millis(401)).await;
        assert!(observer.events().contains(&Event::Failed(A, Cell::new(1, 0))));
        assert_eq!(engine.snapshot().get(A).unwrap().cursor, 0);

        positions.fail.lock().unwrap().clear();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(positions.updates(), vec![(A, Cell::new(1, 0))]);
        assert_eq!(engine.snapshot().get(A).unwrap().cursor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_leaves_no_residual_visuals() {
        let effects = RecordingEffects::new();
        let (engine, _task) = EngineBuilder::new(trails_config(), GRID, RecordingPositions::new())
            .effects(effects.clone())
            .build()
            .unwrap()
            .spawn();

        engine.order(A, route(&[(0, 0), (6, 0)])).await.unwrap();
        sleep(Duration::from_millis(401)).await;
        let outcome = engine.order(A, route(&[(1, 0), (1, 2)])).await.unwrap();
        assert!(matches!(outcome, OrderOutcome::Redirected(_)));
        sleep(Duration::from_millis(2_000)).await;
        engine.effects().unwrap().flush().await.unwrap();

        let ops = effects.ops();
        let creates: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == ("create", EffectKey::trail(A)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(creates.len(), 2);
        let deleted_between = ops[creates[0]..creates[1]].contains(&("delete", EffectKey::trail(A)));
        assert!(deleted_between);
        assert!(effects.live().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_and_clears_visuals() {
        let effects = RecordingEffects::new();
        let observer = RecordingObserver::default();
        let (engine, task) = EngineBuilder::new(trails_config(), GRID, RecordingPositions::new())
            .effects(effects.clone())
            .observer(observer.clone())
            .tie_break(LowestIdTieBreak)
            .build()
            .unwrap()
            .spawn();

        engine.order(A, route(&[(0, 0), (8, 0)])).await.unwrap();
        engine.order(B, route(&[(0, 3), (8, 3)])).await.unwrap();
        sleep(Duration::from_millis(401)).await;

        engine.shutdown();
        task.await.unwrap();
        assert!(effects.live().is_empty());
        let events = observer.events();
        assert!(events.contains(&Event::Cancel(A, Cell::new(1, 0))));
        assert!(events.contains(&Event::Cancel(B, Cell::new(1, 3))));
        assert!(matches!(engine.order(A, route(&[(0, 0), (1, 0)])).await, Err(EngineError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_stops_engine() {
        let (engine, task) = EngineBuilder::new(config(), GRID, RecordingPositions::new()).build().unwrap().spawn();
        engine.order(A, route(&[(0, 0), (9, 0)])).await.unwrap();
        let rx = engine.subscribe();
        drop(engine);
        task.await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_whether_anything_stopped() {
        let (engine, _task) = EngineBuilder::new(config(), GRID, RecordingPositions::new()).build().unwrap().spawn();
        engine.order(A, route(&[(0, 0), (9, 0)])).await.unwrap();
        assert!(engine.cancel(A).await.unwrap());
        assert!(!engine.cancel(A).await.unwrap());
        assert_eq!(engine.cancel_all().await.unwrap(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = rc_core::EngineConfig { max_blocked_ticks: 0, ..config() };
        let err = EngineBuilder::new(bad, GRID, Arc::new(crate::NoopPositionSink)).build().err().unwrap();
        assert!(matches!(err, EngineError::Core(_)));

        let err = EngineBuilder::new(config(), SceneGeometry::Gridded { cell_size: 0.0 }, Arc::new(crate::NoopPositionSink))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Core(_)));
    }
}

// ── Commander ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod commander {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use rc_core::{AgentId, Cell, EngineConfig, Footprint, GridBounds, Point, SceneGeometry};
    use rc_movement::{MovementState, PauseReason};
    use rc_spatial::{GridMapBuilder, GridOracle, OracleError};
    use tokio::time::sleep;

    use super::helpers::{config, trails_config, RecordingEffects, RecordingPositions, RecordingViewport, A, B, C};
    use crate::{
        AgentOrderResult, AgentRef, Commander, EngineBuilder, OrderContext, OrderError, OrderTarget, Signal,
    };

    const GRID: SceneGeometry = SceneGeometry::Gridded { cell_size: 100.0 };
    const BOUNDS: GridBounds = GridBounds::new(20, 20);
    const BODY: Footprint = Footprint::new(100.0, 100.0);

    fn agent(id: AgentId, x: i32, y: i32) -> AgentRef {
        AgentRef::new(id, Point::new(x as f32 * 100.0, y as f32 * 100.0), BODY)
    }

    fn open_oracle() -> Arc<GridOracle> {
        Arc::new(GridOracle::new(GridMapBuilder::new(BOUNDS).build()))
    }

    fn commander(config: EngineConfig) -> Commander {
        let (engine, _task) = EngineBuilder::new(config.clone(), GRID, RecordingPositions::new())
            .build()
            .unwrap()
            .spawn();
        Commander::new(config, BOUNDS, open_oracle(), engine)
    }

    fn to_cell(x: i32, y: i32) -> OrderTarget {
        OrderTarget::Cell(Cell::new(x, y))
    }

    #[tokio::test(start_paused = true)]
    async fn orders_are_gated() {
        let now = OrderContext::default();
        let combat = OrderContext { in_combat: true };

        let off = commander(EngineConfig { enabled: false, ..config() });
        assert!(matches!(off.order(&[agent(A, 0, 0)], to_cell(3, 3), now).await, Err(OrderError::Disabled)));

        let c = commander(config());
        assert!(matches!(c.order(&[agent(A, 0, 0)], to_cell(3, 3), combat).await, Err(OrderError::CombatLocked)));
        assert!(matches!(c.order(&[], to_cell(3, 3), now).await, Err(OrderError::NoAgents)));
        let pair = [agent(A, 0, 0), agent(B, 1, 0)];
        let explicit = OrderTarget::Route(vec![Cell::new(0, 0), Cell::new(1, 1)]);
        assert!(matches!(c.order(&pair, explicit, now).await, Err(OrderError::InvalidRoute(_))));

        let allowed = commander(EngineConfig { allow_orders_in_combat: true, ..config() });
        let results = allowed.order(&[agent(A, 0, 0)], to_cell(3, 3), combat).await.unwrap();
        assert!(results[0].is_moving());
    }

    #[tokio::test(start_paused = true)]
    async fn group_order_fans_out_to_distinct_cells() {
        let c = commander(config());
        let group = [agent(A, 0, 0), agent(B, 1, 0), agent(C, 2, 0)];
        let results = c.order(&group, to_cell(10, 10), OrderContext::default()).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(AgentOrderResult::is_moving));
        assert_eq!(results[0].destination(), Cell::new(10, 10));
        let cells: HashSet<Cell> = results.iter().map(AgentOrderResult::destination).collect();
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.chebyshev(Cell::new(10, 10)) <= 1));

        let snapshot = c.engine().snapshot();
        for r in &results {
            assert_eq!(snapshot.get(r.agent()).unwrap().route.destination(), r.destination());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_agent_does_not_block_the_group() {
        let grid = GridMapBuilder::new(BOUNDS)
            .wall(Cell::new(1, 19))
            .wall(Cell::new(0, 18))
            .wall(Cell::new(1, 18))
            .build();
        let cfg = config();
        let (engine, _task) = EngineBuilder::new(cfg.clone(), GRID, RecordingPositions::new())
            .build()
            .unwrap()
            .spawn();
        let c = Commander::new(cfg, BOUNDS, Arc::new(GridOracle::new(grid)), engine);

        let group = [agent(A, 5, 5), agent(B, 0, 19)];
        let results = c.order(&group, to_cell(8, 8), OrderContext::default()).await.unwrap();
        assert!(results[0].is_moving());
        assert!(matches!(results[1], AgentOrderResult::NoRoute { error: OracleError::NoRoute { .. }, .. }));
        assert_eq!(c.engine().snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn routes_respect_max_path_distance() {
        let c = commander(EngineConfig { max_path_distance: Some(3), ..config() });
        let results = c.order(&[agent(A, 0, 0)], to_cell(10, 0), OrderContext::default()).await.unwrap();
        assert!(matches!(
            results[0],
            AgentOrderResult::NoRoute { error: OracleError::ExceedsMaxDistance { cost: 10, max: 3 }, .. }
        ));
        assert!(c.engine().snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_route_skips_planning() {
        let c = commander(config());
        let target = OrderTarget::Route(vec![Cell::new(4, 4), Cell::new(4, 5), Cell::new(5, 6)]);
        let results = c.order(&[agent(A, 4, 4)], target, OrderContext::default()).await.unwrap();
        assert_eq!(results[0].destination(), Cell::new(5, 6));
        assert_eq!(c.engine().snapshot().get(A).unwrap().route.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gridless_routes_step_one_virtual_cell_at_a_time() {
        let cfg = config();
        let geometry = cfg.gridless_geometry();
        let (engine, _task) = EngineBuilder::new(cfg.clone(), geometry, RecordingPositions::new())
            .build()
            .unwrap()
            .spawn();
        let c = Commander::new(cfg, BOUNDS, open_oracle(), engine);

        let me = AgentRef::new(A, Point::new(0.0, 0.0), Footprint::new(50.0, 50.0));
        let results = c.order(&[me], OrderTarget::Point(Point::new(525.0, 25.0)), OrderContext::default()).await.unwrap();
        assert_eq!(results[0].destination(), Cell::new(10, 0));

        let view = c.engine().snapshot().get(A).cloned().unwrap();
        assert_eq!(view.route.len(), 11);
        assert!(view.route.is_contiguous());
    }

    #[tokio::test(start_paused = true)]
    async fn global_pause_pauses_or_cancels() {
        let c = commander(config());
        c.order(&[agent(A, 0, 0)], to_cell(9, 0), OrderContext::default()).await.unwrap();
        c.signal(Signal::GlobalPause).await.unwrap();
        assert_eq!(c.engine().snapshot().get(A).unwrap().state, MovementState::Paused(PauseReason::Host));
        c.signal(Signal::GlobalResume).await.unwrap();
        assert_eq!(c.engine().snapshot().get(A).unwrap().state, MovementState::Moving);

        let c = commander(EngineConfig { cancel_on_pause: true, ..config() });
        c.order(&[agent(A, 0, 0)], to_cell(9, 0), OrderContext::default()).await.unwrap();
        c.signal(Signal::GlobalPause).await.unwrap();
        assert!(c.engine().snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_gesture_stops_everything() {
        let cfg = trails_config();
        let effects = RecordingEffects::new();
        let (engine, _task) = EngineBuilder::new(cfg.clone(), GRID, RecordingPositions::new())
            .effects(effects.clone())
            .build()
            .unwrap()
            .spawn();
        let c = Commander::new(cfg, BOUNDS, open_oracle(), engine);

        let group = [agent(A, 0, 0), agent(B, 1, 0)];
        c.order(&group, to_cell(12, 12), OrderContext::default()).await.unwrap();
        sleep(Duration::from_millis(401)).await;
        c.engine().effects().unwrap().flush().await.unwrap();
        assert_eq!(effects.live().len(), 4);

        c.signal(Signal::CancelGesture).await.unwrap();
        c.engine().effects().unwrap().flush().await.unwrap();
        assert!(effects.live().is_empty());
        assert!(c.engine().snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn camera_follows_primary_until_it_arrives() {
        let cfg = config();
        let (engine, _task) = EngineBuilder::new(cfg.clone(), GRID, RecordingPositions::new())
            .viewport(Arc::new(RecordingViewport::default()))
            .build()
            .unwrap()
            .spawn();
        let c = Commander::new(cfg, BOUNDS, open_oracle(), engine);

        c.order(&[agent(A, 0, 0)], to_cell(2, 0), OrderContext::default()).await.unwrap();
        let camera = c.engine().camera().unwrap();
        assert_eq!(camera.current().await.unwrap(), Some(A));

        sleep(Duration::from_millis(801)).await;
        assert!(c.engine().snapshot().is_empty());
        assert_eq!(camera.current().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn no_follow_when_panning_disabled() {
        let cfg = EngineConfig { camera_panning: false, ..config() };
        let (engine, _task) = EngineBuilder::new(cfg.clone(), GRID, RecordingPositions::new())
            .viewport(Arc::new(RecordingViewport::default()))
            .build()
            .unwrap()
            .spawn();
        let c = Commander::new(cfg, BOUNDS, open_oracle(), engine);

        c.order(&[agent(A, 0, 0)], to_cell(5, 0), OrderContext::default()).await.unwrap();
        assert_eq!(c.engine().camera().unwrap().current().await.unwrap(), None);
    }
}
