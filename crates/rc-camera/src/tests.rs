//! Unit tests for rc-camera.

#[cfg(test)]
mod helpers {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rc_core::{AgentId, Cell, OrderId, Tick};
    use rc_movement::{MovementSnapshot, MovementState, MovementView};
    use rc_spatial::{densify, Route};

    use crate::{CameraResult, PanRequest, ViewportSink};

    pub fn view(len: i32, cursor: usize, state: MovementState) -> MovementView {
        let route = Route::new(densify(&[Cell::new(0, 0), Cell::new(len - 1, 0)])).unwrap();
        MovementView { order: OrderId(0), route, cursor, state }
    }

    pub fn snapshot(entries: &[(u32, MovementView)]) -> Arc<MovementSnapshot> {
        Arc::new(MovementSnapshot {
            tick:    Tick::ZERO,
            entries: entries.iter().map(|(id, v)| (AgentId(*id), v.clone())).collect(),
        })
    }

    #[derive(Default)]
    pub struct RecordingViewport {
        pub pans: Mutex<Vec<PanRequest>>,
    }

    impl RecordingViewport {
        pub fn targets(&self) -> Vec<(f32, f32)> {
            self.pans.lock().unwrap().iter().map(|p| (p.target.x, p.target.y)).collect()
        }
    }

    #[async_trait]
    impl ViewportSink for RecordingViewport {
        async fn pan_to(&self, request: PanRequest) -> CameraResult<()> {
            self.pans.lock().unwrap().push(request);
            Ok(())
        }
    }
}

#[cfg(test)]
mod follow {
    use std::time::Duration;

    use rc_core::Cell;
    use rc_movement::{MovementState, PauseReason};
    use tokio::time::Instant;

    use super::helpers::view;
    use crate::{CameraFollow, FollowDecision};

    fn gridded() -> CameraFollow {
        CameraFollow::new(6, Duration::from_millis(500))
    }

    #[test]
    fn pans_ahead_with_clamp() {
        let now = Instant::now();
        let f = gridded();
        assert_eq!(f.sample(Some(&view(20, 2, MovementState::Moving)), now), FollowDecision::Pan(Cell::new(8, 0)));
        assert_eq!(f.sample(Some(&view(10, 7, MovementState::Moving)), now), FollowDecision::Pan(Cell::new(9, 0)));
    }

    #[test]
    fn transient_pause_still_followed() {
        let f = gridded();
        let v = view(10, 1, MovementState::Paused(PauseReason::Conflict));
        assert_eq!(f.sample(Some(&v), Instant::now()), FollowDecision::Pan(Cell::new(7, 0)));
    }

    #[test]
    fn stops_when_absent_finished_or_not_moving() {
        let now = Instant::now();
        let f = gridded();
        assert_eq!(f.sample(None, now), FollowDecision::Stop);
        assert_eq!(f.sample(Some(&view(5, 4, MovementState::Moving)), now), FollowDecision::Stop);
        assert_eq!(f.sample(Some(&view(5, 1, MovementState::Cancelled)), now), FollowDecision::Stop);
        assert_eq!(
            f.sample(Some(&view(5, 1, MovementState::Paused(PauseReason::Host))), now),
            FollowDecision::Stop
        );
    }

    #[test]
    fn suppression_window_expires() {
        let now = Instant::now();
        let mut f = gridded();
        f.suppress(now);
        let v = view(10, 0, MovementState::Moving);
        assert_eq!(f.sample(Some(&v), now + Duration::from_millis(499)), FollowDecision::Skip);
        assert_eq!(f.sample(Some(&v), now + Duration::from_millis(500)), FollowDecision::Pan(Cell::new(6, 0)));
    }
}

#[cfg(test)]
mod controller {
    use std::sync::Arc;
    use std::time::Duration;

    use rc_core::{AgentId, CameraConfig, SceneGeometry};
    use rc_movement::MovementState;
    use tokio::sync::watch;

    use super::helpers::{snapshot, view, RecordingViewport};
    use crate::{CameraController, CameraError};

    const GRID: SceneGeometry = SceneGeometry::Gridded { cell_size: 100.0 };

    #[tokio::test(start_paused = true)]
    async fn samples_on_interval_with_lookahead() {
        let (tx, rx) = watch::channel(snapshot(&[(1, view(20, 0, MovementState::Moving))]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, _task) = CameraController::new(CameraConfig::default(), GRID, rx, viewport.clone()).spawn();

        camera.follow(AgentId(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(1_999)).await;
        camera.current().await.unwrap();
        assert!(viewport.targets().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        camera.current().await.unwrap();
        // Cell (6, 0) centre.
        assert_eq!(viewport.targets(), vec![(650.0, 50.0)]);
        assert_eq!(viewport.pans.lock().unwrap()[0].duration, Duration::from_millis(1_000));

        tx.send(snapshot(&[(1, view(20, 10, MovementState::Moving))])).unwrap();
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        camera.current().await.unwrap();
        assert_eq!(viewport.targets().last(), Some(&(1_650.0, 50.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn gridless_samples_faster_and_closer() {
        let geometry = SceneGeometry::Gridless { step: 50.0 };
        let (_tx, rx) = watch::channel(snapshot(&[(1, view(20, 3, MovementState::Moving))]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, _task) = CameraController::new(CameraConfig::default(), geometry, rx, viewport.clone()).spawn();

        camera.follow(AgentId(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(1_001)).await;
        camera.current().await.unwrap();
        // Two samples at 500 ms and 1000 ms, one cell ahead: (4, 0).
        assert_eq!(viewport.targets(), vec![(225.0, 25.0), (225.0, 25.0)]);
        assert_eq!(viewport.pans.lock().unwrap()[0].duration, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_movement_disappears() {
        let (tx, rx) = watch::channel(snapshot(&[(1, view(20, 0, MovementState::Moving))]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, _task) = CameraController::new(CameraConfig::default(), GRID, rx, viewport.clone()).spawn();

        camera.follow(AgentId(1)).unwrap();
        tx.send(snapshot(&[])).unwrap();
        tokio::time::sleep(Duration::from_millis(2_001)).await;
        assert_eq!(camera.current().await.unwrap(), None);
        assert!(viewport.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_pan_suppresses_one_sample() {
        let (_tx, rx) = watch::channel(snapshot(&[(1, view(30, 0, MovementState::Moving))]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, _task) = CameraController::new(CameraConfig::default(), GRID, rx, viewport.clone()).spawn();

        camera.follow(AgentId(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(1_800)).await;
        camera.manual_pan().unwrap();
        tokio::time::sleep(Duration::from_millis(201)).await;
        camera.current().await.unwrap();
        // Sample at 2000 ms fell inside the 500 ms window.
        assert!(viewport.targets().is_empty());
        assert_eq!(camera.current().await.unwrap(), Some(AgentId(1)));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        camera.current().await.unwrap();
        assert_eq!(viewport.targets().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_follow_supersedes_and_unfollow_is_targeted() {
        let (_tx, rx) = watch::channel(snapshot(&[
            (1, view(20, 0, MovementState::Moving)),
            (2, view(20, 0, MovementState::Moving)),
        ]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, _task) = CameraController::new(CameraConfig::default(), GRID, rx, viewport).spawn();

        camera.follow(AgentId(1)).unwrap();
        camera.follow(AgentId(2)).unwrap();
        assert_eq!(camera.current().await.unwrap(), Some(AgentId(2)));
        camera.unfollow(AgentId(1)).unwrap();
        assert_eq!(camera.current().await.unwrap(), Some(AgentId(2)));
        camera.unfollow(AgentId(2)).unwrap();
        assert_eq!(camera.current().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_handle() {
        let (_tx, rx) = watch::channel(snapshot(&[]));
        let viewport = Arc::new(RecordingViewport::default());
        let (camera, task) = CameraController::new(CameraConfig::default(), GRID, rx, viewport).spawn();
        camera.shutdown();
        task.await.unwrap();
        assert_eq!(camera.follow(AgentId(1)), Err(CameraError::Closed));
    }
}
