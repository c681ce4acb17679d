//! Follow decisions, free of timers and I/O.

use std::time::Duration;

use rc_core::Cell;
use rc_movement::MovementView;
use tokio::time::Instant;

/// What one camera sample should do.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FollowDecision {
    /// Pan towards this cell.
    Pan(Cell),
    /// Do nothing this sample; keep following.
    Skip,
    /// The followed movement is gone or finished; stop following.
    Stop,
}

/// Lookahead and manual-pan suppression for one scene.
#[derive(Clone, Debug)]
pub struct CameraFollow {
    lookahead:        usize,
    cooldown:         Duration,
    suppressed_until: Option<Instant>,
}

impl CameraFollow {
    pub fn new(lookahead: usize, cooldown: Duration) -> Self {
        Self { lookahead, cooldown, suppressed_until: None }
    }

    /// A user pan was detected at `now`.
    pub fn suppress(&mut self, now: Instant) {
        self.suppressed_until = Some(now + self.cooldown);
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppressed_until.is_some_and(|until| now < until)
    }

    /// Decide what to do with the followed movement's latest view.
    pub fn sample(&self, view: Option<&MovementView>, now: Instant) -> FollowDecision {
        let Some(view) = view else {
            return FollowDecision::Stop;
        };
        if !view.state.is_moving() || view.at_end() {
            return FollowDecision::Stop;
        }
        if self.is_suppressed(now) {
            return FollowDecision::Skip;
        }
        FollowDecision::Pan(view.lookahead(self.lookahead))
    }
}
