//! Fixed timestep simulation tick
//!
//! Frames arrive at whatever rate the host manages; physics always advances
//! in fixed quanta. [`FrameClock`] turns frame timestamps into a whole
//! number of steps plus an interpolation factor, and the [`Sim`] methods
//! here are the fixed points of a frame, called in this order:
//! deferred tasks, due timers, then one `physics_tick` per step.

use super::schedule::{Task, TimerKind};
use super::world::Sim;
use crate::error::Result;
use crate::settings::Tuning;

/// Time accumulator for the fixed-step loop
#[derive(Debug, Clone)]
pub struct FrameClock {
    step_ms: f64,
    max_frame_ms: f64,
    accumulator: f64,
    last_time: Option<f64>,
}

impl FrameClock {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            step_ms: tuning.step_ms(),
            max_frame_ms: tuning.max_frame_ms,
            accumulator: 0.0,
            last_time: None,
        }
    }

    /// Feed a frame timestamp (ms) and get the number of steps to run
    ///
    /// The first frame only starts the clock. Elapsed time is clamped so a
    /// stalled tab doesn't come back to a burst of catch-up steps.
    pub fn advance(&mut self, now: f64) -> u32 {
        let Some(last) = self.last_time.replace(now) else {
            return 0;
        };
        let elapsed = (now - last).clamp(0.0, self.max_frame_ms);
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= self.step_ms {
            self.accumulator -= self.step_ms;
            steps += 1;
        }
        steps
    }

    /// Fraction of a step left over, for blending the last two states
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step_ms) as f32
    }

    /// Leftover time in ms
    pub fn leftover_ms(&self) -> f64 {
        self.accumulator
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    /// Forget the previous frame; the next `advance` restarts the clock
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time = None;
    }
}

impl Sim {
    /// Run everything deferred during the previous frame
    pub fn run_deferred(&mut self, now: f64) -> Result<()> {
        for task in self.scheduler.take_deferred() {
            if self.state.game_over {
                break;
            }
            match task {
                Task::Merge { a, b, retry } => {
                    self.resolve_merge(a, b, retry, now);
                }
                Task::Release(id) => self.release_piece(id)?,
                Task::CheckGameOver => {
                    self.check_game_over(now)?;
                }
            }
        }
        Ok(())
    }

    /// Fire every timer due at `now`
    pub fn fire_timers(&mut self, now: f64) -> Result<()> {
        for (timer, kind) in self.scheduler.take_due(now) {
            if self.state.game_over {
                break;
            }
            match kind {
                TimerKind::ConfirmGameOver(id) => {
                    self.confirm_game_over(id, timer)?;
                }
                TimerKind::SpawnRetry => {
                    self.request_spawn(now)?;
                }
            }
        }
        Ok(())
    }

    /// One fixed physics step: integrate, pull body state into the pieces,
    /// hand new contacts to the merge resolver, then look for overflow
    pub fn physics_tick(&mut self, now: f64) -> Result<()> {
        if self.state.game_over {
            return Ok(());
        }
        let pairs = self.physics.step()?;
        self.state.sync_from(&self.physics);
        for pair in pairs {
            self.on_collision_begin(pair);
        }
        self.check_game_over(now)?;
        Ok(())
    }
}
