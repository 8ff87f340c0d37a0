//! Simulation aggregate
//!
//! Bundles everything the rules need to touch in one place. The behaviour
//! is split by concern across `spawn`, `merge`, `game_over` and `tick`, each
//! adding methods to [`Sim`].

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::physics::PhysicsWorld;
use super::schedule::Scheduler;
use super::state::GameState;
use super::tier::{TierId, TierTable};
use crate::settings::Tuning;

pub struct Sim {
    pub state: GameState,
    pub physics: PhysicsWorld,
    pub scheduler: Scheduler,
    pub tiers: TierTable,
    pub tuning: Tuning,
    pub seed: u64,
    rng: Pcg32,
}

impl Sim {
    /// Build a ready-to-play simulation with walls and a queued first tier
    pub fn new(tuning: Tuning, tiers: TierTable, seed: u64, high_score: u64) -> Self {
        let mut physics = PhysicsWorld::new();
        physics.init(&tuning);
        let mut rng = Pcg32::seed_from_u64(seed);
        let next = tiers.draw_spawn_tier(tuning.spawn_pool_size, &mut rng);
        let state = GameState::new(tiers.first(), next, high_score);
        Self {
            state,
            physics,
            scheduler: Scheduler::new(),
            tiers,
            tuning,
            seed,
            rng,
        }
    }

    /// Draw the tier for a future drop
    pub fn draw_next_tier(&mut self) -> TierId {
        self.tiers
            .draw_spawn_tier(self.tuning.spawn_pool_size, &mut self.rng)
    }

    /// Smallest radius on the ladder, the density reference
    pub fn smallest_radius(&self) -> f32 {
        self.tiers.radius(self.tiers.first())
    }

    /// Stop everything the old session could still do: pending timers and
    /// deferred work go first, then every body, then cross-references.
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.physics.teardown();
        self.state.active = None;
        self.state.last_dropped = None;
        self.state.game_over_pending = None;
        self.state.pieces.clear();
    }

    /// Tear down and start over with a new seed. The high score carries over.
    pub fn reset(&mut self, seed: u64) {
        self.teardown();
        let high_score = self.state.high_score;
        self.physics.init(&self.tuning);
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        let next = self.draw_next_tier();
        self.state = GameState::new(self.tiers.first(), next, high_score);
        log::info!("Simulation reset with seed {}", seed);
    }
}
