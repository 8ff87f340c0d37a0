//! Game session
//!
//! Owns the simulation, the frame clock, pointer state and the high-score
//! store, and is the only thing a host talks to. One call to [`Game::frame`]
//! per animation frame runs, in order: deferred tasks from the previous
//! frame, due timers, fixed physics steps (with the pointer follow poll),
//! the automatic spawn check, and high-score persistence.

use glam::Vec2;

use crate::error::Result;
use crate::highscores::{MemoryStore, ScoreStore};
use crate::input::{InputPort, PointerInput};
use crate::renderer::FrameView;
use crate::settings::Tuning;
use crate::sim::{FrameClock, GameEvent, PieceId, Sim, TierId, TierTable};
use crate::ui::{EvolutionSlot, GameOverSummary, Hud, evolution_list};

impl InputPort for Sim {
    fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    fn can_spawn_next(&mut self, now: f64) -> bool {
        self.spawn_gate_open(now)
    }

    fn has_active_piece(&self) -> bool {
        self.state.active.is_some()
    }

    fn create_piece(&mut self, now: f64) -> Result<bool> {
        Ok(self.request_spawn(now)?.is_some())
    }

    fn drop_piece(&mut self, x: f32, now: f64) -> Result<bool> {
        self.drop_current_piece(x, now)
    }

    fn follow(&mut self, x: f32) -> Result<()> {
        self.follow_pointer(x)
    }
}

pub struct Game {
    pub sim: Sim,
    clock: FrameClock,
    input: PointerInput,
    running: bool,
    store: Box<dyn ScoreStore>,
    /// Last value written to the store
    saved_high_score: u64,
    /// Timestamp of the latest frame
    now: f64,
}

impl Game {
    /// Start a session, reading the high score from `store`
    pub fn new(tuning: Tuning, tiers: TierTable, seed: u64, store: Box<dyn ScoreStore>) -> Self {
        let high_score = store.load();
        let clock = FrameClock::new(&tuning);
        let input = PointerInput::new(tuning.follow_interval_ms());
        let sim = Sim::new(tuning, tiers, seed, high_score);
        log::info!("New game, seed {}, high score {}", seed, high_score);
        Self {
            sim,
            clock,
            input,
            running: true,
            store,
            saved_high_score: high_score,
            now: 0.0,
        }
    }

    /// Default tuning and ladder, nothing persisted
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            Tuning::default(),
            TierTable::default(),
            seed,
            Box::new(MemoryStore::default()),
        )
    }

    /// Advance to `now` (ms). Returns the number of physics steps run.
    pub fn frame(&mut self, now: f64) -> Result<u32> {
        self.now = now;
        if !self.running {
            return Ok(0);
        }

        self.sim.run_deferred(now)?;
        self.sim.fire_timers(now)?;

        let steps = self.clock.advance(now);
        if !self.sim.state.game_over {
            let step_ms = self.clock.step_ms();
            let leftover = self.clock.leftover_ms();
            for i in 0..steps {
                let t = now - leftover - (steps - 1 - i) as f64 * step_ms;
                self.input.poll(&mut self.sim, t)?;
                self.sim.physics_tick(t)?;
            }
        }

        if !self.sim.state.game_over
            && self.sim.state.active.is_none()
            && self.sim.spawn_gate_open(now)
        {
            self.sim.create_new_piece(now)?;
        }

        self.persist_high_score();
        Ok(steps)
    }

    fn persist_high_score(&mut self) {
        let high = self.sim.state.high_score;
        if high <= self.saved_high_score {
            return;
        }
        match self.store.save(high) {
            Ok(()) => self.saved_high_score = high,
            Err(e) => log::warn!("Could not save high score {}: {}", high, e),
        }
    }

    /// Throw the session away and start fresh. Order matters: stop the
    /// loop, cancel timers, detach every body, drop cross-references, and
    /// only then rebuild.
    pub fn restart(&mut self, seed: u64) {
        self.running = false;
        self.sim.teardown();
        self.input.reset();
        self.clock.reset();
        self.sim.reset(seed);
        self.running = true;
        log::info!("Game restarted with seed {}", seed);
    }

    pub fn pointer_down(&mut self, x: f32) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.input.pointer_down(&mut self.sim, x, self.now)
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.input.pointer_move(x);
    }

    pub fn pointer_up(&mut self, x: f32) -> Result<bool> {
        if !self.running {
            return Ok(false);
        }
        self.input.pointer_up(&mut self.sim, x, self.now)
    }

    /// Blend factor for the latest frame
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    pub fn frame_view(&self) -> Result<FrameView> {
        FrameView::capture(&self.sim, self.alpha())
    }

    pub fn score(&self) -> u64 {
        self.sim.state.score
    }

    pub fn high_score(&self) -> u64 {
        self.sim.state.high_score
    }

    pub fn is_game_over(&self) -> bool {
        self.sim.state.game_over
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    pub fn hud(&self) -> Hud {
        Hud::from_state(&self.sim.state, &self.sim.tiers)
    }

    pub fn evolution(&self) -> Vec<EvolutionSlot> {
        evolution_list(&self.sim.state, &self.sim.tiers)
    }

    pub fn game_over_summary(&self) -> Option<GameOverSummary> {
        GameOverSummary::from_state(&self.sim.state)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.sim.state.drain_events()
    }

    /// Developer tool: place a live piece anywhere
    pub fn insert_live_piece(&mut self, tier: TierId, pos: Vec2) -> Result<PieceId> {
        self.sim.insert_live_piece(tier, pos, self.now)
    }

    /// Developer tool: end the run now
    pub fn force_game_over(&mut self) -> Result<()> {
        self.sim.finalize_game_over(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    const STEP: f64 = 1000.0 / 60.0;

    /// Run frames at 60 fps starting after `t`; returns the last timestamp
    fn run_frames(game: &mut Game, mut t: f64, frames: u32) -> f64 {
        for _ in 0..frames {
            t += STEP;
            game.frame(t).unwrap();
        }
        t
    }

    fn live_count(game: &Game) -> usize {
        game.sim.state.pieces.iter().filter(|p| p.is_live()).count()
    }

    #[test]
    fn test_first_frame_stages_a_piece() {
        let mut game = Game::with_seed(1);
        assert_eq!(game.frame(0.0).unwrap(), 0);
        assert!(game.sim.state.active.is_some());
        assert_eq!(game.sim.state.pieces.len(), 1);
    }

    #[test]
    fn test_drop_scenario_tier_zero_at_100() {
        let mut game = Game::with_seed(2);
        game.sim.state.next_tier = TierId(0);
        game.frame(0.0).unwrap();
        let id = game.sim.state.active.unwrap();

        game.pointer_down(100.0).unwrap();
        assert!(game.pointer_up(100.0).unwrap());
        run_frames(&mut game, 0.0, 60);

        assert_eq!(live_count(&game), 1);
        let piece = game.sim.state.piece(id).unwrap();
        assert!(piece.is_live());
        assert_eq!(piece.tier, TierId(0));
        assert!(piece.pos.x >= 30.0 && piece.pos.x <= 363.0);
        assert!((piece.pos.x - 100.0).abs() < 1.0);
        // Cooldown passed and the drop cleared the line: next piece staged
        assert!(game.sim.state.active.is_some());
        assert_ne!(game.sim.state.active, Some(id));
    }

    #[test]
    fn test_merge_scenario_scores_once() {
        let mut game = Game::with_seed(3);
        game.frame(0.0).unwrap();
        game.insert_live_piece(TierId(2), Vec2::new(120.0, 480.0)).unwrap();
        game.insert_live_piece(TierId(2), Vec2::new(120.0, 400.0)).unwrap();

        run_frames(&mut game, 0.0, 180);

        let live: Vec<_> = game.sim.state.pieces.iter().filter(|p| p.is_live()).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].tier, TierId(3));
        assert_eq!(game.score(), 16);
        let merges = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Merged { .. }))
            .count();
        assert_eq!(merges, 1);
    }

    #[test]
    fn test_at_most_one_active_piece() {
        let mut game = Game::with_seed(4);
        let mut t = 0.0;
        game.frame(t).unwrap();
        for i in 0..8 {
            game.pointer_down(60.0 + i as f32 * 35.0).unwrap();
            game.pointer_up(60.0 + i as f32 * 35.0).unwrap();
            t = run_frames(&mut game, t, 40);
            let staged = game.sim.state.pieces.iter().filter(|p| p.is_static).count();
            assert!(staged <= 1);
            if let Some(active) = game.sim.state.active {
                assert_eq!(game.sim.state.pieces.iter().filter(|p| p.id == active).count(), 1);
            }
        }
    }

    #[test]
    fn test_high_score_persists_when_beaten() {
        let mut game = Game::new(
            Tuning::default(),
            TierTable::default(),
            5,
            Box::new(MemoryStore::new(10)),
        );
        assert_eq!(game.high_score(), 10);
        game.sim.state.update_score(8);
        game.frame(0.0).unwrap();
        assert_eq!(game.store().load(), 10);

        game.sim.state.update_score(8);
        game.frame(16.0).unwrap();
        assert_eq!(game.store().load(), 16);
    }

    /// Fails the first `failures` writes, then behaves like `MemoryStore`
    struct FlakyStore {
        failures: u32,
        saved: Option<u64>,
    }

    impl ScoreStore for FlakyStore {
        fn load(&self) -> u64 {
            self.saved.unwrap_or(0)
        }

        fn save(&mut self, high_score: u64) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(GameError::Storage("quota exceeded".to_string()));
            }
            self.saved = Some(high_score);
            Ok(())
        }
    }

    #[test]
    fn test_failed_high_score_write_is_retried() {
        let store = FlakyStore {
            failures: 1,
            saved: None,
        };
        let mut game = Game::new(Tuning::default(), TierTable::default(), 9, Box::new(store));
        game.sim.state.update_score(30);
        game.frame(0.0).unwrap();
        assert_eq!(game.store().load(), 0);

        game.frame(STEP).unwrap();
        assert_eq!(game.store().load(), 30);
    }

    #[test]
    fn test_dropped_piece_resting_over_the_line_ends_game() {
        // Field so shallow that a tier 3 piece can't sink below the line
        let tuning = Tuning {
            play_height: 60.0,
            ..Tuning::default()
        };
        let boundary = tuning.zone_boundary();
        let mut game = Game::new(tuning, TierTable::default(), 10, Box::new(MemoryStore::default()));
        game.sim.state.next_tier = TierId(3);
        game.frame(0.0).unwrap();
        let id = game.sim.state.active.unwrap();

        game.pointer_down(200.0).unwrap();
        assert!(game.pointer_up(200.0).unwrap());
        run_frames(&mut game, 0.0, 20 * 60);

        let piece = game.sim.state.piece(id).unwrap();
        assert!(piece.has_had_contact);
        assert!(piece.top() <= boundary);
        assert!(game.is_game_over());
        assert!(game.game_over_summary().is_some());
    }

    #[test]
    fn test_game_over_freezes_session() {
        let mut game = Game::with_seed(6);
        game.frame(0.0).unwrap();
        let id = game.insert_live_piece(TierId(3), Vec2::new(200.0, 300.0)).unwrap();
        game.force_game_over().unwrap();
        let before = game.sim.state.piece(id).unwrap().pos;

        let t = run_frames(&mut game, 0.0, 30);
        assert_eq!(game.sim.state.piece(id).unwrap().pos, before);
        assert!(game.game_over_summary().is_some());
        assert!(!game.pointer_up(100.0).unwrap());
        game.frame(t + 5000.0).unwrap();
        assert!(game.is_game_over());
    }

    #[test]
    fn test_restart_tears_down_old_session() {
        let mut game = Game::with_seed(7);
        game.frame(0.0).unwrap();
        game.sim.state.update_score(40);
        // Pending overflow confirmation from the old session
        game.insert_live_piece(TierId(0), Vec2::new(200.0, 150.0)).unwrap();
        game.frame(STEP).unwrap();
        assert!(game.sim.state.game_over_pending.is_some());

        game.restart(99);
        assert!(game.is_running());
        assert_eq!(game.sim.scheduler.timer_count(), 0);
        assert_eq!(game.sim.scheduler.deferred_len(), 0);
        assert!(game.sim.state.pieces.is_empty());
        assert_eq!(game.sim.physics.body_count(), 3);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 40);

        // Well past the old confirmation deadline: nothing stale fires
        game.frame(10_000.0).unwrap();
        run_frames(&mut game, 10_000.0, 10);
        assert!(!game.is_game_over());
        assert_eq!(game.sim.state.pieces.len(), 1);
    }
}
