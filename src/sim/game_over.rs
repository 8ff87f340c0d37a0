//! Game-over detection
//!
//! Two ways to lose:
//! - overflow: a settled piece pokes up to the staging line and is still
//!   there when the confirmation window closes. Only live pieces that have
//!   touched something count, never the staged piece, so fresh spawns don't
//!   end the run. A dropped piece is exempt only until it lands: one that
//!   comes to rest over the line keeps the spawn gate shut, and ending the
//!   run is the only way forward.
//! - too many terminal-tier pieces at once, which ends the game on the spot
//!   since that tier has nothing to merge into.

use super::piece::{Piece, PieceId};
use super::schedule::{TimerId, TimerKind};
use super::state::{GameEvent, PendingGameOver};
use super::world::Sim;
use crate::error::Result;

impl Sim {
    fn breaches_line(&self, piece: &Piece) -> bool {
        piece.is_live()
            && self.state.active != Some(piece.id)
            && piece.has_had_contact
            && piece.top() <= self.tuning.zone_boundary()
    }

    /// First piece (by id) currently over the line
    pub fn overflowing_piece(&self) -> Option<PieceId> {
        self.state
            .pieces
            .iter()
            .find(|p| self.breaches_line(p))
            .map(|p| p.id)
    }

    fn still_breaching(&self, id: PieceId) -> bool {
        self.state
            .piece(id)
            .is_some_and(|p| self.breaches_line(p))
    }

    /// Evaluate both loss conditions. Returns true once the game is over.
    pub fn check_game_over(&mut self, now: f64) -> Result<bool> {
        if self.state.game_over {
            return Ok(true);
        }

        let last = self.tiers.last();
        let terminal = self
            .state
            .pieces
            .iter()
            .filter(|p| p.tier == last && p.is_live())
            .count();
        if terminal > self.tuning.terminal_tier_limit {
            log::info!("{} terminal-tier pieces on the field, game over", terminal);
            self.finalize_game_over(None)?;
            return Ok(true);
        }

        match self.state.game_over_pending {
            Some(pending) => {
                if !self.still_breaching(pending.piece) {
                    self.scheduler.cancel(pending.timer);
                    self.state.game_over_pending = None;
                    self.state
                        .events
                        .push(GameEvent::GameOverCancelled { id: pending.piece });
                    log::info!("Overflow by {} cleared, game continues", pending.piece);
                }
            }
            None => {
                if let Some(id) = self.overflowing_piece() {
                    let timer = self.scheduler.schedule(
                        now + self.tuning.game_over_confirm_ms,
                        TimerKind::ConfirmGameOver(id),
                    );
                    self.state.game_over_pending = Some(PendingGameOver { piece: id, timer });
                    self.state.events.push(GameEvent::GameOverPending { id });
                    log::info!("{} crossed the line, confirming game over", id);
                }
            }
        }
        Ok(false)
    }

    /// Confirmation timer fired. Ends the game if the same piece still
    /// exists and still breaches the line; otherwise does nothing.
    pub fn confirm_game_over(&mut self, id: PieceId, timer: TimerId) -> Result<bool> {
        if self.state.game_over {
            return Ok(true);
        }
        let current = self
            .state
            .game_over_pending
            .is_some_and(|p| p.timer == timer && p.piece == id);
        if !current {
            return Ok(false);
        }
        self.state.game_over_pending = None;
        if self.still_breaching(id) {
            self.finalize_game_over(Some(id))?;
            return Ok(true);
        }
        log::debug!("Confirmation for {} found nothing to confirm", id);
        Ok(false)
    }

    /// Freeze the field and end the run
    pub fn finalize_game_over(&mut self, trigger: Option<PieceId>) -> Result<()> {
        if self.state.game_over {
            return Ok(());
        }
        for piece in &self.state.pieces {
            self.physics.set_collisions(piece.body, false)?;
        }
        if let Some(id) = trigger {
            if let Some(piece) = self.state.piece(id) {
                self.physics.set_kinematic(piece.body, true)?;
            }
        }
        self.scheduler.cancel_all();
        self.state.game_over = true;
        self.state.game_over_pending = None;
        self.state.events.push(GameEvent::GameOver {
            score: self.state.score,
        });
        log::info!(
            "Game over: score {}, high score {}",
            self.state.score,
            self.state.high_score
        );
        Ok(())
    }
}
