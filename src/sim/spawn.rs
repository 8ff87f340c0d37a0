//! Spawn and drop control
//!
//! A piece is staged at the top centre as a kinematic, non-colliding body,
//! follows the cursor horizontally, and on drop is pinned to the clamped x.
//! It only becomes dynamic on the following frame so it never falls from a
//! stale position.

use glam::Vec2;

use super::piece::{Piece, PieceId};
use super::schedule::{Task, TimerKind};
use super::state::GameEvent;
use super::tier::TierId;
use super::world::Sim;
use crate::clamp_drop_x;
use crate::error::Result;

/// Pieces this far below the staging line still count as "in the launch area"
const LAUNCH_AREA_DEPTH: f32 = 100.0;

impl Sim {
    /// Stage a piece of the queued tier. No-op while a piece is staged or
    /// after game over.
    pub fn create_new_piece(&mut self, now: f64) -> Result<Option<PieceId>> {
        if self.state.game_over || self.state.active.is_some() {
            return Ok(None);
        }

        let smallest = self.smallest_radius();
        let tier = self.tiers.get(self.state.next_tier)?;
        let pos = Vec2::new(
            self.tuning.field_width / 2.0,
            self.tuning.zone_boundary() - tier.radius,
        );
        let id = self.state.next_piece_id();
        let piece = Piece::spawn(
            id,
            tier,
            smallest,
            pos,
            true,
            &mut self.physics,
            &self.tuning,
            now,
        )?;
        let tier_id = piece.tier;
        self.state.add_piece(piece);
        self.state.active = Some(id);
        self.state
            .events
            .push(GameEvent::PieceSpawned { id, tier: tier_id });

        let next = self.draw_next_tier();
        self.state.set_next_tier(next);
        log::debug!("Staged {} (tier {}), next tier {}", id, tier_id, next);
        Ok(Some(id))
    }

    /// Whether a new piece may be staged right now
    ///
    /// Checks, in order: game running, nothing staged, drop cooldown over,
    /// last drop clear of the staging line. The last check is one-shot, so
    /// it runs only when everything else passes.
    pub fn spawn_gate_open(&mut self, now: f64) -> bool {
        !self.state.game_over
            && self.state.active.is_none()
            && now - self.state.last_drop_time >= self.tuning.drop_cooldown_ms
            && self.state.can_spawn_next(self.tuning.zone_boundary())
    }

    /// Player asked for a piece: stage it if allowed, otherwise retry shortly
    pub fn request_spawn(&mut self, now: f64) -> Result<Option<PieceId>> {
        if self.spawn_gate_open(now) {
            return self.create_new_piece(now);
        }
        if !self.state.game_over
            && self.state.active.is_none()
            && !self.scheduler.is_pending(TimerKind::SpawnRetry)
        {
            self.scheduler
                .schedule(now + self.tuning.spawn_retry_ms, TimerKind::SpawnRetry);
        }
        Ok(None)
    }

    /// True while the staged piece is dropped but not yet released
    pub fn release_pending(&self) -> bool {
        self.state.active.is_some() && self.state.active == self.state.last_dropped
    }

    /// Drop the staged piece at `target_x` (clamped inside the walls)
    ///
    /// Returns false if nothing was dropped: no staged piece, a release
    /// already pending, or the launch area blocked at that x.
    pub fn drop_current_piece(&mut self, target_x: f32, now: f64) -> Result<bool> {
        let Some(id) = self.state.active else {
            return Ok(false);
        };
        if self.release_pending() {
            return Ok(false);
        }
        let Some(piece) = self.state.piece(id) else {
            return Ok(false);
        };
        let radius = piece.radius;
        let y = piece.pos.y;
        let x = clamp_drop_x(
            target_x,
            radius,
            self.tuning.field_width,
            self.tuning.drop_margin,
        );
        let drop_pos = Vec2::new(x, y);

        let launch_floor = self.tuning.zone_boundary() + LAUNCH_AREA_DEPTH;
        let blocked = self.state.pieces.iter().any(|other| {
            other.id != id
                && other.pos.y <= launch_floor
                && other.pos.distance(drop_pos) < radius + other.radius
        });
        if blocked {
            let home = Vec2::new(self.tuning.field_width / 2.0, y);
            if let Some(piece) = self.state.piece_mut(id) {
                piece.teleport(home, &mut self.physics)?;
            }
            self.state.events.push(GameEvent::DropBlocked { id });
            log::debug!("Drop of {} refused: launch area occupied at x={}", id, x);
            return Ok(false);
        }

        if let Some(piece) = self.state.piece_mut(id) {
            piece.teleport(drop_pos, &mut self.physics)?;
        }
        self.state.last_dropped = Some(id);
        self.state.last_drop_time = now;
        self.state.events.push(GameEvent::PieceDropped { id, x });
        self.scheduler.defer(Task::Release(id));
        log::debug!("Dropped {} at x={}", id, x);
        Ok(true)
    }

    /// Turn a dropped piece into a live body and clear the staged slot
    pub fn release_piece(&mut self, id: PieceId) -> Result<()> {
        if self.state.game_over {
            return Ok(());
        }
        let Some(piece) = self.state.piece_mut(id) else {
            return Ok(());
        };
        piece.is_static = false;
        let body = piece.body;
        self.physics.set_collisions(body, true)?;
        self.physics.set_kinematic(body, false)?;
        if self.state.active == Some(id) {
            self.state.active = None;
        }
        Ok(())
    }

    /// Keep the staged piece under the pointer
    pub fn follow_pointer(&mut self, x: f32) -> Result<()> {
        if self.release_pending() {
            return Ok(());
        }
        let Some(id) = self.state.active else {
            return Ok(());
        };
        let width = self.tuning.field_width;
        let margin = self.tuning.drop_margin;
        if let Some(piece) = self.state.piece_mut(id) {
            let x = clamp_drop_x(x, piece.radius, width, margin);
            if (piece.pos.x - x).abs() > f32::EPSILON {
                piece.teleport(Vec2::new(x, piece.pos.y), &mut self.physics)?;
            }
        }
        Ok(())
    }

    /// Place a live piece directly (developer tool). Pieces placed inside
    /// the play zone count as having had contact already.
    pub fn insert_live_piece(&mut self, tier: TierId, pos: Vec2, now: f64) -> Result<PieceId> {
        let smallest = self.smallest_radius();
        let tier = self.tiers.get(tier)?;
        let id = self.state.next_piece_id();
        let mut piece = Piece::spawn(
            id,
            tier,
            smallest,
            pos,
            false,
            &mut self.physics,
            &self.tuning,
            now,
        )?;
        if pos.y > self.tuning.zone_boundary() {
            piece.has_had_contact = true;
        }
        self.state.add_piece(piece);
        self.state.discover(tier.id);
        Ok(id)
    }
}
