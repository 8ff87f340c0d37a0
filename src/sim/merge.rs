//! Collision and merge resolution
//!
//! A contact between two live, idle pieces of the same tier claims both
//! (`is_processing`) and defers the merge to the next frame, so physics is
//! never mutated mid-step. Claimed pieces ignore every further contact,
//! which is what keeps a contact reported twice from merging twice.
//!
//! Executing a merge replaces the pair with one piece of the successor tier
//! near their midpoint, scores the successor's value and marks it
//! discovered. A merge that fails is tried once more on the next frame,
//! since the pair is still touching and the engine won't report it again.
//! Processing flags are cleared once the merge completes or is given up.

use glam::Vec2;

use super::physics::BodyPair;
use super::piece::{Piece, PieceId};
use super::schedule::Task;
use super::state::{GameEvent, GameState};
use super::world::Sim;
use crate::error::{GameError, Result};
use crate::settings::Tuning;
use crate::{clamp_drop_x, polar_offset};

impl Sim {
    /// Handle one newly touching body pair. Returns true if the pair was
    /// claimed for a merge.
    pub fn on_collision_begin(&mut self, pair: BodyPair) -> bool {
        if self.state.game_over {
            return false;
        }

        let a = self.state.piece_by_body(pair.a);
        let b = self.state.piece_by_body(pair.b);

        // Any touch, walls included, counts as contact
        for id in [a, b].into_iter().flatten() {
            if let Some(piece) = self.state.piece_mut(id) {
                if piece.is_live() {
                    piece.has_had_contact = true;
                }
            }
        }

        if self.physics.is_wall(pair.a) || self.physics.is_wall(pair.b) {
            return false;
        }
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        let (Some(pa), Some(pb)) = (self.state.piece(a), self.state.piece(b)) else {
            return false;
        };
        if pa.is_processing || pb.is_processing || pa.is_static || pb.is_static {
            return false;
        }
        if pa.tier != pb.tier {
            return false;
        }
        let has_successor = self
            .tiers
            .get(pa.tier)
            .map(|t| t.next.is_some())
            .unwrap_or(false);
        if !has_successor {
            return false;
        }

        for id in [a, b] {
            if let Some(piece) = self.state.piece_mut(id) {
                piece.is_processing = true;
            }
        }
        self.scheduler.defer(Task::Merge { a, b, retry: false });
        log::debug!("Merge candidates {} + {}", a, b);
        true
    }

    /// Execute a deferred merge. Returns the new piece, if one was made.
    ///
    /// A first failure keeps both pieces claimed and queues one retry. After
    /// that neither source is left claimed, and a game-over check is queued
    /// for the next frame.
    pub fn resolve_merge(&mut self, a: PieceId, b: PieceId, retry: bool, now: f64) -> Option<PieceId> {
        let result = self.fuse(a, b, now);

        if let Err(e) = &result {
            if !retry && self.both_live(a, b) {
                log::warn!("Merge of {} + {} failed, retrying: {}", a, b, e);
                self.scheduler.defer(Task::Merge { a, b, retry: true });
                return None;
            }
        }

        for id in [a, b] {
            if let Some(piece) = self.state.piece_mut(id) {
                piece.is_processing = false;
            }
        }
        self.scheduler.defer(Task::CheckGameOver);

        match result {
            Ok(fused) => fused,
            Err(e) => {
                log::warn!("Merge of {} + {} failed: {}", a, b, e);
                None
            }
        }
    }

    fn both_live(&self, a: PieceId, b: PieceId) -> bool {
        self.state.piece(a).is_some_and(Piece::is_live) && self.state.piece(b).is_some_and(Piece::is_live)
    }

    fn fuse(&mut self, a: PieceId, b: PieceId, now: f64) -> Result<Option<PieceId>> {
        if self.state.game_over {
            return Ok(None);
        }
        let (Some(pa), Some(pb)) = (self.state.piece(a), self.state.piece(b)) else {
            // One side vanished since the contact (restart, game over)
            return Ok(None);
        };
        let from = pa.tier;
        let midpoint = (pa.pos + pb.pos) / 2.0;
        let Some(into) = self.tiers.get(from)?.next else {
            return Ok(None);
        };

        let smallest = self.smallest_radius();
        let tier = self.tiers.get(into)?;
        let (pos, clear) = find_clear_spot(&self.state, &[a, b], midpoint, tier.radius, &self.tuning);
        if !clear {
            log::warn!(
                "No clear spot near ({:.1}, {:.1}) for tier {}, placing at ({:.1}, {:.1})",
                midpoint.x,
                midpoint.y,
                into,
                pos.x,
                pos.y
            );
        }

        let id = self.state.next_piece_id();
        let fused = Piece::spawn(
            id,
            tier,
            smallest,
            pos,
            false,
            &mut self.physics,
            &self.tuning,
            now,
        )?;
        let score = tier.score;
        self.state.add_piece(fused);

        for source in [a, b] {
            let piece = self
                .state
                .remove_piece(source)
                .ok_or(GameError::UnknownPiece(source))?;
            piece.remove(&mut self.physics)?;
        }

        self.state.update_score(score);
        self.state.discover(into);
        self.state.events.push(GameEvent::Merged {
            from,
            into,
            id,
            at: pos,
        });
        log::debug!("Merged {} + {} (tier {}) into {} (tier {})", a, b, from, id, into);
        Ok(Some(id))
    }
}

/// Keep a piece of `radius` inside the play zone
pub fn clamp_to_play_zone(pos: Vec2, radius: f32, tuning: &Tuning) -> Vec2 {
    let x = clamp_drop_x(pos.x, radius, tuning.field_width, tuning.drop_margin);
    let min_y = tuning.zone_boundary() + radius;
    let max_y = tuning.field_height() - tuning.wall_thickness / 2.0 - radius;
    let y = if min_y <= max_y {
        pos.y.clamp(min_y, max_y)
    } else {
        (min_y + max_y) / 2.0
    };
    Vec2::new(x, y)
}

/// Whether a piece of `radius` at `pos` keeps `clearance`·radius away from
/// every live piece not in `exclude`
fn is_clear(state: &GameState, exclude: &[PieceId], pos: Vec2, radius: f32, clearance: f32) -> bool {
    state
        .pieces
        .iter()
        .filter(|p| p.is_live() && !exclude.contains(&p.id))
        .all(|p| p.pos.distance(pos) - p.radius >= radius * clearance)
}

/// Find a spot near `origin` for a freshly fused piece
///
/// Tries the origin, then walks outward ring by ring (one radius per ring)
/// around it. Every candidate is clamped into the play zone. Returns
/// the position and whether it is actually clear; when the budget runs out
/// the last candidate is returned anyway.
pub fn find_clear_spot(
    state: &GameState,
    exclude: &[PieceId],
    origin: Vec2,
    radius: f32,
    tuning: &Tuning,
) -> (Vec2, bool) {
    let clearance = tuning.merge_clearance;
    let mut candidate = clamp_to_play_zone(origin, radius, tuning);
    if is_clear(state, exclude, candidate, radius, clearance) {
        return (candidate, true);
    }

    let angles = tuning.spiral_angles.max(1);
    for ring in 1..=tuning.spiral_rings {
        let dist = radius * ring as f32;
        for k in 0..angles {
            let theta = std::f32::consts::TAU * k as f32 / angles as f32;
            candidate = clamp_to_play_zone(polar_offset(origin, dist, theta), radius, tuning);
            if is_clear(state, exclude, candidate, radius, clearance) {
                return (candidate, true);
            }
        }
    }
    (candidate, false)
}
