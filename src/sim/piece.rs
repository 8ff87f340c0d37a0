//! Runtime piece: one tier, one physics body

use std::fmt;

use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use super::physics::{CircleBody, PhysicsWorld};
use super::tier::{Tier, TierId};
use crate::error::Result;
use crate::settings::Tuning;

/// Stable piece identity (never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A Pal on the field
#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub tier: TierId,
    pub radius: f32,
    pub body: RigidBodyHandle,
    /// Staged: kinematic and non-colliding, waiting to be dropped
    pub is_static: bool,
    /// Claimed by a pending merge
    pub is_processing: bool,
    /// Has touched another piece or a wall at least once
    pub has_had_contact: bool,
    pub created_at: f64,
    /// Position at the end of the latest physics step
    pub pos: Vec2,
    /// Position at the end of the step before, for interpolation
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
}

/// Collider density for a tier: grows with r² so larger Pals stack heavier
pub fn tier_density(radius: f32, smallest_radius: f32, base_density: f32) -> f32 {
    let scale = radius / smallest_radius.max(f32::EPSILON);
    base_density * scale * scale
}

impl Piece {
    /// Create a piece and its body in the world
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        id: PieceId,
        tier: &Tier,
        smallest_radius: f32,
        pos: Vec2,
        staged: bool,
        physics: &mut PhysicsWorld,
        tuning: &Tuning,
        now: f64,
    ) -> Result<Self> {
        let body = physics.add_circle(CircleBody {
            pos,
            radius: tier.radius,
            density: tier_density(tier.radius, smallest_radius, tuning.base_density),
            restitution: tuning.restitution,
            friction: tuning.friction,
            staged,
        })?;
        Ok(Self {
            id,
            tier: tier.id,
            radius: tier.radius,
            body,
            is_static: staged,
            is_processing: false,
            has_had_contact: false,
            created_at: now,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            angle: 0.0,
        })
    }

    /// Detach the body from the world
    pub fn remove(&self, physics: &mut PhysicsWorld) -> Result<()> {
        physics.remove_body(self.body)
    }

    /// Live pieces are dynamic and collide
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.is_static
    }

    /// Y of the piece's topmost point
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.radius
    }

    /// Pull the latest body state from physics
    pub fn sync(&mut self, physics: &PhysicsWorld) {
        if let Some(state) = physics.body_state(self.body) {
            self.prev_pos = self.pos;
            self.pos = state.pos;
            self.vel = state.vel;
            self.angle = state.angle;
        }
    }

    /// Move the piece (and its body) without interpolating the jump
    pub fn teleport(&mut self, pos: Vec2, physics: &mut PhysicsWorld) -> Result<()> {
        physics.set_position(self.body, pos)?;
        self.pos = pos;
        self.prev_pos = pos;
        Ok(())
    }
}
