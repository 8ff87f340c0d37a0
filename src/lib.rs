//! Pal Merge - a merge-drop arcade game core
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (physics adapter, pieces, merges, game over)
//! - `game`: Session that owns the simulation and answers host calls
//! - `input`: Pointer tracking against a capability port
//! - `renderer`: Read-only frame views for an external renderer
//! - `ui`: HUD, evolution list and game-over view models
//! - `platform`: Clock, logging and storage per target
//! - `settings`: Data-driven tuning

pub mod error;
pub mod game;
pub mod highscores;
pub mod input;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod ui;

pub use error::{GameError, Result};
pub use game::Game;
pub use highscores::{MemoryStore, ScoreStore};
pub use settings::Tuning;

use glam::Vec2;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Physics rate (60 Hz)
    pub const STEP_HZ: f32 = 60.0;
    /// Fixed physics step in milliseconds
    pub const STEP_MS: f64 = 1000.0 / 60.0;
    /// Longest frame the accumulator will accept after a stall
    pub const MAX_FRAME_MS: f64 = 250.0;

    /// Field dimensions (square play area under the staging strip)
    pub const FIELD_WIDTH: f32 = 393.0;
    pub const STAGING_HEIGHT: f32 = 140.0;
    pub const PLAY_HEIGHT: f32 = 393.0;
    pub const WALL_THICKNESS: f32 = 20.0;
    /// Gap kept between a dropped piece and the side walls
    pub const DROP_MARGIN: f32 = 10.0;

    /// Downward gravity, px/s² (y grows downward)
    pub const GRAVITY: f32 = 980.0;
    pub const RESTITUTION: f32 = 0.25;
    pub const FRICTION: f32 = 0.5;
    /// Density of the smallest tier; larger tiers scale by (r / r0)²
    pub const BASE_DENSITY: f32 = 1.0;

    /// Timing (ms)
    pub const DROP_COOLDOWN_MS: f64 = 300.0;
    pub const SPAWN_RETRY_MS: f64 = 100.0;
    pub const GAME_OVER_CONFIRM_MS: f64 = 3000.0;

    /// More than this many terminal-tier pieces ends the game at once
    pub const TERMINAL_TIER_LIMIT: usize = 4;
    /// Only the lowest tiers are drawn for new drops
    pub const SPAWN_POOL_SIZE: usize = 5;

    /// Merge placement search
    pub const MERGE_CLEARANCE: f32 = 1.2;
    pub const SPIRAL_ANGLES: u32 = 8;
    pub const SPIRAL_RINGS: u32 = 3;
}

/// Clamp a horizontal drop position so a piece of `radius` stays clear of
/// both side walls by `margin`
#[inline]
pub fn clamp_drop_x(x: f32, radius: f32, width: f32, margin: f32) -> f32 {
    let min_x = radius + margin;
    let max_x = width - radius - margin;
    if min_x > max_x {
        // Piece wider than the field: pin to the centre
        return width / 2.0;
    }
    x.clamp(min_x, max_x)
}

/// Point on a circle of radius `r` around `center` at angle `theta`
#[inline]
pub fn polar_offset(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}
