//! Gameplay tuning
//!
//! Every numeric knob whose exact value is a matter of feel rather than
//! contract lives here. Loaded from JSON, missing fields fall back to
//! [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    pub field_width: f32,
    /// Height of the staging strip above the play zone
    pub staging_height: f32,
    pub play_height: f32,
    pub wall_thickness: f32,
    pub drop_margin: f32,

    // === Physics ===
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub base_density: f32,
    pub step_hz: f32,
    pub max_frame_ms: f64,

    // === Timing ===
    pub drop_cooldown_ms: f64,
    pub spawn_retry_ms: f64,
    pub game_over_confirm_ms: f64,
    /// Cursor-follow cadence while a piece is staged
    pub follow_poll_hz: f32,

    // === Rules ===
    pub terminal_tier_limit: usize,
    pub spawn_pool_size: usize,
    pub merge_clearance: f32,
    pub spiral_angles: u32,
    pub spiral_rings: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            staging_height: STAGING_HEIGHT,
            play_height: PLAY_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            drop_margin: DROP_MARGIN,

            gravity: GRAVITY,
            restitution: RESTITUTION,
            friction: FRICTION,
            base_density: BASE_DENSITY,
            step_hz: STEP_HZ,
            max_frame_ms: MAX_FRAME_MS,

            drop_cooldown_ms: DROP_COOLDOWN_MS,
            spawn_retry_ms: SPAWN_RETRY_MS,
            game_over_confirm_ms: GAME_OVER_CONFIRM_MS,
            follow_poll_hz: STEP_HZ,

            terminal_tier_limit: TERMINAL_TIER_LIMIT,
            spawn_pool_size: SPAWN_POOL_SIZE,
            merge_clearance: MERGE_CLEARANCE,
            spiral_angles: SPIRAL_ANGLES,
            spiral_rings: SPIRAL_RINGS,
        }
    }
}

impl Tuning {
    /// Total field height (staging strip + play zone)
    pub fn field_height(&self) -> f32 {
        self.staging_height + self.play_height
    }

    /// Y of the line between the staging strip and the play zone
    #[inline]
    pub fn zone_boundary(&self) -> f32 {
        self.staging_height
    }

    /// Fixed physics step in milliseconds
    pub fn step_ms(&self) -> f64 {
        1000.0 / self.step_hz as f64
    }

    pub fn follow_interval_ms(&self) -> f64 {
        1000.0 / self.follow_poll_hz as f64
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tuning from a JSON file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }
}
