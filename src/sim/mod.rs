//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by piece ID)
//! - No rendering or platform dependencies

pub mod game_over;
pub mod merge;
pub mod physics;
pub mod piece;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod tier;
pub mod world;

pub use merge::{clamp_to_play_zone, find_clear_spot};
pub use physics::{BodyPair, BodyState, CircleBody, PhysicsWorld, WallRect, Walls};
pub use piece::{Piece, PieceId, tier_density};
pub use schedule::{Scheduler, Task, TimerId, TimerKind};
pub use state::{GameEvent, GameState, PendingGameOver};
pub use tick::FrameClock;
pub use tier::{Tier, TierId, TierMeta, TierTable, spawn_weight};
pub use world::Sim;
