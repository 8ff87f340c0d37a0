//! Error taxonomy
//!
//! Precondition violations (physics used before init, missing assets, bad
//! tier tables) are fatal at the boundary. Merge placement trouble is not an
//! error at all: it falls back to a best-effort position and is only logged.

use thiserror::Error;

use crate::sim::{PieceId, TierId};

#[derive(Debug, Error)]
pub enum GameError {
    /// The physics adapter was used before `init` or after teardown
    #[error("physics world used before initialization")]
    PhysicsNotInitialized,

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("no tier with id {0}")]
    UnknownTier(TierId),

    #[error("invalid tier table: {0}")]
    InvalidTierTable(String),

    /// The asset provider had nothing to draw for a tier
    #[error("no drawable for tier {0}")]
    MissingAsset(TierId),

    /// High score could not be written
    #[error("storage error: {0}")]
    Storage(String),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
