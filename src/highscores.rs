//! High score persistence
//!
//! A single number: read once at startup, written whenever the score passes
//! it. Stored in LocalStorage on the web and in a small JSON file natively.

#[cfg(not(target_arch = "wasm32"))]
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use crate::error::GameError;
use crate::error::Result;

/// Where the best score lives between sessions
pub trait ScoreStore {
    /// Stored high score, 0 if there is none or it can't be read
    fn load(&self) -> u64;
    fn save(&mut self, high_score: u64) -> Result<()>;
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub value: u64,
    /// Number of writes, to check save frequency
    pub writes: u32,
}

impl MemoryStore {
    pub fn new(value: u64) -> Self {
        Self { value, writes: 0 }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> u64 {
        self.value
    }

    fn save(&mut self, high_score: u64) -> Result<()> {
        self.value = high_score;
        self.writes += 1;
        Ok(())
    }
}

/// On-disk record
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u64,
}

/// JSON file store (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ScoreStore for FileStore {
    fn load(&self) -> u64 {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No high score at {}, starting fresh", self.path.display());
                return 0;
            }
        };
        match serde_json::from_str::<HighScoreRecord>(&json) {
            Ok(record) => {
                log::info!("Loaded high score {}", record.high_score);
                record.high_score
            }
            Err(e) => {
                log::warn!("Ignoring unreadable high score file: {}", e);
                0
            }
        }
    }

    fn save(&mut self, high_score: u64) -> Result<()> {
        let json = serde_json::to_string(&HighScoreRecord { high_score })?;
        std::fs::write(&self.path, json)?;
        log::debug!("High score {} saved to {}", high_score, self.path.display());
        Ok(())
    }
}

/// Browser LocalStorage store (wasm only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const STORAGE_KEY: &'static str = "highScore";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn load(&self) -> u64 {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, high score not persisted");
            return 0;
        };
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(value)) => value.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn save(&mut self, high_score: u64) -> Result<()> {
        let storage =
            Self::storage().ok_or_else(|| GameError::Storage("LocalStorage unavailable".to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &high_score.to_string())
            .map_err(|e| GameError::Storage(format!("{:?}", e)))
    }
}
