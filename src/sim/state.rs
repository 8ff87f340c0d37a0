//! Game state
//!
//! The authoritative model every component reads and mutates: score, the
//! piece set, the staged and last-dropped pieces, discovered tiers and the
//! game-over flags. Aside from the spawn gate and scoring it is plain data.

use std::collections::BTreeSet;

use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::physics::PhysicsWorld;
use super::piece::{Piece, PieceId};
use super::schedule::TimerId;
use super::tier::TierId;

/// Something the UI may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PieceSpawned { id: PieceId, tier: TierId },
    PieceDropped { id: PieceId, x: f32 },
    /// Drop refused because the launch area was occupied
    DropBlocked { id: PieceId },
    Merged {
        from: TierId,
        into: TierId,
        id: PieceId,
        at: Vec2,
    },
    TierDiscovered(TierId),
    ScoreChanged { score: u64, delta: u64 },
    NewHighScore(u64),
    GameOverPending { id: PieceId },
    GameOverCancelled { id: PieceId },
    GameOver { score: u64 },
}

/// An overflow waiting out its confirmation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingGameOver {
    pub piece: PieceId,
    pub timer: TimerId,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub score: u64,
    /// Best score ever, loaded from and written back to storage
    pub high_score: u64,
    /// High score at session start, to tell whether this run set a record
    pub starting_high_score: u64,
    /// All pieces, sorted by id
    pub pieces: Vec<Piece>,
    /// The staged piece following the cursor
    pub active: Option<PieceId>,
    /// The most recently dropped piece, until it clears the staging line
    pub last_dropped: Option<PieceId>,
    pub last_drop_time: f64,
    /// Tier of the next piece to stage (shown as preview)
    pub next_tier: TierId,
    pub discovered: BTreeSet<TierId>,
    pub game_over: bool,
    pub game_over_pending: Option<PendingGameOver>,
    /// Pending UI notifications, drained by the host
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Fresh state: the first tier is discovered and `next_tier` queued
    pub fn new(first_tier: TierId, next_tier: TierId, high_score: u64) -> Self {
        let mut state = Self {
            score: 0,
            high_score,
            starting_high_score: high_score,
            pieces: Vec::new(),
            active: None,
            last_dropped: None,
            last_drop_time: f64::NEG_INFINITY,
            next_tier: first_tier,
            discovered: BTreeSet::from([first_tier]),
            game_over: false,
            game_over_pending: None,
            events: Vec::new(),
            next_id: 1,
        };
        state.set_next_tier(next_tier);
        state.events.clear();
        state
    }

    /// Allocate a new piece ID
    pub fn next_piece_id(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_piece(&mut self, piece: Piece) {
        match self.pieces.binary_search_by_key(&piece.id, |p| p.id) {
            Ok(i) => self.pieces[i] = piece,
            Err(i) => self.pieces.insert(i, piece),
        }
    }

    /// Take a piece out of the set, dropping any references to it
    pub fn remove_piece(&mut self, id: PieceId) -> Option<Piece> {
        let i = self.pieces.binary_search_by_key(&id, |p| p.id).ok()?;
        if self.active == Some(id) {
            self.active = None;
        }
        if self.last_dropped == Some(id) {
            self.last_dropped = None;
        }
        Some(self.pieces.remove(i))
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.pieces[i])
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &mut self.pieces[i])
    }

    /// Resolve a physics body back to the piece that owns it
    pub fn piece_by_body(&self, body: RigidBodyHandle) -> Option<PieceId> {
        self.pieces.iter().find(|p| p.body == body).map(|p| p.id)
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.and_then(|id| self.piece(id))
    }

    /// Number of pieces of a tier, staged ones included
    pub fn count_tier(&self, tier: TierId) -> usize {
        self.pieces.iter().filter(|p| p.tier == tier).count()
    }

    /// Spawn gate: the last dropped piece must have fallen fully below
    /// `boundary`. Once it has, the reference is dropped and the gate stays
    /// open until the next drop.
    pub fn can_spawn_next(&mut self, boundary: f32) -> bool {
        let Some(id) = self.last_dropped else {
            return true;
        };
        let cleared = match self.piece(id) {
            // Released this frame or still staged: not falling yet
            Some(p) if p.is_static => false,
            Some(p) => p.top() > boundary,
            // Merged away already
            None => true,
        };
        if cleared {
            self.last_dropped = None;
        }
        cleared
    }

    /// Add points; raises the high score when beaten. Returns the new score.
    pub fn update_score(&mut self, points: u64) -> u64 {
        self.score += points;
        self.events.push(GameEvent::ScoreChanged {
            score: self.score,
            delta: points,
        });
        if self.score > self.high_score {
            self.high_score = self.score;
            self.events.push(GameEvent::NewHighScore(self.high_score));
        }
        self.score
    }

    /// Mark a tier as seen. Returns true the first time.
    pub fn discover(&mut self, tier: TierId) -> bool {
        let new = self.discovered.insert(tier);
        if new {
            log::info!("Discovered tier {}", tier);
            self.events.push(GameEvent::TierDiscovered(tier));
        }
        new
    }

    /// Queue the next tier; a previewed tier counts as discovered
    pub fn set_next_tier(&mut self, tier: TierId) {
        self.next_tier = tier;
        self.discover(tier);
    }

    pub fn is_new_record(&self) -> bool {
        self.score > self.starting_high_score
    }

    /// Copy the latest body states into every piece
    pub fn sync_from(&mut self, physics: &PhysicsWorld) {
        for piece in &mut self.pieces {
            piece.sync(physics);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
