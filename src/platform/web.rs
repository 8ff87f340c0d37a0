//! JavaScript-facing game handle
//!
//! The page owns the canvas, the animation-frame loop and the DOM widgets.
//! It translates pointer events into play-field x coordinates, calls
//! `frame` from `requestAnimationFrame`, and reads score and state back.
//! There is no global game instance: the page holds the `WebGame` it
//! constructed and passes it wherever it is needed.

use wasm_bindgen::prelude::*;

use crate::game::Game;
use crate::highscores::LocalStorageStore;
use crate::settings::Tuning;
use crate::sim::TierTable;
use crate::ui::{GameOverSummary, evolution_list};

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
}

#[wasm_bindgen]
impl WebGame {
    /// Start a game with the built-in ladder, seeded from the clock
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        super::init_logging();
        let seed = super::now_ms() as u64;
        let game = Game::new(
            Tuning::default(),
            TierTable::default(),
            seed,
            Box::new(LocalStorageStore),
        );
        log::info!("Pal Merge starting with seed {}", seed);
        WebGame { game }
    }

    /// Start a game with tuning and a tier ladder supplied as JSON
    pub fn with_config(tuning_json: &str, tiers_json: &str) -> Result<WebGame, JsValue> {
        super::init_logging();
        let tuning = Tuning::from_json(tuning_json).map_err(to_js)?;
        let tiers = TierTable::from_json(tiers_json).map_err(to_js)?;
        let seed = super::now_ms() as u64;
        let game = Game::new(tuning, tiers, seed, Box::new(LocalStorageStore));
        Ok(WebGame { game })
    }

    /// Advance to `now` (the `requestAnimationFrame` timestamp)
    pub fn frame(&mut self, now: f64) -> Result<(), JsValue> {
        self.game.frame(now).map(|_| ()).map_err(to_js)
    }

    pub fn pointer_down(&mut self, x: f32) -> Result<(), JsValue> {
        self.game.pointer_down(x).map_err(to_js)
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.game.pointer_move(x);
    }

    pub fn pointer_up(&mut self, x: f32) -> Result<bool, JsValue> {
        self.game.pointer_up(x).map_err(to_js)
    }

    pub fn restart(&mut self) {
        self.game.restart(super::now_ms() as u64);
    }

    pub fn score(&self) -> f64 {
        self.game.score() as f64
    }

    pub fn high_score(&self) -> f64 {
        self.game.high_score() as f64
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    /// Raw `PieceInstance` records for the renderer's instance buffer
    pub fn piece_instances(&self) -> Result<Vec<u8>, JsValue> {
        let frame = self.game.frame_view().map_err(to_js)?;
        let instances = frame.piece_instances(&self.game.sim.tiers);
        Ok(bytemuck::cast_slice::<_, u8>(&instances).to_vec())
    }

    /// Raw `RectInstance` records: background, walls and guides
    pub fn field_instances(&self) -> Result<Vec<u8>, JsValue> {
        let frame = self.game.frame_view().map_err(to_js)?;
        Ok(bytemuck::cast_slice::<_, u8>(&frame.field_instances()).to_vec())
    }

    /// Blend factor between the last two physics states
    pub fn alpha(&self) -> f32 {
        self.game.alpha()
    }

    /// Evolution list as JSON
    pub fn evolution_json(&self) -> Result<String, JsValue> {
        let slots: Vec<_> = evolution_list(&self.game.sim.state, &self.game.sim.tiers)
            .into_iter()
            .map(|s| serde_json::json!({
                "tier": s.tier.0,
                "name": s.name,
                "image": s.image,
                "discovered": s.discovered,
            }))
            .collect();
        serde_json::to_string(&slots).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Game-over screen data as JSON, or `null` while playing
    pub fn game_over_json(&self) -> String {
        match GameOverSummary::from_state(&self.game.sim.state) {
            Some(s) => serde_json::json!({
                "score": s.score,
                "highScore": s.high_score,
                "previousBest": s.previous_best,
                "newRecord": s.new_record,
                "bestTier": s.best_tier.0,
            })
            .to_string(),
            None => "null".to_string(),
        }
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}

fn to_js(e: crate::error::GameError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
