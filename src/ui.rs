//! UI view models
//!
//! Plain data for the score display, the evolution list and the game-over
//! screen. The host builds its widgets from these; nothing here touches a
//! DOM or a window.

use crate::sim::{GameState, TierId, TierTable};

/// Score strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hud {
    pub score: u64,
    pub high_score: u64,
    /// Tier previewed for the next drop
    pub next_tier: TierId,
    pub next_name: String,
}

impl Hud {
    pub fn from_state(state: &GameState, tiers: &TierTable) -> Self {
        let next_name = tiers
            .get(state.next_tier)
            .map(|t| t.meta.name.clone())
            .unwrap_or_default();
        Self {
            score: state.score,
            high_score: state.high_score,
            next_tier: state.next_tier,
            next_name,
        }
    }
}

/// One entry of the evolution list
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionSlot {
    pub tier: TierId,
    /// Undiscovered tiers are listed but hidden
    pub discovered: bool,
    pub name: String,
    pub image: String,
    pub radius: f32,
}

/// The whole ladder in order, with what has been seen so far revealed
pub fn evolution_list(state: &GameState, tiers: &TierTable) -> Vec<EvolutionSlot> {
    tiers
        .iter()
        .map(|t| EvolutionSlot {
            tier: t.id,
            discovered: state.discovered.contains(&t.id),
            name: t.meta.name.clone(),
            image: t.meta.image.clone(),
            radius: t.radius,
        })
        .collect()
}

/// Game-over screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverSummary {
    pub score: u64,
    /// Best score before this run
    pub previous_best: u64,
    pub high_score: u64,
    pub new_record: bool,
    /// Highest tier reached this run
    pub best_tier: TierId,
}

impl GameOverSummary {
    /// `None` while the game is still running
    pub fn from_state(state: &GameState) -> Option<Self> {
        if !state.game_over {
            return None;
        }
        let best_tier = state
            .discovered
            .iter()
            .next_back()
            .copied()
            .unwrap_or(TierId(0));
        Some(Self {
            score: state.score,
            previous_best: state.starting_high_score,
            high_score: state.high_score,
            new_record: state.is_new_record(),
            best_tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evolution_list_reveals_discovered() {
        let tiers = TierTable::default();
        let mut state = GameState::new(TierId(0), TierId(1), 0);
        state.discover(TierId(5));

        let list = evolution_list(&state, &tiers);
        assert_eq!(list.len(), 12);
        let shown: Vec<u8> = list.iter().filter(|s| s.discovered).map(|s| s.tier.0).collect();
        assert_eq!(shown, vec![0, 1, 5]);
        assert_eq!(list[11].name, "Jetragon");
    }

    #[test]
    fn test_hud_names_next_tier() {
        let tiers = TierTable::default();
        let state = GameState::new(TierId(0), TierId(2), 77);
        let hud = Hud::from_state(&state, &tiers);
        assert_eq!(hud.next_name, "Foxparks");
        assert_eq!(hud.high_score, 77);
    }

    #[test]
    fn test_summary_only_after_game_over() {
        let mut state = GameState::new(TierId(0), TierId(0), 100);
        assert!(GameOverSummary::from_state(&state).is_none());

        state.update_score(150);
        state.discover(TierId(4));
        state.game_over = true;
        let summary = GameOverSummary::from_state(&state).unwrap();
        assert_eq!(summary.score, 150);
        assert_eq!(summary.previous_best, 100);
        assert_eq!(summary.high_score, 150);
        assert!(summary.new_record);
        assert_eq!(summary.best_tier, TierId(4));
    }
}
