//! Tier ladder
//!
//! An ordered table of piece tiers. Each tier fuses into exactly one
//! successor except the last, radii strictly grow along the ladder and
//! score values never shrink. The table is configuration: the built-in Pal
//! ladder can be replaced by JSON as long as it validates.

use std::fmt;

use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Index into the tier ladder (0 = smallest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TierId(pub u8);

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TierId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Display metadata the core carries but never interprets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierMeta {
    pub name: String,
    /// Background colour, `#RRGGBB`
    pub color: String,
    /// Asset key handed to the image provider
    pub image: String,
}

/// One rung of the ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub radius: f32,
    pub score: u64,
    pub next: Option<TierId>,
    pub meta: TierMeta,
}

/// Validated, ordered tier ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

/// Built-in ladder: (name, radius, score, colour)
const PALS: [(&str, f32, u64, &str); 12] = [
    ("Lamball", 20.0, 2, "#F8E8E8"),
    ("Chikipi", 25.0, 4, "#FFE5B4"),
    ("Foxparks", 30.0, 8, "#FF7F50"),
    ("Pengullet", 35.0, 16, "#87CEEB"),
    ("Cattiva", 40.0, 32, "#DDA0DD"),
    ("Lifmunk", 45.0, 64, "#90EE90"),
    ("Fuack", 50.0, 128, "#4682B4"),
    ("Rooby", 55.0, 256, "#CD5C5C"),
    ("Arsox", 60.0, 512, "#FF4500"),
    ("Mau", 65.0, 768, "#9370DB"),
    ("Verdash", 68.0, 896, "#32CD32"),
    ("Jetragon", 70.0, 1024, "#4169E1"),
];

impl Default for TierTable {
    fn default() -> Self {
        let last = PALS.len() - 1;
        let tiers = PALS
            .iter()
            .enumerate()
            .map(|(i, &(name, radius, score, color))| Tier {
                id: TierId(i as u8),
                radius,
                score,
                next: (i < last).then(|| TierId(i as u8 + 1)),
                meta: TierMeta {
                    name: name.to_string(),
                    color: color.to_string(),
                    image: format!("assets/{}.png", name.to_lowercase()),
                },
            })
            .collect();
        Self { tiers }
    }
}

impl TierTable {
    /// Build a table, checking the ladder invariants
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(GameError::InvalidTierTable("table is empty".into()));
        }
        if tiers.len() > u8::MAX as usize {
            return Err(GameError::InvalidTierTable("too many tiers".into()));
        }
        let last = tiers.len() - 1;
        for (i, tier) in tiers.iter().enumerate() {
            if tier.id.index() != i {
                return Err(GameError::InvalidTierTable(format!(
                    "tier at position {} has id {}",
                    i, tier.id
                )));
            }
            if !(tier.radius > 0.0) {
                return Err(GameError::InvalidTierTable(format!(
                    "tier {} has non-positive radius",
                    tier.id
                )));
            }
            let expected_next = (i < last).then(|| TierId(i as u8 + 1));
            if tier.next != expected_next {
                return Err(GameError::InvalidTierTable(format!(
                    "tier {} must fuse into {:?}, not {:?}",
                    tier.id, expected_next, tier.next
                )));
            }
            if i > 0 {
                let prev = &tiers[i - 1];
                if tier.radius <= prev.radius {
                    return Err(GameError::InvalidTierTable(format!(
                        "tier {} is not larger than tier {}",
                        tier.id, prev.id
                    )));
                }
                if tier.score < prev.score {
                    return Err(GameError::InvalidTierTable(format!(
                        "tier {} scores less than tier {}",
                        tier.id, prev.id
                    )));
                }
            }
        }
        Ok(Self { tiers })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tiers: Vec<Tier> = serde_json::from_str(json)?;
        Self::new(tiers)
    }

    pub fn get(&self, id: TierId) -> Result<&Tier> {
        self.tiers.get(id.index()).ok_or(GameError::UnknownTier(id))
    }

    pub fn first(&self) -> TierId {
        TierId(0)
    }

    /// The terminal tier (no successor)
    pub fn last(&self) -> TierId {
        TierId((self.tiers.len() - 1) as u8)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    /// Radius of a tier, 0 for unknown ids
    pub fn radius(&self, id: TierId) -> f32 {
        self.tiers.get(id.index()).map(|t| t.radius).unwrap_or(0.0)
    }

    /// Draw the next drop tier from the lowest `pool` tiers
    ///
    /// Weight ∝ ln(100 / r) · (1 / r)², so small tiers dominate while the
    /// upper end of the pool still shows up now and then.
    pub fn draw_spawn_tier<R: Rng + ?Sized>(&self, pool: usize, rng: &mut R) -> TierId {
        let pool = pool.clamp(1, self.tiers.len());
        let weights: Vec<f64> = self.tiers[..pool]
            .iter()
            .map(|t| spawn_weight(t.radius))
            .collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => TierId(rng.sample(dist) as u8),
            // All weights zero (radii >= 100): plain uniform pick
            Err(_) => TierId(rng.random_range(0..pool) as u8),
        }
    }
}

/// Relative spawn weight for a tier of the given radius
pub fn spawn_weight(radius: f32) -> f64 {
    let r = radius as f64;
    ((100.0 / r).ln() * (1.0 / r).powi(2)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_default_ladder_is_monotone() {
        let table = TierTable::default();
        assert_eq!(table.len(), 12);
        for tier in table.iter() {
            if let Some(next) = tier.next {
                let next = table.get(next).unwrap();
                assert!(next.radius > tier.radius);
                assert!(next.score >= tier.score);
            }
        }
        assert_eq!(table.get(table.last()).unwrap().next, None);
        assert_eq!(table.get(table.last()).unwrap().meta.name, "Jetragon");
    }

    #[test]
    fn test_rejects_shrinking_radius() {
        let mut tiers: Vec<Tier> = TierTable::default().iter().cloned().collect();
        tiers[3].radius = 10.0;
        assert!(matches!(
            TierTable::new(tiers),
            Err(GameError::InvalidTierTable(_))
        ));
    }

    #[test]
    fn test_rejects_broken_successor_chain() {
        let mut tiers: Vec<Tier> = TierTable::default().iter().cloned().collect();
        tiers[2].next = Some(TierId(7));
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn test_json_table() {
        let json = r##"[
            { "id": 0, "radius": 10.0, "score": 1, "next": 1,
              "meta": { "name": "a", "color": "#000000", "image": "a.png" } },
            { "id": 1, "radius": 20.0, "score": 3, "next": null,
              "meta": { "name": "b", "color": "#ffffff", "image": "b.png" } }
        ]"##;
        let table = TierTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.last(), TierId(1));
        assert!(matches!(table.get(TierId(5)), Err(GameError::UnknownTier(_))));
    }

    #[test]
    fn test_spawn_weights_favor_small_tiers() {
        let w: Vec<f64> = PALS[..5].iter().map(|p| spawn_weight(p.1)).collect();
        assert!(w.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn test_spawn_distribution_skews_small() {
        let table = TierTable::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut counts = [0usize; 5];
        for _ in 0..5000 {
            counts[table.draw_spawn_tier(5, &mut rng).index()] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[4]);
    }

    proptest! {
        #[test]
        fn spawn_draw_stays_in_pool(seed in any::<u64>(), pool in 1usize..12) {
            let table = TierTable::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let tier = table.draw_spawn_tier(pool, &mut rng);
            prop_assert!(tier.index() < pool);
        }
    }
}
