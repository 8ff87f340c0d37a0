//! Renderer boundary
//!
//! The core never draws. Once per frame it captures a read-only
//! [`FrameView`] (pieces blended between the last two physics states, the
//! walls, the aiming line) and hands it to whatever [`Renderer`] the host
//! plugged in. Images come from an [`AssetProvider`] as opaque handles.

pub mod vertex;

use glam::Vec2;

pub use vertex::{PieceInstance, RectInstance, colors, parse_hex_color};

use crate::error::{GameError, Result};
use crate::sim::{PieceId, Sim, TierId, TierTable, WallRect};

/// Opaque drawable returned by the asset provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableHandle(pub u64);

/// Supplies one drawable per tier
pub trait AssetProvider {
    fn drawable(&self, tier: TierId) -> Option<DrawableHandle>;

    /// Like [`AssetProvider::drawable`], but a missing asset is an error
    fn require(&self, tier: TierId) -> Result<DrawableHandle> {
        self.drawable(tier).ok_or(GameError::MissingAsset(tier))
    }
}

/// Check every tier has art before the game starts
pub fn validate_assets(assets: &dyn AssetProvider, tiers: &TierTable) -> Result<()> {
    for tier in tiers.iter() {
        assets.require(tier.id)?;
    }
    Ok(())
}

/// Draws a captured frame; never writes back into the game
pub trait Renderer {
    fn draw(&mut self, frame: &FrameView, assets: &dyn AssetProvider) -> Result<()>;
}

/// A piece as it should appear this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceView {
    pub id: PieceId,
    pub tier: TierId,
    pub pos: Vec2,
    pub radius: f32,
    pub angle: f32,
    pub staged: bool,
}

/// Vertical guide under the staged piece
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimLine {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Everything a renderer reads for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub pieces: Vec<PieceView>,
    pub walls: [WallRect; 3],
    pub aim: Option<AimLine>,
    /// Y of the line between staging and play zones
    pub boundary: f32,
    pub field_size: Vec2,
    pub alpha: f32,
}

impl FrameView {
    /// Snapshot the simulation, blending positions by `alpha`
    pub fn capture(sim: &Sim, alpha: f32) -> Result<Self> {
        let walls = sim.physics.walls()?.rects;
        let alpha = alpha.clamp(0.0, 1.0);
        let pieces = sim
            .state
            .pieces
            .iter()
            .map(|p| PieceView {
                id: p.id,
                tier: p.tier,
                pos: p.prev_pos + (p.pos - p.prev_pos) * alpha,
                radius: p.radius,
                angle: p.angle,
                staged: p.is_static,
            })
            .collect();

        let floor_top = walls[0].center.y - walls[0].half_extents.y;
        let aim = sim.state.active_piece().map(|p| AimLine {
            x: p.pos.x,
            top: p.pos.y + p.radius,
            bottom: floor_top,
        });

        Ok(Self {
            pieces,
            walls,
            aim,
            boundary: sim.tuning.zone_boundary(),
            field_size: Vec2::new(sim.tuning.field_width, sim.tuning.field_height()),
            alpha,
        })
    }

    /// Pack pieces for instanced drawing
    pub fn piece_instances(&self, tiers: &TierTable) -> Vec<PieceInstance> {
        self.pieces
            .iter()
            .map(|p| {
                let color = tiers
                    .get(p.tier)
                    .ok()
                    .and_then(|t| parse_hex_color(&t.meta.color))
                    .unwrap_or(colors::UNKNOWN);
                PieceInstance {
                    center: p.pos.to_array(),
                    radius: p.radius,
                    angle: p.angle,
                    color,
                    tier: p.tier.0 as u32,
                    flags: if p.staged { PieceInstance::FLAG_STAGED } else { 0 },
                    _pad: [0; 2],
                }
            })
            .collect()
    }

    /// Rectangles for everything but the pieces, back to front:
    /// background, walls, staging line, then the aiming line if any
    pub fn field_instances(&self) -> Vec<RectInstance> {
        let half_field = self.field_size / 2.0;
        let mut rects = vec![RectInstance {
            center: half_field.to_array(),
            half_extents: half_field.to_array(),
            color: colors::BACKGROUND,
        }];
        rects.extend(self.walls.iter().map(|w| RectInstance {
            center: w.center.to_array(),
            half_extents: w.half_extents.to_array(),
            color: colors::WALL,
        }));
        rects.push(RectInstance {
            center: [half_field.x, self.boundary],
            half_extents: [half_field.x, GUIDE_HALF_WIDTH],
            color: colors::STAGING_LINE,
        });
        if let Some(aim) = self.aim {
            if aim.bottom > aim.top {
                let half_len = (aim.bottom - aim.top) / 2.0;
                rects.push(RectInstance {
                    center: [aim.x, aim.top + half_len],
                    half_extents: [GUIDE_HALF_WIDTH, half_len],
                    color: colors::AIM_LINE,
                });
            }
        }
        rects
    }
}

/// Half thickness of the staging and aiming guides, px
const GUIDE_HALF_WIDTH: f32 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use std::collections::HashMap;

    struct Atlas(HashMap<TierId, DrawableHandle>);

    impl AssetProvider for Atlas {
        fn drawable(&self, tier: TierId) -> Option<DrawableHandle> {
            self.0.get(&tier).copied()
        }
    }

    fn sim() -> Sim {
        Sim::new(Tuning::default(), TierTable::default(), 8, 0)
    }

    #[test]
    fn test_capture_blends_positions() {
        let mut sim = sim();
        let id = sim.insert_live_piece(TierId(1), Vec2::new(100.0, 300.0), 0.0).unwrap();
        {
            let piece = sim.state.piece_mut(id).unwrap();
            piece.prev_pos = Vec2::new(100.0, 300.0);
            piece.pos = Vec2::new(100.0, 310.0);
        }
        let frame = FrameView::capture(&sim, 0.25).unwrap();
        assert_eq!(frame.pieces[0].pos, Vec2::new(100.0, 302.5));
        assert!(frame.aim.is_none());
        assert_eq!(frame.boundary, 140.0);
    }

    #[test]
    fn test_aim_line_follows_staged_piece() {
        let mut sim = sim();
        let id = sim.create_new_piece(0.0).unwrap().unwrap();
        sim.follow_pointer(120.0).unwrap();
        let frame = FrameView::capture(&sim, 0.5).unwrap();
        let aim = frame.aim.unwrap();
        assert_eq!(aim.x, 120.0);
        assert_eq!(aim.top, 140.0);
        assert_eq!(aim.bottom, 523.0);

        let instances = frame.piece_instances(&sim.tiers);
        assert_eq!(instances.len(), 1);
        assert!(instances[0].is_staged());
        assert_eq!(frame.pieces[0].id, id);
    }

    #[test]
    fn test_field_instances_layering() {
        let mut sim = sim();
        let rects = FrameView::capture(&sim, 0.0).unwrap().field_instances();
        // Background, three walls, staging line; nothing staged yet
        assert_eq!(rects.len(), 5);
        assert_eq!(rects[0].color, colors::BACKGROUND);
        assert_eq!(rects[0].half_extents, [196.5, 266.5]);
        assert!(rects[1..4].iter().all(|r| r.color == colors::WALL));
        assert_eq!(rects[4].color, colors::STAGING_LINE);
        assert_eq!(rects[4].center, [196.5, 140.0]);

        sim.create_new_piece(0.0).unwrap();
        sim.follow_pointer(120.0).unwrap();
        let rects = FrameView::capture(&sim, 0.0).unwrap().field_instances();
        let aim = rects.last().unwrap();
        assert_eq!(aim.color, colors::AIM_LINE);
        assert_eq!(aim.center[0], 120.0);
        assert_eq!(aim.center[1] - aim.half_extents[1], 140.0);
        assert_eq!(aim.center[1] + aim.half_extents[1], 523.0);
    }

    #[test]
    fn test_capture_requires_initialized_physics() {
        let mut sim = sim();
        sim.teardown();
        assert!(matches!(
            FrameView::capture(&sim, 0.0),
            Err(GameError::PhysicsNotInitialized)
        ));
    }

    #[test]
    fn test_missing_asset_is_reported() {
        let tiers = TierTable::default();
        let mut atlas = Atlas(
            tiers
                .iter()
                .map(|t| (t.id, DrawableHandle(t.id.0 as u64)))
                .collect(),
        );
        assert!(validate_assets(&atlas, &tiers).is_ok());

        atlas.0.remove(&TierId(7));
        assert!(matches!(
            validate_assets(&atlas, &tiers),
            Err(GameError::MissingAsset(TierId(7)))
        ));
    }
}
