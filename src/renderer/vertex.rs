//! Instance records for GPU drawing

use bytemuck::{Pod, Zeroable};

/// One circle per piece, drawn instanced
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PieceInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub angle: f32,
    pub color: [f32; 4],
    pub tier: u32,
    /// Bit 0: staged
    pub flags: u32,
    pub _pad: [u32; 2],
}

impl PieceInstance {
    pub const FLAG_STAGED: u32 = 1;

    pub fn is_staged(&self) -> bool {
        self.flags & Self::FLAG_STAGED != 0
    }
}

/// Axis-aligned rectangle (walls)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub center: [f32; 2],
    pub half_extents: [f32; 2],
    pub color: [f32; 4],
}

/// Parse `#RRGGBB` into RGBA floats. Anything else is `None`.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 4]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([
        channel(0)? as f32 / 255.0,
        channel(2)? as f32 / 255.0,
        channel(4)? as f32 / 255.0,
        1.0,
    ])
}

/// Colors for field elements
pub mod colors {
    pub const WALL: [f32; 4] = [0.35, 0.3, 0.25, 1.0];
    pub const AIM_LINE: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
    pub const STAGING_LINE: [f32; 4] = [0.9, 0.3, 0.3, 0.6];
    pub const BACKGROUND: [f32; 4] = [0.96, 0.93, 0.86, 1.0];
    /// Fallback when a tier's colour doesn't parse
    pub const UNKNOWN: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
}
