// 🎨 Palette - exhaustive category colors + continuous scales

use crate::dataset::OccupationCategory;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Linear RGB interpolation, `t` clamped to [0, 1]
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

// ============================================================================
// NAMED COLORS
// ============================================================================

pub const GREEN: Rgb = Rgb(0x00, 0x80, 0x00);
pub const RED: Rgb = Rgb(0xFF, 0x00, 0x00);
pub const BLUE: Rgb = Rgb(0x64, 0x95, 0xED);
pub const ORANGE: Rgb = Rgb(0xFF, 0xA0, 0x7A);
pub const PURPLE: Rgb = Rgb(0xBA, 0x55, 0xD3);
pub const GRAY: Rgb = Rgb(0xA9, 0xA9, 0xA9);
pub const CYAN: Rgb = Rgb(0x00, 0xCE, 0xD1);
pub const BROWN: Rgb = Rgb(0xA0, 0x52, 0x2D);
pub const GOLD: Rgb = Rgb(0xFF, 0xD7, 0x00);
pub const MAGENTA: Rgb = Rgb(0xFF, 0x99, 0xFF);
pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
pub const LIGHT_GRAY: Rgb = Rgb(0xD3, 0xD3, 0xD3);
pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
pub const STROKE: Rgb = Rgb(0x11, 0x11, 0x11);

/// Neutral fill for unknown occupation categories
pub const FALLBACK: Rgb = GRAY;
/// Cap color of regions with no matching records
pub const UNRANKED: Rgb = Rgb(0x80, 0x80, 0x80);

pub fn occupation_color(category: OccupationCategory) -> Rgb {
    match category {
        OccupationCategory::Art => PURPLE,
        OccupationCategory::Politics => BLUE,
        OccupationCategory::Sports => ORANGE,
        OccupationCategory::Science => CYAN,
        OccupationCategory::Business => BROWN,
        OccupationCategory::Social => MAGENTA,
    }
}

pub fn occupation_color_or_fallback(category: Option<OccupationCategory>) -> Rgb {
    category.map(occupation_color).unwrap_or(FALLBACK)
}

// ============================================================================
// SCALES
// ============================================================================

/// Log scale over ranks 1..100: rank 1 is green, rank 100+ is white.
pub fn rank_color(rank: usize) -> Rgb {
    let rank = rank.max(1) as f64;
    GREEN.lerp(WHITE, rank.ln() / 100f64.ln())
}

/// Linear scale over shares 1..100 (%): white to green.
pub fn share_color(percent: f64) -> Rgb {
    WHITE.lerp(GREEN, (percent - 1.0) / 99.0)
}

/// Linear scale over ages 1..120: white to red.
pub fn age_color(age: f64) -> Rgb {
    WHITE.lerp(RED, (age - 1.0) / 119.0)
}
