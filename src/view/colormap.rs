//! Diverging blue-white-red colour map with a two-slope norm centred at 0.

use plotters::style::RGBColor;

/// Maps a value range onto `[0, 1]` with zero pinned to `0.5`.
///
/// Negative values scale by `vmin`, positive ones by `vmax`, so both
/// halves of the map are used even when the range is lopsided. A range
/// that never crosses zero only uses one half. A degenerate range
/// (`vmin == vmax`) maps everything to `0.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoSlopeNorm {
    vmin: f32,
    vmax: f32,
}

impl TwoSlopeNorm {
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self { vmin, vmax }
    }

    pub fn is_flat(&self) -> bool {
        self.vmin == self.vmax
    }

    pub fn apply(&self, value: f32) -> f32 {
        if self.is_flat() {
            return 0.0;
        }
        let t = if value < 0.0 {
            if self.vmin < 0.0 {
                0.5 * (value - self.vmin) / -self.vmin
            } else {
                0.5
            }
        } else if self.vmax > 0.0 {
            0.5 + 0.5 * value / self.vmax
        } else {
            0.5
        };
        t.clamp(0.0, 1.0)
    }
}

/// `bwr`: blue at 0, white at 0.5, red at 1.
pub fn bwr(t: f32) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: f32| (x * 255.0).round() as u8;
    if t <= 0.5 {
        let s = t * 2.0;
        RGBColor(channel(s), channel(s), 255)
    } else {
        let s = (1.0 - t) * 2.0;
        RGBColor(255, channel(s), channel(s))
    }
}
