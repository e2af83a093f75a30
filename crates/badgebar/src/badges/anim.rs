/// Fraction of the full slide covered per second while sliding in.
pub const SLIDE_IN_RATE: f64 = 0.75;
/// Fraction of the full slide covered per second while sliding out.
pub const SLIDE_OUT_RATE: f64 = 1.0;

/// Slide state of a single badge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimState {
    pub target_visible: bool,
    /// How far the badge has slid in, always within `[0, 1]`.
    pub ratio: f64,
}

impl AnimState {
    /// Move `ratio` towards the target by `dt` seconds. Returns whether it changed.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.target_visible && self.ratio < 1.0 {
            self.ratio = (self.ratio + SLIDE_IN_RATE * dt).min(1.0);
            true
        } else if !self.target_visible && self.ratio > 0.0 {
            self.ratio = (self.ratio - SLIDE_OUT_RATE * dt).max(0.0);
            true
        } else {
            false
        }
    }

    /// 0 when fully slid in, 1 when fully hidden.
    pub fn x_offset(&self) -> f64 {
        1.0 - self.ratio
    }
}
