/// Fraction of the remaining distance the trailing cursor covers per frame.
pub const TRAIL_FACTOR: f32 = 0.1;

/// Starting position for both cursors, far enough off-screen that no glow is drawn.
pub const OFFSCREEN: (f32, f32) = (-1000.0, -1000.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    pub raw: (f32, f32),
    pub trailing: (f32, f32),
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            raw: OFFSCREEN,
            trailing: OFFSCREEN,
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.raw = (x, y);
    }

    /// Advances the trailing cursor one frame toward the raw position.
    ///
    /// Not time corrected: convergence speed follows the display refresh rate.
    pub fn step(&mut self) -> (f32, f32) {
        let (rx, ry) = self.raw;
        let (tx, ty) = self.trailing;
        self.trailing = (tx + (rx - tx) * TRAIL_FACTOR, ty + (ry - ty) * TRAIL_FACTOR);
        self.trailing
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}
