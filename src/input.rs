use std::time::Duration;

/// Fade-in time of overlays once the latch has flipped.
pub const FADE_IN: Duration = Duration::from_secs(1);

/// Host-neutral input, already converted to logical pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    CursorPos { x: f32, y: f32 },
    CursorButton { pressed: bool },
    CursorScroll,
    ViewportReshape { width: u32, height: u32 },
}

impl InputEvent {
    /// Scroll, click and pointer movement count as user interaction.
    pub fn is_interaction(&self) -> bool {
        match self {
            InputEvent::CursorPos { .. } | InputEvent::CursorScroll => true,
            InputEvent::CursorButton { pressed, .. } => *pressed,
            InputEvent::ViewportReshape { .. } => false,
        }
    }
}

/// One-shot visibility flag flipped by the first user interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionLatch {
    revealed_at: Option<Duration>,
}

impl InteractionLatch {
    pub fn new() -> Self {
        Self { revealed_at: None }
    }

    /// Returns `true` only for the event that flips the latch.
    pub fn observe(&mut self, event: &InputEvent, now: Duration) -> bool {
        if self.revealed_at.is_some() || !event.is_interaction() {
            return false;
        }
        self.revealed_at = Some(now);
        true
    }

    pub fn is_visible(&self) -> bool {
        self.revealed_at.is_some()
    }

    /// Ease-out ramp from 0 to 1 over `FADE_IN` after the flip.
    pub fn opacity(&self, now: Duration) -> f32 {
        let Some(revealed_at) = self.revealed_at else {
            return 0.0;
        };
        let t = (now.saturating_sub(revealed_at).as_secs_f32() / FADE_IN.as_secs_f32()).min(1.0);
        1.0 - (1.0 - t) * (1.0 - t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_starts_hidden() {
        let latch = InteractionLatch::new();
        assert!(!latch.is_visible());
        assert_eq!(latch.opacity(Duration::from_secs(10)), 0.0);
    }

    #[test]
    fn first_interaction_flips_once() {
        let mut latch = InteractionLatch::new();
        let moved = InputEvent::CursorPos { x: 1.0, y: 2.0 };
        assert!(latch.observe(&moved, Duration::from_millis(200)));
        assert!(latch.is_visible());
        assert!(!latch.observe(&moved, Duration::from_millis(900)));
        assert_eq!(latch.opacity(Duration::from_millis(200)), 0.0);
        assert_eq!(latch.opacity(Duration::from_millis(1200)), 1.0);
    }

    #[test]
    fn resize_and_release_do_not_count() {
        let mut latch = InteractionLatch::new();
        let resize = InputEvent::ViewportReshape {
            width: 800,
            height: 600,
        };
        let release = InputEvent::CursorButton { pressed: false };
        assert!(!latch.observe(&resize, Duration::ZERO));
        assert!(!latch.observe(&release, Duration::ZERO));
        assert!(!latch.is_visible());

        let click = InputEvent::CursorButton { pressed: true };
        assert!(latch.observe(&click, Duration::ZERO));
    }

    #[test]
    fn scroll_counts_as_interaction() {
        assert!(InputEvent::CursorScroll.is_interaction());
    }

    #[test]
    fn fade_in_eases_out() {
        let mut latch = InteractionLatch::new();
        latch.observe(&InputEvent::CursorPos { x: 0.0, y: 0.0 }, Duration::ZERO);
        let half = latch.opacity(Duration::from_millis(500));
        assert!((half - 0.75).abs() < 1e-4);
    }
}
