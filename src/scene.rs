use std::time::Duration;

use crate::config::GridConfig;
use crate::cursor::CursorState;
use crate::grid::{FramePlan, plan_frame};
use crate::input::{InputEvent, InteractionLatch};

/// Everything the renderer needs to draw one animation frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub plan: FramePlan,
    pub ticker: Option<TickerFrame>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickerFrame {
    pub elapsed: Duration,
    pub opacity: f32,
}

/// Mounted state of the grid: settings, cursor tracking and surface size.
///
/// Hosts feed input through [`Scene::handle_input`] and call
/// [`Scene::tick`] once per display refresh.
#[derive(Clone, Debug)]
pub struct Scene {
    config: GridConfig,
    cursor: CursorState,
    size: (f32, f32),
    latch: InteractionLatch,
    ticker_enabled: bool,
    frames: u64,
}

impl Scene {
    pub fn new(config: GridConfig, size: (f32, f32)) -> Self {
        for warning in config.warnings() {
            tracing::warn!("grid config: {warning}");
        }
        Self {
            config,
            cursor: CursorState::new(),
            size,
            latch: InteractionLatch::new(),
            ticker_enabled: false,
            frames: 0,
        }
    }

    pub fn with_ticker(mut self, enabled: bool) -> Self {
        self.ticker_enabled = enabled;
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    pub fn latch(&self) -> &InteractionLatch {
        &self.latch
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn handle_input(&mut self, event: &InputEvent, now: Duration) {
        match *event {
            InputEvent::CursorPos { x, y } => self.cursor.move_to(x, y),
            InputEvent::ViewportReshape { width, height } => {
                self.resize(width as f32, height as f32);
            }
            InputEvent::CursorButton { .. } | InputEvent::CursorScroll => {}
        }
        if self.latch.observe(event, now) {
            tracing::debug!(at = ?now, "first interaction, revealing overlays");
        }
    }

    /// Replaces the surface size. The next frame is planned against the new
    /// extents only.
    pub fn resize(&mut self, width: f32, height: f32) {
        if (width, height) != self.size {
            tracing::debug!(width, height, "surface resized");
        }
        self.size = (width, height);
    }

    /// Advances the trailing cursor one step and plans the frame.
    pub fn tick(&mut self, elapsed: Duration) -> Frame {
        let trailing = self.cursor.step();
        self.frames += 1;
        let plan = plan_frame(&self.config, self.size, trailing);
        let ticker = (self.ticker_enabled && self.latch.is_visible()).then(|| TickerFrame {
            elapsed,
            opacity: self.latch.opacity(elapsed),
        });
        Frame { plan, ticker }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::OFFSCREEN;
    use crate::grid::Axis;

    fn landing_scene() -> Scene {
        Scene::new(GridConfig::landing(), (1280.0, 800.0))
    }

    #[test]
    fn first_frames_have_no_glow() {
        let mut scene = landing_scene();
        let frame = scene.tick(Duration::ZERO);
        assert!(frame.plan.glow.is_empty());
        assert!(frame.plan.base.is_none());
        assert_eq!(scene.cursor().raw, OFFSCREEN);
    }

    #[test]
    fn pointer_moves_pull_the_glow_in() {
        let mut scene = landing_scene();
        scene.handle_input(&InputEvent::CursorPos { x: 400.0, y: 300.0 }, Duration::ZERO);
        let frame = (0..200u64)
            .map(|i| scene.tick(Duration::from_millis(16 * i)))
            .last()
            .expect("frames");
        let (tx, ty) = scene.cursor().trailing;
        assert!((tx - 400.0).abs() < 0.01 && (ty - 300.0).abs() < 0.01);
        let verticals: Vec<_> = frame.plan.glow_on(Axis::Vertical).map(|g| g.offset).collect();
        assert_eq!(verticals, vec![320.0, 400.0, 480.0]);
        assert_eq!(scene.frames(), 200);
    }

    #[test]
    fn resize_event_changes_next_frame_extents() {
        let mut scene = Scene::new(GridConfig::default(), (1280.0, 800.0));
        scene.handle_input(
            &InputEvent::ViewportReshape {
                width: 200,
                height: 120,
            },
            Duration::ZERO,
        );
        let frame = scene.tick(Duration::ZERO);
        assert_eq!(frame.plan.size, (200.0, 120.0));
        let base = frame.plan.base.expect("base grid");
        assert!(base
            .lines
            .iter()
            .all(|s| s.to.0 <= 200.0 && s.to.1 <= 120.0));
        // x = 0..=200 step 40 and y = 0..=120 step 40
        assert_eq!(base.lines.len(), 6 + 4);
    }

    #[test]
    fn ticker_appears_only_after_interaction() {
        let mut scene = landing_scene().with_ticker(true);
        assert!(scene.tick(Duration::from_millis(100)).ticker.is_none());

        scene.handle_input(&InputEvent::CursorScroll, Duration::from_millis(100));
        let frame = scene.tick(Duration::from_millis(600));
        let ticker = frame.ticker.expect("ticker visible");
        assert!(ticker.opacity > 0.0 && ticker.opacity < 1.0);
        assert_eq!(ticker.elapsed, Duration::from_millis(600));
    }

    #[test]
    fn disabled_ticker_never_shows() {
        let mut scene = landing_scene();
        scene.handle_input(&InputEvent::CursorPos { x: 1.0, y: 1.0 }, Duration::ZERO);
        assert!(scene.latch().is_visible());
        assert!(scene.tick(Duration::from_secs(5)).ticker.is_none());
    }
}
