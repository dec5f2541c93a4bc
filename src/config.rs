//! Configuration management
//!
//! `GridConfig` is the immutable settings struct handed to the renderer. The
//! TOML file layer (`AppConfig`) keeps colors as strings so that a malformed
//! value degrades to a fallback color instead of failing the whole file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::{FALLBACK_BACKGROUND, FALLBACK_LINE_COLOR, Rgb};
use crate::grid::MAX_LINES_PER_AXIS;
use crate::ticker::{TickerItem, default_items};

/// Renderer settings, fixed for the lifetime of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct GridConfig {
    pub line_color: Rgb,
    pub background_color: Rgb,
    /// Alpha of the full-length base grid; `0` disables the base pass.
    pub base_opacity: f32,
    pub line_width: f32,
    pub spacing: f32,
    pub glow_radius: f32,
    /// Accepted but not applied: base lines keep a uniform opacity either way.
    pub fade_effect: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            line_color: Rgb::new(0x00, 0xf0, 0xff),
            background_color: Rgb::new(0x11, 0x11, 0x11),
            base_opacity: 0.3,
            line_width: 1.0,
            spacing: 40.0,
            glow_radius: 300.0,
            fade_effect: false,
        }
    }
}

impl GridConfig {
    /// Preset used by the landing page: no base grid, white glow chords.
    pub fn landing() -> Self {
        Self {
            line_color: Rgb::new(0xff, 0xff, 0xff),
            background_color: Rgb::new(0x0a, 0x0a, 0x0a),
            base_opacity: 0.0,
            line_width: 0.3,
            spacing: 80.0,
            glow_radius: 120.0,
            fade_effect: true,
        }
    }

    /// Advisory checks. Nothing here is enforced; the frame planner tolerates
    /// every value, it just draws less.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let fields = [
            ("base_opacity", self.base_opacity),
            ("line_width", self.line_width),
            ("spacing", self.spacing),
            ("glow_radius", self.glow_radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                warnings.push(format!("{name} is not finite ({value})"));
            }
        }
        if self.spacing.is_finite() && self.spacing <= 0.0 {
            warnings.push(format!(
                "spacing must be positive, got {}; no grid lines will be drawn",
                self.spacing
            ));
        }
        if self.spacing.is_finite() && self.spacing > 0.0 && self.spacing < 0.01 {
            warnings.push(format!(
                "spacing {} is too dense; axes needing more than {MAX_LINES_PER_AXIS} lines are not drawn",
                self.spacing
            ));
        }
        if self.glow_radius.is_finite() && self.glow_radius <= 0.0 {
            warnings.push(format!(
                "glow_radius must be positive, got {}; no glow will be drawn",
                self.glow_radius
            ));
        }
        if self.line_width.is_finite() && self.line_width < 0.0 {
            warnings.push(format!("line_width is negative ({})", self.line_width));
        }
        if self.base_opacity.is_finite() && self.base_opacity > 1.0 {
            warnings.push(format!(
                "base_opacity {} is above 1.0 and will be clamped",
                self.base_opacity
            ));
        }
        warnings
    }
}

/// Top-level file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub grid: GridSection,
    pub ticker: TickerConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub window_title: String,
    pub width: u32,
    pub height: u32,
    pub window_resizeable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_title: String::from("grid-backdrop"),
            width: 1280,
            height: 800,
            window_resizeable: true,
        }
    }
}

/// `[grid]` section as written in the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    pub line_color: String,
    pub background_color: String,
    pub base_opacity: f32,
    pub line_width: f32,
    pub spacing: f32,
    pub glow_radius: f32,
    pub fade_effect: bool,
}

impl Default for GridSection {
    fn default() -> Self {
        let preset = GridConfig::landing();
        Self {
            line_color: preset.line_color.to_string(),
            background_color: preset.background_color.to_string(),
            base_opacity: preset.base_opacity,
            line_width: preset.line_width,
            spacing: preset.spacing,
            glow_radius: preset.glow_radius,
            fade_effect: preset.fade_effect,
        }
    }
}

impl GridSection {
    pub fn to_grid_config(&self) -> GridConfig {
        GridConfig {
            line_color: Rgb::from_hex_or(&self.line_color, FALLBACK_LINE_COLOR),
            background_color: Rgb::from_hex_or(&self.background_color, FALLBACK_BACKGROUND),
            base_opacity: self.base_opacity,
            line_width: self.line_width,
            spacing: self.spacing,
            glow_radius: self.glow_radius,
            fade_effect: self.fade_effect,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub enabled: bool,
    /// Seconds for one full scroll cycle.
    pub speed_secs: f32,
    pub items: Vec<TickerItem>,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_secs: 60.0,
            items: default_items(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Failed to parse config file")?;
        config.validate();
        Ok(config)
    }

    /// Logs advisory problems; never rejects a config.
    pub fn validate(&self) {
        for warning in self.grid.to_grid_config().warnings() {
            tracing::warn!("grid config: {warning}");
        }
        if !(self.ticker.speed_secs.is_finite() && self.ticker.speed_secs > 0.0) {
            tracing::warn!(
                speed = self.ticker.speed_secs,
                "ticker speed must be positive; ticker will not scroll"
            );
        }
    }

    /// Applies `--size WxH` style overrides.
    pub fn with_size(mut self, size: Option<(u32, u32)>) -> Self {
        if let Some((width, height)) = size {
            self.window.width = width;
            self.window.height = height;
        }
        self
    }
}
