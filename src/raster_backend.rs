//! Headless host: plays the animation on a CPU surface and keeps the last frame.

use std::path::{Path, PathBuf};
use std::time::Duration;

use skia_safe::{AlphaType, ColorType, ImageInfo, image::CachingHint};

use crate::config::AppConfig;
use crate::error::{GridError, Result};
use crate::input::InputEvent;
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::ticker::Ticker;

/// Simulated display refresh of the headless loop.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Clone, Debug)]
pub struct RasterOptions {
    pub size: (u32, u32),
    pub frames: u32,
    /// Pointer position delivered before the first frame, in surface pixels.
    pub cursor: Option<(f32, f32)>,
    pub output: PathBuf,
}

/// Straight-alpha RGBA pixels of one rendered frame.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| GridError::Encode("pixel buffer does not match frame size".to_string()))?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|err| GridError::Encode(format!("failed to write {}: {err}", path.display())))
    }
}

fn store_frame(renderer: &mut Renderer, size: (u32, u32)) -> Result<RasterFrame> {
    let (width, height) = size;
    let image = renderer.surface_mut().image_snapshot();
    let image_info = ImageInfo::new(
        (width as i32, height as i32),
        ColorType::RGBA8888,
        AlphaType::Unpremul,
        None,
    );
    let row_bytes = image_info.min_row_bytes();
    let mut pixels = vec![0u8; row_bytes * height as usize];
    let ok = image.read_pixels(
        &image_info,
        pixels.as_mut_slice(),
        row_bytes,
        (0, 0),
        CachingHint::Disallow,
    );
    if !ok {
        return Err(GridError::Encode("pixel readback failed".to_string()));
    }

    Ok(RasterFrame {
        width,
        height,
        data: pixels,
    })
}

/// Renders `options.frames` frames and returns the last one.
pub fn render(config: &AppConfig, options: &RasterOptions) -> Result<RasterFrame> {
    let (width, height) = (options.size.0.max(1), options.size.1.max(1));
    let mut renderer = Renderer::raster((width, height))?;

    let mut scene = Scene::new(config.grid.to_grid_config(), (width as f32, height as f32))
        .with_ticker(config.ticker.enabled);
    if config.ticker.enabled {
        renderer.set_ticker(Some(Ticker::new(
            config.ticker.items.clone(),
            config.ticker.speed_secs,
        )));
    }
    if let Some((x, y)) = options.cursor {
        scene.handle_input(&InputEvent::CursorPos { x, y }, Duration::ZERO);
    }

    for i in 0..options.frames.max(1) {
        let frame = scene.tick(FRAME_INTERVAL * i);
        renderer.draw(&frame);
    }
    tracing::debug!(frames = scene.frames(), "raster animation finished");

    store_frame(&mut renderer, (width, height))
}

pub fn run(config: &AppConfig, options: &RasterOptions) -> Result<()> {
    let frame = render(config, options)?;
    frame.save_png(&options.output)?;
    tracing::info!(
        path = %options.output.display(),
        width = frame.width,
        height = frame.height,
        "wrote raster snapshot"
    );
    Ok(())
}
