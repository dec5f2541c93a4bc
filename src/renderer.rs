use std::sync::OnceLock;

use skia_safe::{
    AlphaType, BlendMode, Canvas, Color, ColorType, Font, FontMgr, FontStyle, ImageInfo, Paint,
    PaintCap, PaintStyle, PathBuilder, Point, Rect, Shader, Surface, TileMode, Typeface,
    gpu::{self, SurfaceOrigin, backend_render_targets, gl::FramebufferInfo},
    surfaces,
};

use crate::error::{GridError, Result};
use crate::grid::{BaseGrid, FramePlan, GLOW_PEAK_ALPHA, GLOW_STOPS, GlowSegment};
use crate::scene::{Frame, TickerFrame};
use crate::ticker::{ENTRY_GAP, FONT_SIZE, TICKER_HEIGHT, Ticker, TickerSegment, edge_mask_stops};

fn create_skia_surface(
    dimensions: (i32, i32),
    fb_info: FramebufferInfo,
    gr_context: &mut skia_safe::gpu::DirectContext,
    num_samples: usize,
    stencil_size: usize,
) -> Result<Surface> {
    let backend_render_target =
        backend_render_targets::make_gl(dimensions, num_samples, stencil_size, fb_info);

    gpu::surfaces::wrap_backend_render_target(
        gr_context,
        &backend_render_target,
        SurfaceOrigin::BottomLeft,
        ColorType::RGBA8888,
        None,
        None,
    )
    .ok_or_else(|| {
        GridError::SurfaceUnavailable(format!(
            "could not wrap GL render target of {}x{}",
            dimensions.0, dimensions.1
        ))
    })
}

/// CPU-backed surface, used by the headless backend and tests.
pub fn create_raster_surface(dimensions: (u32, u32)) -> Result<Surface> {
    let (width, height) = (dimensions.0.max(1), dimensions.1.max(1));
    let image_info = ImageInfo::new(
        (width as i32, height as i32),
        ColorType::BGRA8888,
        AlphaType::Premul,
        None,
    );
    surfaces::raster(&image_info, None, None).ok_or_else(|| {
        GridError::SurfaceUnavailable(format!("could not allocate {width}x{height} raster"))
    })
}

#[derive(Clone, Copy)]
pub enum SurfaceSource {
    Gl {
        fb_info: FramebufferInfo,
        num_samples: usize,
        stencil_size: usize,
    },
    Raster,
}

/// A ticker run laid out once, in track coordinates.
struct TickerRun {
    x: f32,
    text: String,
    color: Color,
    font_size: f32,
}

struct TickerLayout {
    runs: Vec<TickerRun>,
    track_width: f32,
}

pub struct Renderer {
    surface: Surface,
    gr_context: Option<skia_safe::gpu::DirectContext>,
    source: SurfaceSource,
    scale_factor: f32,
    ticker: Option<Ticker>,
    ticker_layout: Option<TickerLayout>,
}

impl Renderer {
    pub fn new(
        dimensions: (u32, u32),
        fb_info: FramebufferInfo,
        gr_context: skia_safe::gpu::DirectContext,
        num_samples: usize,
        stencil_size: usize,
    ) -> Result<Self> {
        let mut gr_context = gr_context;
        let surface = create_skia_surface(
            (dimensions.0 as i32, dimensions.1 as i32),
            fb_info,
            &mut gr_context,
            num_samples,
            stencil_size,
        )?;

        Ok(Self {
            surface,
            gr_context: Some(gr_context),
            source: SurfaceSource::Gl {
                fb_info,
                num_samples,
                stencil_size,
            },
            scale_factor: 1.0,
            ticker: None,
            ticker_layout: None,
        })
    }

    pub fn from_surface(
        surface: Surface,
        gr_context: Option<skia_safe::gpu::DirectContext>,
    ) -> Self {
        Self {
            surface,
            gr_context,
            source: SurfaceSource::Raster,
            scale_factor: 1.0,
            ticker: None,
            ticker_layout: None,
        }
    }

    pub fn raster(dimensions: (u32, u32)) -> Result<Self> {
        Ok(Self::from_surface(create_raster_surface(dimensions)?, None))
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor.max(0.1);
    }

    pub fn set_ticker(&mut self, ticker: Option<Ticker>) {
        self.ticker_layout = ticker.as_ref().and_then(layout_ticker);
        if ticker.is_some() && self.ticker_layout.is_none() {
            tracing::warn!("no usable font for the ticker, overlay disabled");
        }
        self.ticker = ticker;
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }

    pub fn draw(&mut self, frame: &Frame) {
        let canvas = self.surface.canvas();
        canvas.clear(frame.plan.background.opaque());

        canvas.save();
        if (self.scale_factor - 1.0).abs() > f32::EPSILON {
            canvas.scale((self.scale_factor, self.scale_factor));
        }

        if let Some(base) = frame.plan.base.as_ref() {
            draw_base_grid(canvas, base);
        }
        draw_glow(canvas, &frame.plan);

        if let (Some(ticker), Some(layout), Some(ticker_frame)) = (
            self.ticker.as_ref(),
            self.ticker_layout.as_ref(),
            frame.ticker.as_ref(),
        ) {
            draw_ticker(canvas, ticker, layout, ticker_frame, frame.plan.size.0);
        }

        canvas.restore();

        if let Some(gr) = self.gr_context.as_mut() {
            gr.flush_and_submit();
        }
    }

    /// Recreates the surface at the new size; prior content is not kept.
    pub fn resize(&mut self, dimensions: (u32, u32)) -> Result<()> {
        match self.source {
            SurfaceSource::Gl {
                fb_info,
                num_samples,
                stencil_size,
            } => {
                if let Some(context) = self.gr_context.as_mut() {
                    self.surface = create_skia_surface(
                        (dimensions.0 as i32, dimensions.1 as i32),
                        fb_info,
                        context,
                        num_samples,
                        stencil_size,
                    )?;
                }
            }
            SurfaceSource::Raster => {
                self.surface = create_raster_surface(dimensions)?;
            }
        }
        Ok(())
    }
}

fn draw_base_grid(canvas: &Canvas, base: &BaseGrid) {
    if base.lines.is_empty() {
        return;
    }
    let mut builder = PathBuilder::new();
    for line in &base.lines {
        builder
            .move_to(Point::new(line.from.0, line.from.1))
            .line_to(Point::new(line.to.0, line.to.1));
    }
    let path = builder.detach();

    let mut paint = Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(PaintStyle::Stroke);
    paint.set_stroke_width(base.width);
    paint.set_stroke_cap(PaintCap::Butt);
    paint.set_color(base.color.with_alpha(base.alpha));
    canvas.draw_path(&path, &paint);
}

fn draw_glow(canvas: &Canvas, plan: &FramePlan) {
    let colors = [
        plan.glow_color.with_alpha(0.0),
        plan.glow_color.with_alpha(GLOW_PEAK_ALPHA),
        plan.glow_color.with_alpha(0.0),
    ];
    for glow in &plan.glow {
        draw_glow_segment(canvas, glow, &colors);
    }
}

fn draw_glow_segment(canvas: &Canvas, glow: &GlowSegment, colors: &[Color; 3]) {
    let from = Point::new(glow.segment.from.0, glow.segment.from.1);
    let to = Point::new(glow.segment.to.0, glow.segment.to.1);

    let mut paint = Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(PaintStyle::Stroke);
    paint.set_stroke_width(glow.width);
    paint.set_stroke_cap(PaintCap::Round);
    match Shader::linear_gradient(
        (from, to),
        colors.as_slice(),
        GLOW_STOPS.as_slice(),
        TileMode::Clamp,
        None,
        None,
    ) {
        Some(shader) => {
            paint.set_shader(shader);
            paint.set_color(Color::WHITE);
        }
        // Zero-length chords at the rim have nothing to show.
        None => return,
    }
    canvas.draw_line(from, to, &paint);
}

fn draw_ticker(
    canvas: &Canvas,
    ticker: &Ticker,
    layout: &TickerLayout,
    frame: &TickerFrame,
    band_width: f32,
) {
    if frame.opacity <= 0.0 || band_width <= 0.0 {
        return;
    }
    let Some(typeface) = default_typeface() else {
        return;
    };
    let band = Rect::from_xywh(0.0, 0.0, band_width, TICKER_HEIGHT);
    let offset = ticker.scroll_offset(frame.elapsed, layout.track_width);

    canvas.save_layer_alpha_f(band, frame.opacity);
    canvas.clip_rect(band, None, None);

    for run in &layout.runs {
        let x = run.x + offset;
        if x > band_width {
            break;
        }
        let font = Font::new(typeface.clone(), run.font_size);
        let mut paint = Paint::default();
        paint.set_anti_alias(true);
        paint.set_color(run.color);
        let metrics = font.metrics().1;
        let baseline = TICKER_HEIGHT / 2.0 - (metrics.ascent + metrics.descent) / 2.0;
        canvas.draw_str(&run.text, (x, baseline), &font, &paint);
    }

    let (positions, alphas) = edge_mask_stops();
    let mask_colors = alphas.map(|a| Color::from_argb((a * 255.0) as u8, 0, 0, 0));
    if let Some(mask) = Shader::linear_gradient(
        (Point::new(0.0, 0.0), Point::new(band_width, 0.0)),
        mask_colors.as_slice(),
        positions.as_slice(),
        TileMode::Clamp,
        None,
        None,
    ) {
        let mut paint = Paint::default();
        paint.set_shader(mask);
        paint.set_blend_mode(BlendMode::DstIn);
        canvas.draw_rect(band, &paint);
    }

    canvas.restore();
}

fn layout_ticker(ticker: &Ticker) -> Option<TickerLayout> {
    if ticker.is_empty() {
        return None;
    }
    let typeface = default_typeface()?;
    Some(layout_runs(ticker, |text, font_size| {
        Font::new(typeface.clone(), font_size)
            .measure_str(text, None)
            .0
    }))
}

/// Places every segment of the repeated item list along the track.
/// `measure` returns the advance width of `text` at a font size.
fn layout_runs(ticker: &Ticker, measure: impl Fn(&str, f32) -> f32) -> TickerLayout {
    let margin = FONT_SIZE * 0.5;

    let mut runs = Vec::new();
    let mut x = 0.0;
    for item in ticker.display_items() {
        let segments = item.segments();
        let last = segments.len() - 1;
        for (index, segment) in segments.into_iter().enumerate() {
            let TickerSegment {
                text,
                color,
                alpha,
                scale,
            } = segment;
            let font_size = FONT_SIZE * scale;
            let width = measure(&text, font_size);
            runs.push(TickerRun {
                x,
                text,
                color: color.with_alpha(alpha),
                font_size,
            });
            x += width;
            if index != last {
                x += margin;
            }
        }
        x += ENTRY_GAP;
    }

    TickerLayout {
        runs,
        track_width: x,
    }
}

fn default_typeface() -> Option<Typeface> {
    static DEFAULT_TYPEFACE: OnceLock<Option<Typeface>> = OnceLock::new();
    DEFAULT_TYPEFACE
        .get_or_init(|| {
            let fm = FontMgr::new();
            fm.match_family_style("Inter", FontStyle::normal())
                .or_else(|| fm.match_family_style("DejaVu Sans", FontStyle::normal()))
                .or_else(|| fm.match_family_style("Sans", FontStyle::normal()))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::color::Rgb;
    use crate::config::GridConfig;
    use crate::scene::Scene;
    use crate::ticker::default_items;

    fn pixel(renderer: &mut Renderer, x: i32, y: i32) -> Color {
        let mut pixels = [0u8; 4];
        let info = ImageInfo::new((1, 1), ColorType::RGBA8888, AlphaType::Unpremul, None);
        assert!(renderer
            .surface_mut()
            .read_pixels(&info, &mut pixels, 4, (x, y)));
        Color::from_argb(pixels[3], pixels[0], pixels[1], pixels[2])
    }

    #[test]
    fn background_fills_the_whole_surface() {
        let mut renderer = Renderer::raster((64, 48)).expect("raster surface");
        let config = GridConfig {
            background_color: Rgb::new(10, 20, 30),
            ..GridConfig::landing()
        };
        let mut scene = Scene::new(config, (64.0, 48.0));
        renderer.draw(&scene.tick(Duration::ZERO));

        for (x, y) in [(0, 0), (63, 47), (32, 24)] {
            let c = pixel(&mut renderer, x, y);
            assert_eq!((c.r(), c.g(), c.b()), (10, 20, 30));
        }
    }

    #[test]
    fn glow_brightens_line_under_cursor() {
        let mut renderer = Renderer::raster((320, 240)).expect("raster surface");
        let mut scene = Scene::new(GridConfig::landing(), (320.0, 240.0));
        scene.handle_input(
            &crate::input::InputEvent::CursorPos { x: 160.0, y: 120.0 },
            Duration::ZERO,
        );
        let frame = (0..300)
            .map(|_| scene.tick(Duration::ZERO))
            .last()
            .expect("frames");
        renderer.draw(&frame);

        // x = 160 is a grid line directly under the settled cursor.
        let lit = pixel(&mut renderer, 160, 120);
        let dark = pixel(&mut renderer, 120, 20);
        assert!(lit.r() > dark.r() + 40);
        assert_eq!((dark.r(), dark.g(), dark.b()), (10, 10, 10));
    }

    #[test]
    fn resize_replaces_raster_surface() {
        let mut renderer = Renderer::raster((64, 48)).expect("raster surface");
        renderer.resize((100, 30)).expect("resize");
        assert_eq!(renderer.dimensions(), (100, 30));
    }

    /// Fixed-pitch stand-in: every char is half the font size wide.
    fn monospace(text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }

    #[test]
    fn ticker_layout_spans_all_repeats() {
        let ticker = Ticker::new(default_items(), 60.0);
        let layout = layout_runs(&ticker, monospace);
        assert_eq!(layout.runs.len(), 8 * crate::ticker::TICKER_REPEAT * 5);
        assert!(layout.runs.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(layout.runs[0].x, 0.0);
        assert_eq!(layout.runs[0].font_size, FONT_SIZE);
        assert_eq!(layout.runs[4].font_size, FONT_SIZE * 0.8);
    }

    #[test]
    fn ticker_layout_spaces_segments_and_entries() {
        let item = crate::ticker::TickerItem::new("AB", "$1", "+1", "+2%");
        let ticker = Ticker::new(vec![item.clone()], 60.0);
        let layout = layout_runs(&ticker, monospace);

        let margin = FONT_SIZE * 0.5;
        let segments = item.segments();
        let entry_width: f32 = segments
            .iter()
            .map(|seg| monospace(&seg.text, FONT_SIZE * seg.scale))
            .sum::<f32>()
            + margin * (segments.len() - 1) as f32
            + ENTRY_GAP;

        let second = &layout.runs[1];
        assert!((second.x - (monospace(&segments[0].text, FONT_SIZE) + margin)).abs() < 1e-3);
        assert!((layout.runs[5].x - entry_width).abs() < 1e-3);
        let repeats = crate::ticker::TICKER_REPEAT as f32;
        assert!((layout.track_width - entry_width * repeats).abs() < 1e-2);
    }

    #[test]
    #[ignore = "needs an installed Inter, DejaVu Sans or Sans font"]
    fn ticker_layout_with_system_font() {
        let ticker = Ticker::new(default_items(), 60.0);
        let layout = layout_ticker(&ticker).expect("system font");
        assert_eq!(layout.runs.len(), 8 * crate::ticker::TICKER_REPEAT * 5);
        assert!(layout.track_width > 0.0);
    }
}
