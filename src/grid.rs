//! Per-frame compositing plan for the interactive grid.
//!
//! The plan is plain data: a background fill, an optional base grid stroked
//! as a single path, and one gradient chord per grid line that crosses the
//! glow circle around the trailing cursor. The renderer turns it into Skia
//! calls; everything numeric is decided here.

use crate::color::Rgb;
use crate::config::GridConfig;

/// Alpha of the glow gradient at the middle of each chord.
pub const GLOW_PEAK_ALPHA: f32 = 0.6;
/// Extra stroke width of a chord whose line passes straight under the cursor.
pub const GLOW_EXTRA_WIDTH: f32 = 1.5;
/// Gradient stop offsets along a chord.
pub const GLOW_STOPS: [f32; 3] = [0.0, 0.5, 1.0];
/// Upper bound on grid lines along one axis; denser grids are not drawn.
pub const MAX_LINES_PER_AXIS: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BaseGrid {
    pub lines: Vec<Segment>,
    pub color: Rgb,
    pub alpha: f32,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowSegment {
    pub axis: Axis,
    /// The x of a vertical line or the y of a horizontal one.
    pub offset: f32,
    /// Perpendicular distance from the line to the trailing cursor.
    pub distance: f32,
    pub segment: Segment,
    pub width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub size: (f32, f32),
    pub background: Rgb,
    pub base: Option<BaseGrid>,
    pub glow_color: Rgb,
    /// Vertical chords first, then horizontal ones.
    pub glow: Vec<GlowSegment>,
}

impl FramePlan {
    pub fn glow_on(&self, axis: Axis) -> impl Iterator<Item = &GlowSegment> {
        self.glow.iter().filter(move |g| g.axis == axis)
    }

    /// Number of stroke calls the plan costs: one for the whole base grid plus one per chord.
    pub fn stroke_count(&self) -> usize {
        usize::from(self.base.is_some()) + self.glow.len()
    }
}

/// Grid line offsets covering `[0, extent]`, as multiples of `spacing`.
pub fn line_offsets(extent: f32, spacing: f32) -> impl Iterator<Item = f32> {
    let last = last_index(extent, spacing);
    (0..=last.unwrap_or(-1)).map(move |i| i as f32 * spacing)
}

fn last_index(extent: f32, spacing: f32) -> Option<i64> {
    if !(spacing.is_finite() && spacing > 0.0 && extent.is_finite() && extent >= 0.0) {
        return None;
    }
    let last = (extent / spacing).floor();
    if last >= MAX_LINES_PER_AXIS as f32 {
        return None;
    }
    Some(last as i64)
}

/// Half length of the chord a line at `distance` cuts from the glow circle.
pub fn chord_half_length(distance: f32, glow_radius: f32) -> Option<f32> {
    if distance < glow_radius {
        Some((glow_radius * glow_radius - distance * distance).sqrt())
    } else {
        None
    }
}

/// Stroke width of a chord: thickest under the cursor, base width at the rim.
pub fn glow_width(line_width: f32, distance: f32, glow_radius: f32) -> f32 {
    let proximity = 1.0 - distance / glow_radius;
    line_width + GLOW_EXTRA_WIDTH * proximity
}

/// Index range of grid lines inside `[center - radius, center + radius]`,
/// snapped outward to whole cells.
pub fn influence_range(center: f32, radius: f32, spacing: f32) -> (i64, i64) {
    let start = ((center - radius) / spacing).floor() as i64;
    let end = ((center + radius) / spacing).ceil() as i64;
    (start, end)
}

pub fn plan_frame(config: &GridConfig, size: (f32, f32), cursor: (f32, f32)) -> FramePlan {
    let (width, height) = size;

    let base = (config.base_opacity > 0.0).then(|| BaseGrid {
        lines: base_lines(width, height, config.spacing),
        color: config.line_color,
        alpha: config.base_opacity,
        width: config.line_width,
    });

    let mut glow = Vec::new();
    glow_pass(config, Axis::Vertical, width, cursor, &mut glow);
    glow_pass(config, Axis::Horizontal, height, cursor, &mut glow);

    tracing::trace!(
        base_lines = base.as_ref().map_or(0, |b| b.lines.len()),
        glow = glow.len(),
        "planned frame"
    );

    FramePlan {
        size,
        background: config.background_color,
        base,
        glow_color: config.line_color,
        glow,
    }
}

fn base_lines(width: f32, height: f32, spacing: f32) -> Vec<Segment> {
    let vertical = line_offsets(width, spacing).map(|x| Segment {
        from: (x, 0.0),
        to: (x, height),
    });
    let horizontal = line_offsets(height, spacing).map(|y| Segment {
        from: (0.0, y),
        to: (width, y),
    });
    vertical.chain(horizontal).collect()
}

fn glow_pass(
    config: &GridConfig,
    axis: Axis,
    extent: f32,
    cursor: (f32, f32),
    out: &mut Vec<GlowSegment>,
) {
    let radius = config.glow_radius;
    let spacing = config.spacing;
    let (along, across) = match axis {
        Axis::Vertical => (cursor.0, cursor.1),
        Axis::Horizontal => (cursor.1, cursor.0),
    };
    if !(radius.is_finite() && radius > 0.0 && along.is_finite() && across.is_finite()) {
        return;
    }
    let Some(last) = last_index(extent, spacing) else {
        return;
    };

    let (start, end) = influence_range(along, radius, spacing);
    for i in start.max(0)..=end.min(last) {
        let offset = i as f32 * spacing;
        if offset < 0.0 || offset > extent {
            continue;
        }
        let distance = (offset - along).abs();
        let Some(half) = chord_half_length(distance, radius) else {
            continue;
        };
        let segment = match axis {
            Axis::Vertical => Segment {
                from: (offset, across - half),
                to: (offset, across + half),
            },
            Axis::Horizontal => Segment {
                from: (across - half, offset),
                to: (across + half, offset),
            },
        };
        out.push(GlowSegment {
            axis,
            offset,
            distance,
            segment,
            width: glow_width(config.line_width, distance, radius),
        });
    }
}
