use skia_safe::Color;

/// Line color used when the configured one cannot be parsed.
pub const FALLBACK_LINE_COLOR: Rgb = Rgb::new(0, 240, 255);
/// Background used when the configured one cannot be parsed.
pub const FALLBACK_BACKGROUND: Rgb = Rgb::new(0, 0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`, with or without the leading `#`.
    ///
    /// The short form is an extension: the landing page only understood six
    /// digits, so `#abc` fell back to the default color there while it reads
    /// as `#aabbcc` here.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let expand = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v * 17);
                Some(Self::new(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }

    pub fn from_hex_or(hex: &str, fallback: Rgb) -> Self {
        match Self::from_hex(hex) {
            Some(rgb) => rgb,
            None => {
                tracing::warn!(
                    color = hex,
                    fallback = %fallback,
                    "unparseable color, using fallback"
                );
                fallback
            }
        }
    }

    /// Skia color with `alpha` in `[0, 1]`; out of range values are clamped.
    pub fn with_alpha(self, alpha: f32) -> Color {
        let a = if alpha.is_finite() {
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            0
        };
        Color::from_argb(a, self.r, self.g, self.b)
    }

    pub fn opaque(self) -> Color {
        Color::from_rgb(self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
