//! Ambient price ticker drawn over the grid.
//!
//! Pure geometry lives here; text measurement and drawing are done by the
//! renderer, which owns the fonts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Copies of the item list laid end to end so the band never runs dry.
pub const TICKER_REPEAT: usize = 4;
pub const TICKER_HEIGHT: f32 = 40.0;
pub const ENTRY_GAP: f32 = 64.0;
pub const FONT_SIZE: f32 = 12.8;
/// Width of the soft fade at each horizontal edge, as a fraction of the band.
pub const EDGE_FADE: f32 = 0.05;

const TEXT: Rgb = Rgb::new(255, 255, 255);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerItem {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub pct_change: String,
}

impl TickerItem {
    pub fn new(symbol: &str, price: &str, change: &str, pct_change: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: price.to_string(),
            change: change.to_string(),
            pct_change: pct_change.to_string(),
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::of(&self.change)
    }

    /// Spans of one entry, left to right: `@ SYMBOL price change (pct)`.
    pub fn segments(&self) -> [TickerSegment; 5] {
        [
            TickerSegment::new("@".to_string(), TEXT, 0.2, 1.0),
            TickerSegment::new(self.symbol.clone(), TEXT, 0.8, 1.0),
            TickerSegment::new(self.price.clone(), TEXT, 0.7, 1.0),
            TickerSegment::new(self.change.clone(), self.sentiment().color(), 0.8, 1.0),
            TickerSegment::new(format!("({})", self.pct_change), TEXT, 0.7 * 0.4, 0.8),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickerSegment {
    pub text: String,
    pub color: Rgb,
    pub alpha: f32,
    /// Font size relative to `FONT_SIZE`.
    pub scale: f32,
}

impl TickerSegment {
    fn new(text: String, color: Rgb, alpha: f32, scale: f32) -> Self {
        Self {
            text,
            color,
            alpha,
            scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentiment {
    Up,
    Down,
    Flat,
}

impl Sentiment {
    pub fn of(change: &str) -> Self {
        match change.trim_start().chars().next() {
            Some('+') => Sentiment::Up,
            Some('-') => Sentiment::Down,
            _ => Sentiment::Flat,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Sentiment::Up => Rgb::new(0x86, 0xef, 0xac),
            Sentiment::Down => Rgb::new(0xfc, 0xa5, 0xa5),
            Sentiment::Flat => Rgb::new(0xe5, 0xe5, 0xe5),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ticker {
    items: Vec<TickerItem>,
    speed_secs: f32,
}

impl Ticker {
    pub fn new(items: Vec<TickerItem>, speed_secs: f32) -> Self {
        Self { items, speed_secs }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in display order, the configured list repeated `TICKER_REPEAT` times.
    pub fn display_items(&self) -> impl Iterator<Item = &TickerItem> {
        std::iter::repeat_n(self.items.iter(), TICKER_REPEAT).flatten()
    }

    /// Horizontal translation of the track at `elapsed`.
    ///
    /// Moves left linearly from 0 to half the track width once every
    /// `speed_secs`, then wraps.
    pub fn scroll_offset(&self, elapsed: Duration, track_width: f32) -> f32 {
        if !(self.speed_secs.is_finite() && self.speed_secs > 0.0) || track_width <= 0.0 {
            return 0.0;
        }
        let progress = (elapsed.as_secs_f64() / self.speed_secs as f64).fract() as f32;
        -progress * track_width / 2.0
    }
}

/// Gradient stops of the edge mask: transparent at both ends, opaque inside.
pub fn edge_mask_stops() -> ([f32; 4], [f32; 4]) {
    ([0.0, EDGE_FADE, 1.0 - EDGE_FADE, 1.0], [0.0, 1.0, 1.0, 0.0])
}

pub fn default_items() -> Vec<TickerItem> {
    vec![
        TickerItem::new("PEWDS", "$0.0094", "+0.82", "+9.5%"),
        TickerItem::new("BEAST", "$0.0106", "+1.20", "+12.8%"),
        TickerItem::new("MARK", "$0.0072", "-0.10", "-1.4%"),
        TickerItem::new("JACK", "$0.0064", "+0.45", "+7.5%"),
        TickerItem::new("VERIT", "$0.0047", "+0.12", "+2.6%"),
        TickerItem::new("WEEKND", "$0.0080", "+2.10", "+35.4%"),
        TickerItem::new("TSERIES", "$0.0102", "-0.05", "-0.5%"),
        TickerItem::new("ASMR", "$0.0031", "+0.08", "+2.6%"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_follows_sign_of_change() {
        assert_eq!(Sentiment::of("+0.82"), Sentiment::Up);
        assert_eq!(Sentiment::of("-0.10"), Sentiment::Down);
        assert_eq!(Sentiment::of("0.00"), Sentiment::Flat);
        assert_eq!(Sentiment::of(""), Sentiment::Flat);
        assert_eq!(Sentiment::Up.color(), Rgb::new(0x86, 0xef, 0xac));
    }

    #[test]
    fn display_list_repeats_items() {
        let ticker = Ticker::new(default_items(), 60.0);
        let symbols: Vec<_> = ticker.display_items().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols.len(), 8 * TICKER_REPEAT);
        assert_eq!(symbols[0], "PEWDS");
        assert_eq!(symbols[8], "PEWDS");
        assert_eq!(symbols[31], "ASMR");
    }

    #[test]
    fn scroll_offset_wraps_every_cycle() {
        let ticker = Ticker::new(default_items(), 60.0);
        assert_eq!(ticker.scroll_offset(Duration::ZERO, 1000.0), 0.0);
        let quarter = ticker.scroll_offset(Duration::from_secs(15), 1000.0);
        assert!((quarter + 125.0).abs() < 1e-3);
        let wrapped = ticker.scroll_offset(Duration::from_secs(75), 1000.0);
        assert!((wrapped - quarter).abs() < 1e-3);
    }

    #[test]
    fn scroll_offset_stays_put_for_bad_speed() {
        let ticker = Ticker::new(default_items(), 0.0);
        assert_eq!(ticker.scroll_offset(Duration::from_secs(3), 1000.0), 0.0);
    }

    #[test]
    fn segments_render_entry_text() {
        let item = TickerItem::new("MARK", "$0.0072", "-0.10", "-1.4%");
        let texts: Vec<_> = item.segments().iter().map(|s| s.text.clone()).collect();
        assert_eq!(texts, ["@", "MARK", "$0.0072", "-0.10", "(-1.4%)"]);
        assert_eq!(item.segments()[3].color, Sentiment::Down.color());
    }

    #[test]
    fn edge_mask_is_symmetric() {
        let (pos, alpha) = edge_mask_stops();
        assert_eq!(pos[1], EDGE_FADE);
        assert_eq!(pos[2], 1.0 - EDGE_FADE);
        assert_eq!(alpha, [0.0, 1.0, 1.0, 0.0]);
    }
}
