// Draw commands and scroll-space to screen mapping

use crate::note_pool::VisualHandle;

/// Guide-line length steps, indexed by the configured guide-line index.
const GUIDE_LINE_STEPS: [f64; 4] = [0.0, 2.0, 4.0, 6.0];
const GUIDE_LINE_UNIT: f64 = 24.0;

/// Topmost y at which a note is still drawn.
pub const NOTE_VISIBLE_MIN: f64 = -100.0;
/// Margin below the hit position where notes stay visible.
pub const NOTE_VISIBLE_MARGIN: f64 = 25.0;
/// Margin below the hit position where timing lines stay visible.
pub const LINE_VISIBLE_MARGIN: f64 = 10.0;

/// Per-frame values every renderer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub track_position: f64,
    pub notespeed: f64,
    pub hit_position: f64,
    pub guide_line_length: f64,
    pub image_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailDirection {
    Up,
    Down,
}

/// One region of the lane cover overlay, in normalized lane height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverSegment {
    pub from: f64,
    pub to: f64,
    /// Opacity at `from` and at `to`.
    pub alpha: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Head {
        lane: usize,
        visual: VisualHandle,
        x: f64,
        y: f64,
        frame: u32,
    },
    Body {
        lane: usize,
        visual: VisualHandle,
        x: f64,
        top: f64,
        bottom: f64,
        tint: f32,
        frame: u32,
    },
    Trail {
        lane: usize,
        visual: VisualHandle,
        x: f64,
        y: f64,
        length: f64,
        direction: TrailDirection,
    },
    TimingLine {
        y: f64,
    },
    LaneCover {
        segments: Vec<CoverSegment>,
    },
}

pub fn guide_line_length(index: usize) -> f64 {
    GUIDE_LINE_STEPS
        .get(index)
        .map_or(0.0, |step| GUIDE_LINE_UNIT * step)
}

/// Fraction of the way from the top of the lane to the hit position for an
/// object at `initial` when the track sits at `track_position`.
pub fn scroll_alpha(track_position: f64, initial: f64, notespeed: f64) -> f64 {
    (1000.0 + (track_position - initial) * notespeed / 100.0) / 1000.0
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Screen y of an object at scroll position `initial`.
pub fn note_y(track_position: f64, initial: f64, notespeed: f64, hit_position: f64) -> f64 {
    lerp(0.0, hit_position, scroll_alpha(track_position, initial, notespeed))
}

pub fn is_note_visible(y: f64, hit_position: f64) -> bool {
    (NOTE_VISIBLE_MIN..=hit_position + NOTE_VISIBLE_MARGIN).contains(&y)
}

/// The span `top..=bottom` crosses the visible note range.
pub fn span_is_visible(top: f64, bottom: f64, hit_position: f64) -> bool {
    top <= hit_position + NOTE_VISIBLE_MARGIN && bottom >= NOTE_VISIBLE_MIN
}
