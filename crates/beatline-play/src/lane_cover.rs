// Hidden / Flashlight overlays as gradient segments over the lane area

use crate::render::{CoverSegment, DrawCommand};

const OPAQUE: f64 = 1.0;
const CLEAR: f64 = 0.0;

const fn segment(from: f64, to: f64, top: f64, bottom: f64) -> CoverSegment {
    CoverSegment {
        from,
        to,
        alpha: (top, bottom),
    }
}

/// Flashlight: only a band around the middle of the lane is visible.
const FLASHLIGHT: [CoverSegment; 5] = [
    segment(0.00, 0.20, OPAQUE, OPAQUE),
    segment(0.33, 0.38, OPAQUE, CLEAR),
    segment(0.38, 0.61, CLEAR, CLEAR),
    segment(0.61, 0.67, CLEAR, OPAQUE),
    segment(0.67, 1.00, OPAQUE, OPAQUE),
];

/// Hidden: notes vanish in the lower half, before the hit line.
const HIDDEN: [CoverSegment; 3] = [
    segment(0.00, 0.45, CLEAR, CLEAR),
    segment(0.45, 0.50, CLEAR, OPAQUE),
    segment(0.50, 1.00, OPAQUE, OPAQUE),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCover {
    Hidden,
    Flashlight,
}

impl LaneCover {
    /// Flashlight takes precedence when both are enabled.
    pub fn from_mods(hidden: bool, flashlight: bool) -> Option<Self> {
        match (hidden, flashlight) {
            (_, true) => Some(Self::Flashlight),
            (true, false) => Some(Self::Hidden),
            (false, false) => None,
        }
    }

    pub fn segments(self) -> &'static [CoverSegment] {
        match self {
            Self::Hidden => &HIDDEN,
            Self::Flashlight => &FLASHLIGHT,
        }
    }

    /// Cover opacity at normalized lane height `y` (0 at the top, 1 at the hit
    /// line). Gaps between segments are clear.
    pub fn alpha_at(self, y: f64) -> f64 {
        self.segments()
            .iter()
            .find(|s| (s.from..=s.to).contains(&y))
            .map_or(CLEAR, |s| {
                let span = s.to - s.from;
                if span <= 0.0 {
                    s.alpha.0
                } else {
                    let t = (y - s.from) / span;
                    s.alpha.0 + (s.alpha.1 - s.alpha.0) * t
                }
            })
    }

    pub fn draw_command(self) -> DrawCommand {
        DrawCommand::LaneCover {
            segments: self.segments().to_vec(),
        }
    }
}
