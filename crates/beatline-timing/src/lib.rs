// Audio-time to scroll-space mapping and tempo lookups

mod curve;
mod tempo;

pub use curve::{StaticTiming, TimingCurve, VelocityTiming};
pub use tempo::TempoMap;

/// Scroll-space units per millisecond at multiplier 1.0.
pub const TRACK_UNITS_PER_MS: f64 = 100.0;
