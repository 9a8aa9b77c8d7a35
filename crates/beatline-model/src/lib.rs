// Chart value object: notes, tempo and scroll-velocity points, load-time passes

mod chart;
mod error;
pub mod lane_mod;
mod normalize;
mod note;
mod timing;

pub use chart::Chart;
pub use error::ChartError;
pub use lane_mod::{LaneModifier, LaneRandom, Mirror, Rearrange, apply_lane_mapping};
pub use note::{AutoSample, NoteInfo, NoteType};
pub use timing::{DEFAULT_TIME_SIGNATURE, TimingInfo, TimingType};

/// Number of playable lanes.
pub const LANE_COUNT: usize = 7;
