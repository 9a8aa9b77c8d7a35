use thiserror::Error;

use crate::LANE_COUNT;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("Chart has no BPM points")]
    NoBpm,

    #[error("Invalid BPM {value} at {time} ms")]
    InvalidBpm { time: f64, value: f64 },

    #[error("Non-finite time on note {index}")]
    InvalidNoteTime { index: usize },

    #[error("Note at {time} ms uses lane {lane}, expected 0..{}", LANE_COUNT)]
    LaneOutOfRange { lane: usize, time: f64 },

    #[error("Hold note at {start} ms ends at {end} ms")]
    InvalidHold { start: f64, end: f64 },

    #[error("Rearrange table {0:?} is not a permutation of 0..{}", LANE_COUNT)]
    InvalidRearrange(Vec<usize>),
}
