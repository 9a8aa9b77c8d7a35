use beatline_model::ChartError;
use thiserror::Error;

use crate::engine::GameState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("Chart is not prepared (no base BPM); call Chart::prepare first")]
    UnpreparedChart,

    #[error("Engine cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: GameState,
    },

    #[error("Lane {0} out of range")]
    LaneOutOfRange(usize),

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
}
