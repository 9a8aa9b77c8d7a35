use serde::{Deserialize, Serialize};

/// Beats per measure when a chart does not say otherwise.
pub const DEFAULT_TIME_SIGNATURE: f64 = 4.0;

/// Kind of a timing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimingType {
    /// Tempo change.
    #[default]
    Bpm,
    /// Scroll-velocity multiplier change.
    Sv,
}

/// A tempo or scroll-velocity change point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TimingInfo {
    /// Milliseconds from chart start.
    pub start_time: f64,
    /// BPM for tempo points, multiplier for SV points.
    pub value: f64,
    /// Beat number at `start_time`. Filled in during chart preparation.
    pub beat: f64,
    pub time_signature: f64,
    pub timing_type: TimingType,
}

impl Default for TimingInfo {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            value: 0.0,
            beat: 0.0,
            time_signature: DEFAULT_TIME_SIGNATURE,
            timing_type: TimingType::Bpm,
        }
    }
}

impl TimingInfo {
    pub fn bpm(start_time: f64, value: f64) -> Self {
        Self {
            start_time,
            value,
            ..Default::default()
        }
    }

    pub fn sv(start_time: f64, value: f64) -> Self {
        Self {
            start_time,
            value,
            timing_type: TimingType::Sv,
            ..Default::default()
        }
    }

    /// Beat reached at `offset` when this tempo holds from `start_time`.
    ///
    /// SV points carry no beat information and always return 0.
    pub fn calculate_beat(&self, offset: f64) -> f64 {
        match self.timing_type {
            TimingType::Sv => 0.0,
            TimingType::Bpm => self.beat + (offset - self.start_time) * self.value / 60000.0,
        }
    }

    /// Length of one measure in milliseconds at this tempo.
    pub fn measure_length(&self) -> f64 {
        60000.0 / self.value * self.time_signature
    }
}
