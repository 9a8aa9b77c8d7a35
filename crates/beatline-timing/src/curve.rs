use beatline_model::{Chart, TimingInfo};

use crate::TRACK_UNITS_PER_MS;
use crate::tempo::TempoMap;

/// Track position ignores SV entirely ("no-SV" play).
#[derive(Debug, Clone)]
pub struct StaticTiming {
    tempo: TempoMap,
}

impl StaticTiming {
    pub fn new(bpms: Vec<TimingInfo>) -> Self {
        Self {
            tempo: TempoMap::new(bpms),
        }
    }

    pub fn offset_at(&self, offset: f64) -> f64 {
        offset * TRACK_UNITS_PER_MS
    }
}

/// Track position integrates the normalized SV multipliers.
#[derive(Debug, Clone)]
pub struct VelocityTiming {
    tempo: TempoMap,
    velocities: Vec<TimingInfo>,
    base_multiplier: f64,
    /// Track position at each SV point.
    offsets: Vec<f64>,
}

impl VelocityTiming {
    pub fn new(bpms: Vec<TimingInfo>, velocities: Vec<TimingInfo>, base_multiplier: f64) -> Self {
        let mut offsets = Vec::with_capacity(velocities.len());
        if let Some(first) = velocities.first() {
            let mut pos = (first.start_time * base_multiplier * TRACK_UNITS_PER_MS).round();
            offsets.push(pos);
            for pair in velocities.windows(2) {
                pos += ((pair[1].start_time - pair[0].start_time)
                    * pair[0].value
                    * TRACK_UNITS_PER_MS)
                    .round();
                offsets.push(pos);
            }
        }

        Self {
            tempo: TempoMap::new(bpms),
            velocities,
            base_multiplier,
            offsets,
        }
    }

    /// Track position at `offset`, locating the SV segment by scan.
    pub fn offset_at(&self, offset: f64) -> f64 {
        let index = self
            .velocities
            .iter()
            .position(|sv| offset < sv.start_time)
            .unwrap_or(self.velocities.len());
        self.offset_at_hinted(offset, index)
    }

    /// Track position at `offset` given `index`, the count of SV points at or
    /// before `offset`.
    pub fn offset_at_hinted(&self, offset: f64, index: usize) -> f64 {
        debug_assert!(
            index <= self.velocities.len(),
            "SV hint {} out of range ({} points)",
            index,
            self.velocities.len()
        );
        let index = index.min(self.velocities.len());

        if index == 0 {
            return offset * self.base_multiplier * TRACK_UNITS_PER_MS;
        }

        let sv = &self.velocities[index - 1];
        self.offsets[index - 1] + (offset - sv.start_time) * sv.value * TRACK_UNITS_PER_MS
    }

    pub fn marker_positions(&self) -> &[f64] {
        &self.offsets
    }
}

/// The two scroll models, closed set.
#[derive(Debug, Clone)]
pub enum TimingCurve {
    Static(StaticTiming),
    Velocity(VelocityTiming),
}

impl TimingCurve {
    /// Build from a prepared chart; `no_sv` selects the static model.
    pub fn from_chart(chart: &Chart, no_sv: bool) -> Self {
        if no_sv {
            Self::Static(StaticTiming::new(chart.bpms.clone()))
        } else {
            Self::Velocity(VelocityTiming::new(
                chart.bpms.clone(),
                chart.svs.clone(),
                chart.initial_sv_multiplier,
            ))
        }
    }

    pub fn offset_at(&self, offset: f64) -> f64 {
        match self {
            Self::Static(t) => t.offset_at(offset),
            Self::Velocity(t) => t.offset_at(offset),
        }
    }

    /// Like [`offset_at`](Self::offset_at) with a caller-tracked SV index.
    /// The static model ignores the hint.
    pub fn offset_at_hinted(&self, offset: f64, index: usize) -> f64 {
        match self {
            Self::Static(t) => t.offset_at(offset),
            Self::Velocity(t) => t.offset_at_hinted(offset, index),
        }
    }

    fn tempo(&self) -> &TempoMap {
        match self {
            Self::Static(t) => &t.tempo,
            Self::Velocity(t) => &t.tempo,
        }
    }

    pub fn bpm_at(&self, offset: f64) -> f64 {
        self.tempo().bpm_at(offset)
    }

    pub fn beat_at(&self, offset: f64) -> f64 {
        self.tempo().beat_at(offset)
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}
