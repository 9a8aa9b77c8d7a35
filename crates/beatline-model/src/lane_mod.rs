// Lane permutation modifiers (Mirror, Random, Rearrange)

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::LANE_COUNT;
use crate::chart::Chart;
use crate::error::ChartError;

/// A chart transformation applied before note expansion.
pub trait LaneModifier {
    fn modify(&mut self, chart: &mut Chart);
}

/// Remap every note with `lane = mapping[lane]`.
pub fn apply_lane_mapping(chart: &mut Chart, mapping: &[usize; LANE_COUNT]) {
    for note in &mut chart.notes {
        note.lane = mapping[note.lane];
    }
}

fn identity_mapping() -> [usize; LANE_COUNT] {
    std::array::from_fn(|i| i)
}

/// Reverses lane order across all seven lanes.
pub struct Mirror;

impl Mirror {
    pub fn mapping() -> [usize; LANE_COUNT] {
        std::array::from_fn(|lane| LANE_COUNT - 1 - lane)
    }
}

impl LaneModifier for Mirror {
    fn modify(&mut self, chart: &mut Chart) {
        apply_lane_mapping(chart, &Self::mapping());
    }
}

/// One random permutation for the whole chart.
pub struct LaneRandom {
    seed: u64,
}

impl LaneRandom {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn make_random(&self) -> [usize; LANE_COUNT] {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut lanes = identity_mapping();
        lanes.shuffle(&mut rng);
        lanes
    }
}

impl LaneModifier for LaneRandom {
    fn modify(&mut self, chart: &mut Chart) {
        let mapping = self.make_random();
        log::debug!("LaneRandom: seed {} mapping {:?}", self.seed, mapping);
        apply_lane_mapping(chart, &mapping);
    }
}

/// A user-supplied lane permutation.
pub struct Rearrange {
    lanes: [usize; LANE_COUNT],
}

impl Rearrange {
    pub fn new(lanes: [usize; LANE_COUNT]) -> Result<Self, ChartError> {
        let mut seen = [false; LANE_COUNT];
        for &lane in &lanes {
            if lane >= LANE_COUNT || seen[lane] {
                return Err(ChartError::InvalidRearrange(lanes.to_vec()));
            }
            seen[lane] = true;
        }
        Ok(Self { lanes })
    }
}

impl LaneModifier for Rearrange {
    fn modify(&mut self, chart: &mut Chart) {
        apply_lane_mapping(chart, &self.lanes);
    }
}
