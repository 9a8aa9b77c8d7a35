use beatline_model::TimingInfo;

/// Sorted BPM points with segment lookup.
#[derive(Debug, Clone, Default)]
pub struct TempoMap {
    bpms: Vec<TimingInfo>,
}

impl TempoMap {
    pub fn new(bpms: Vec<TimingInfo>) -> Self {
        Self { bpms }
    }

    pub fn points(&self) -> &[TimingInfo] {
        &self.bpms
    }

    /// Index of the BPM segment containing `offset`.
    ///
    /// Binary search for `bpms[i].start <= offset < bpms[i + 1].start`. Offsets
    /// before the first point resolve to segment 0.
    pub fn segment_at(&self, offset: f64) -> usize {
        let len = self.bpms.len();
        if len <= 1 {
            return 0;
        }

        let (mut min, mut max) = (0usize, len - 1);
        while min <= max {
            let mid = (min + max) / 2;
            let after_mid = self.bpms[mid].start_time <= offset;
            let before_next = mid + 1 >= len || self.bpms[mid + 1].start_time > offset;

            if after_mid && before_next {
                return mid;
            } else if after_mid {
                min = mid + 1;
            } else if mid == 0 {
                break;
            } else {
                max = mid - 1;
            }
        }
        0
    }

    /// Tempo in effect at `offset`. Returns 0 for an empty map.
    pub fn bpm_at(&self, offset: f64) -> f64 {
        self.bpms
            .get(self.segment_at(offset))
            .map_or(0.0, |tp| tp.value)
    }

    /// Beat number reached at `offset`.
    pub fn beat_at(&self, offset: f64) -> f64 {
        self.bpms
            .get(self.segment_at(offset))
            .map_or(0.0, |tp| tp.calculate_beat(offset))
    }
}
