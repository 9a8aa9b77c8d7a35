// Timing normalization: fold BPM drift into one SV-multiplier timeline
// relative to the chart's duration-weighted common BPM.

use crate::chart::Chart;
use crate::timing::TimingInfo;

/// Accumulated wall-clock time spent at one BPM value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BpmBucket {
    bpm: f64,
    duration: f64,
}

/// Collects normalized SV points, emitting only when the effective
/// multiplier changes.
#[derive(Debug, Default)]
struct SvEmitter {
    points: Vec<TimingInfo>,
    current: Option<f64>,
    initial: Option<f64>,
}

impl SvEmitter {
    fn push(&mut self, start_time: f64, multiplier: f64) {
        if self.current.is_none() {
            self.current = Some(multiplier);
            self.initial = Some(multiplier);
        }
        if self.current != Some(multiplier) {
            self.points.push(TimingInfo::sv(start_time, multiplier));
            self.current = Some(multiplier);
        }
    }
}

impl Chart {
    /// BPM value with the largest total duration between chart start and the
    /// last note.
    ///
    /// Durations are summed per distinct BPM value while walking the BPM list
    /// backward. On equal durations the bucket created first wins, which is
    /// the one whose latest segment sits furthest into the chart.
    pub fn common_bpm(&self) -> f64 {
        let Some(first) = self.bpms.first() else {
            return 0.0;
        };

        let Some(last_note) = self
            .notes
            .iter()
            .max_by(|a, b| a.start_time.total_cmp(&b.start_time))
        else {
            return first.value;
        };
        let mut last_time = last_note.tail_time();

        let mut buckets: Vec<BpmBucket> = Vec::new();
        for (i, tp) in self.bpms.iter().enumerate().rev() {
            if tp.start_time > last_time {
                continue;
            }

            let segment_start = if i == 0 { 0.0 } else { tp.start_time };
            let duration = last_time - segment_start;
            last_time = tp.start_time;

            match buckets.iter_mut().find(|b| b.bpm == tp.value) {
                Some(bucket) => bucket.duration += duration,
                None => buckets.push(BpmBucket {
                    bpm: tp.value,
                    duration,
                }),
            }
        }

        let mut best: Option<BpmBucket> = None;
        for bucket in buckets {
            if best.is_none_or(|b| bucket.duration > b.duration) {
                best = Some(bucket);
            }
        }

        best.map_or(first.value, |b| b.bpm)
    }

    /// Rewrite `svs` as effective multipliers `sv * bpm / base_bpm`, setting
    /// `base_bpm` and `initial_sv_multiplier`.
    ///
    /// An SV stops applying at the next BPM point unless another SV sits
    /// exactly on that point. Requires sorted, non-empty, positive BPM points.
    pub fn normalize_timings(&mut self) {
        let base_bpm = self.common_bpm();
        self.base_bpm = base_bpm;

        let Some(first) = self.bpms.first() else {
            self.initial_sv_multiplier = 1.0;
            return;
        };

        let mut emitter = SvEmitter::default();
        let mut current_bpm = first.value;
        let mut sv_idx = 0;
        let mut sv_multiplier = 1.0;
        let mut sv_start: Option<f64> = None;

        for (i, tp) in self.bpms.iter().enumerate() {
            let shared_start = self
                .bpms
                .get(i + 1)
                .is_some_and(|next| next.start_time == tp.start_time);

            while let Some(sv) = self.svs.get(sv_idx) {
                if sv.start_time > tp.start_time {
                    break;
                }
                if shared_start && sv.start_time == tp.start_time {
                    break;
                }
                if sv.start_time < tp.start_time {
                    emitter.push(sv.start_time, sv.value * (current_bpm / base_bpm));
                }

                sv_start = Some(sv.start_time);
                sv_multiplier = sv.value;
                sv_idx += 1;
            }

            if sv_start.is_none_or(|start| start < tp.start_time) {
                sv_multiplier = 1.0;
            }

            current_bpm = tp.value;
            emitter.push(tp.start_time, sv_multiplier * (current_bpm / base_bpm));
        }

        for sv in &self.svs[sv_idx..] {
            emitter.push(sv.start_time, sv.value * (current_bpm / base_bpm));
        }

        self.initial_sv_multiplier = emitter.initial.unwrap_or(1.0);
        self.svs = emitter.points;
    }
}

#[cfg(test)]
mod tests {
    use crate::{Chart, NoteInfo, TimingInfo};

    fn chart_with(bpms: Vec<TimingInfo>, svs: Vec<TimingInfo>, last: f64) -> Chart {
        Chart::new(vec![NoteInfo::normal(0, last)], bpms, svs)
    }

    #[test]
    fn common_bpm_picks_longest_duration() {
        let c = chart_with(
            vec![TimingInfo::bpm(0.0, 120.0), TimingInfo::bpm(1000.0, 180.0)],
            Vec::new(),
            5000.0,
        );
        assert_eq!(c.common_bpm(), 180.0);
    }

    #[test]
    fn common_bpm_sums_repeated_values() {
        // 120 covers 0..1000 and 3000..4500, 200 covers 1000..3000.
        let c = chart_with(
            vec![
                TimingInfo::bpm(0.0, 120.0),
                TimingInfo::bpm(1000.0, 200.0),
                TimingInfo::bpm(3000.0, 120.0),
            ],
            Vec::new(),
            4500.0,
        );
        assert_eq!(c.common_bpm(), 120.0);
    }

    #[test]
    fn common_bpm_tie_goes_to_latest_segment() {
        let c = chart_with(
            vec![TimingInfo::bpm(0.0, 100.0), TimingInfo::bpm(1000.0, 150.0)],
            Vec::new(),
            2000.0,
        );
        assert_eq!(c.common_bpm(), 150.0);
    }

    #[test]
    fn common_bpm_ignores_points_after_last_note() {
        let c = chart_with(
            vec![TimingInfo::bpm(0.0, 90.0), TimingInfo::bpm(9000.0, 300.0)],
            Vec::new(),
            2000.0,
        );
        assert_eq!(c.common_bpm(), 90.0);
    }

    #[test]
    fn common_bpm_without_notes_uses_first_point() {
        let c = Chart::new(Vec::new(), vec![TimingInfo::bpm(0.0, 133.0)], Vec::new());
        assert_eq!(c.common_bpm(), 133.0);
    }

    #[test]
    fn common_bpm_of_empty_list_is_zero() {
        assert_eq!(Chart::default().common_bpm(), 0.0);
    }

    #[test]
    fn single_bpm_without_sv_produces_no_points() {
        let mut c = chart_with(vec![TimingInfo::bpm(0.0, 150.0)], Vec::new(), 3000.0);
        c.normalize_timings();
        assert!(c.svs.is_empty());
        assert_eq!(c.initial_sv_multiplier, 1.0);
        assert_eq!(c.base_bpm, 150.0);
    }

    #[test]
    fn single_entry_sv_timeline_is_unchanged() {
        let mut c = chart_with(
            vec![TimingInfo::bpm(0.0, 150.0)],
            vec![TimingInfo::sv(1200.0, 1.5)],
            3000.0,
        );
        c.normalize_timings();
        let once = c.svs.clone();
        assert_eq!(once, vec![TimingInfo::sv(1200.0, 1.5)]);

        c.normalize_timings();
        assert_eq!(c.svs, once);
        assert_eq!(c.initial_sv_multiplier, 1.0);
    }

    #[test]
    fn bpm_change_becomes_sv_point() {
        let mut c = chart_with(
            vec![TimingInfo::bpm(0.0, 100.0), TimingInfo::bpm(1000.0, 200.0)],
            Vec::new(),
            10000.0,
        );
        c.normalize_timings();
        assert_eq!(c.base_bpm, 200.0);
        assert_eq!(c.initial_sv_multiplier, 0.5);
        assert_eq!(c.svs, vec![TimingInfo::sv(1000.0, 1.0)]);
    }

    #[test]
    fn sv_resets_at_next_bpm_point() {
        let mut c = chart_with(
            vec![TimingInfo::bpm(0.0, 120.0), TimingInfo::bpm(2000.0, 120.0)],
            vec![TimingInfo::sv(1000.0, 2.0)],
            4000.0,
        );
        c.normalize_timings();
        assert_eq!(
            c.svs,
            vec![TimingInfo::sv(1000.0, 2.0), TimingInfo::sv(2000.0, 1.0)]
        );
    }

    #[test]
    fn sv_on_bpm_point_carries_over() {
        let mut c = chart_with(
            vec![TimingInfo::bpm(0.0, 120.0), TimingInfo::bpm(2000.0, 240.0)],
            vec![TimingInfo::sv(2000.0, 0.5)],
            2500.0,
        );
        c.normalize_timings();
        // base stays 120 (2000 ms against 500 ms); 0.5 * 240/120 == 1.0
        assert_eq!(c.base_bpm, 120.0);
        assert!(c.svs.is_empty());
    }

    #[test]
    fn duplicate_bpm_points_defer_sv_to_the_last_one() {
        let mut c = chart_with(
            vec![
                TimingInfo::bpm(0.0, 120.0),
                TimingInfo::bpm(1000.0, 60.0),
                TimingInfo::bpm(1000.0, 240.0),
            ],
            vec![TimingInfo::sv(1000.0, 0.5)],
            5000.0,
        );
        c.normalize_timings();
        assert_eq!(c.base_bpm, 240.0);
        assert_eq!(c.initial_sv_multiplier, 0.5);
        // 60 point: SV held back, multiplier 1 * 60/240; 240 point: 0.5 * 240/240
        assert_eq!(
            c.svs,
            vec![TimingInfo::sv(1000.0, 0.25), TimingInfo::sv(1000.0, 0.5)]
        );
    }

    #[test]
    fn trailing_svs_after_last_bpm_are_scaled() {
        let mut c = chart_with(
            vec![TimingInfo::bpm(0.0, 180.0)],
            vec![TimingInfo::sv(500.0, 2.0), TimingInfo::sv(900.0, 2.0)],
            2000.0,
        );
        c.normalize_timings();
        assert_eq!(c.svs, vec![TimingInfo::sv(500.0, 2.0)]);
    }
}
