use log::{debug, info, warn};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::LANE_COUNT;
use crate::error::ChartError;
use crate::lane_mod::LaneModifier;
use crate::note::{AutoSample, NoteInfo};
use crate::timing::TimingInfo;

/// Lowest SV multiplier a chart may request.
const SV_MIN: f64 = 0.1;
/// Highest SV multiplier a chart may request.
const SV_MAX: f64 = 10.0;

/// In-memory chart consumed by the play engine.
///
/// Parsers fill the raw lists; [`Chart::prepare`] turns them into the sorted,
/// normalized form the engine expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Chart {
    pub title: String,
    pub artist: String,
    pub level: i32,
    /// Audio length reported by the parser, in milliseconds.
    pub audio_length: Option<f64>,
    pub notes: Vec<NoteInfo>,
    pub bpms: Vec<TimingInfo>,
    pub svs: Vec<TimingInfo>,
    pub auto_samples: Vec<AutoSample>,
    /// Explicit measure line times. Empty means lines follow the BPM points.
    pub custom_measures: Vec<f64>,
    /// Duration-weighted common BPM. Set by normalization.
    pub base_bpm: f64,
    /// SV multiplier in effect before the first normalized SV point.
    pub initial_sv_multiplier: f64,
    pub key_count: usize,
    /// Hex MD5 over note timings.
    pub hash: String,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            level: 0,
            audio_length: None,
            notes: Vec::new(),
            bpms: Vec::new(),
            svs: Vec::new(),
            auto_samples: Vec::new(),
            custom_measures: Vec::new(),
            base_bpm: 0.0,
            initial_sv_multiplier: 1.0,
            key_count: LANE_COUNT,
            hash: String::new(),
        }
    }
}

impl Chart {
    pub fn new(notes: Vec<NoteInfo>, bpms: Vec<TimingInfo>, svs: Vec<TimingInfo>) -> Self {
        Self {
            notes,
            bpms,
            svs,
            ..Default::default()
        }
    }

    /// Validate and normalize a freshly parsed chart.
    ///
    /// Runs once per chart. Running it again on a chart with several distinct
    /// BPM values rescales the SV list a second time.
    pub fn prepare(&mut self) -> Result<(), ChartError> {
        self.validate()?;

        self.notes
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        let folded = self.fold_overlaps();
        if folded > 0 {
            warn!("Chart: {} overlapping notes folded into auto samples", folded);
        }

        for sv in &mut self.svs {
            sv.value = sv.value.clamp(SV_MIN, SV_MAX);
        }
        self.bpms
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        self.svs.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        if self.bpms[0].start_time > 0.0 {
            let mut lead_in = self.bpms[0].clone();
            lead_in.start_time = 0.0;
            self.bpms.insert(0, lead_in);
        }
        self.accumulate_beats();

        self.normalize_timings();
        self.key_count = self.compute_key_count();
        self.hash = self.compute_hash();
        self.auto_samples
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        info!(
            "Chart: {} notes, {}K, base BPM {:.2}, {} SV points",
            self.notes.len(),
            self.key_count,
            self.base_bpm,
            self.svs.len()
        );
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if self.bpms.is_empty() {
            return Err(ChartError::NoBpm);
        }
        for tp in &self.bpms {
            if !tp.value.is_finite() || tp.value <= 0.0 || !tp.start_time.is_finite() {
                return Err(ChartError::InvalidBpm {
                    time: tp.start_time,
                    value: tp.value,
                });
            }
        }
        for (index, note) in self.notes.iter().enumerate() {
            if !note.start_time.is_finite() || !note.end_time.is_finite() {
                return Err(ChartError::InvalidNoteTime { index });
            }
            if note.lane >= LANE_COUNT {
                return Err(ChartError::LaneOutOfRange {
                    lane: note.lane,
                    time: note.start_time,
                });
            }
            if note.is_hold() && note.end_time <= note.start_time {
                return Err(ChartError::InvalidHold {
                    start: note.start_time,
                    end: note.end_time,
                });
            }
        }
        Ok(())
    }

    /// Drop notes that start while their lane is still occupied.
    ///
    /// Expects notes sorted by start time. A dropped note with a keysound keeps
    /// sounding as an auto sample. Returns the number of dropped notes.
    pub fn fold_overlaps(&mut self) -> usize {
        let mut lane_free_at = [0.0f64; LANE_COUNT];
        let mut kept = Vec::with_capacity(self.notes.len());
        let mut folded = 0;

        for note in self.notes.drain(..) {
            if note.start_time < lane_free_at[note.lane] {
                debug!(
                    "Chart: overlapped note at {:.2} ms conflicts with {:.2} ms",
                    note.start_time, lane_free_at[note.lane]
                );
                if let Some(index) = note.keysound {
                    self.auto_samples.push(AutoSample {
                        start_time: note.start_time,
                        index,
                        volume: note.volume,
                        pan: note.pan,
                    });
                }
                folded += 1;
            } else {
                lane_free_at[note.lane] = note.tail_time();
                kept.push(note);
            }
        }

        self.notes = kept;
        folded
    }

    fn accumulate_beats(&mut self) {
        if let Some(first) = self.bpms.first_mut() {
            first.beat = 0.0;
        }
        for i in 1..self.bpms.len() {
            let beat = self.bpms[i - 1].calculate_beat(self.bpms[i].start_time);
            self.bpms[i].beat = beat;
        }
    }

    /// Chart length in milliseconds.
    pub fn length(&self) -> f64 {
        if let Some(length) = self.audio_length {
            return length;
        }
        match self.notes.last() {
            Some(last) if last.end_time != 0.0 => last.end_time,
            Some(last) => last.start_time,
            None => 0.0,
        }
    }

    /// Key count inferred from the set of used lanes.
    pub fn compute_key_count(&self) -> usize {
        let mut used = [false; LANE_COUNT];
        for note in &self.notes {
            if let Some(slot) = used.get_mut(note.lane) {
                *slot = true;
            }
        }

        match used {
            [true, true, true, true, true, true, true] => 7,
            [true, true, true, true, true, true, false] => 6,
            [true, true, false, true, false, true, true] => 5,
            [true, true, false, false, false, true, true] => 4,
            _ => {
                debug!("Chart: unknown lane pattern {:?}, using 7K", used);
                7
            }
        }
    }

    /// Content hash over note timings.
    pub fn compute_hash(&self) -> String {
        let mut content = String::new();
        for note in &self.notes {
            content.push_str(&format!("{:.6}", note.start_time + note.end_time));
        }
        format!("{:x}", Md5::digest(content.as_bytes()))
    }

    pub fn apply_mod<M: LaneModifier + ?Sized>(&mut self, modifier: &mut M) {
        modifier.modify(self);
    }
}
