use serde::{Deserialize, Serialize};

/// Note kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Single tap.
    #[default]
    Normal,
    /// Press at the head, hold until the tail.
    Hold,
}

/// A chart note as handed over by a chart parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct NoteInfo {
    /// Head time in milliseconds.
    pub start_time: f64,
    /// Tail time in milliseconds. 0.0 for normal notes.
    pub end_time: f64,
    pub note_type: NoteType,
    /// Lane index, 0-based.
    pub lane: usize,
    /// Sample index into the external audio cache.
    pub keysound: Option<u32>,
    /// Sample volume, 0.0..=1.0.
    pub volume: f32,
    /// Stereo pan, -1.0..=1.0.
    pub pan: f32,
}

impl Default for NoteInfo {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 0.0,
            note_type: NoteType::Normal,
            lane: 0,
            keysound: None,
            volume: 1.0,
            pan: 0.0,
        }
    }
}

impl NoteInfo {
    pub fn normal(lane: usize, start_time: f64) -> Self {
        Self {
            start_time,
            lane,
            ..Default::default()
        }
    }

    pub fn hold(lane: usize, start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            note_type: NoteType::Hold,
            lane,
            ..Default::default()
        }
    }

    pub fn with_keysound(mut self, index: u32) -> Self {
        self.keysound = Some(index);
        self
    }

    pub fn is_hold(&self) -> bool {
        self.note_type == NoteType::Hold
    }

    /// Time until which the note occupies its lane.
    pub fn tail_time(&self) -> f64 {
        if self.is_hold() {
            self.end_time
        } else {
            self.start_time
        }
    }
}

/// A background sample triggered by the clock rather than by input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSample {
    pub start_time: f64,
    pub index: u32,
    #[serde(default = "full_volume")]
    pub volume: f32,
    #[serde(default)]
    pub pan: f32,
}

fn full_volume() -> f32 {
    1.0
}
