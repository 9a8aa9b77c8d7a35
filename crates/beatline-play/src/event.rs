// Outbound play events and inbound input

use beatline_model::NoteType;
use serde::{Deserialize, Serialize};

use crate::engine::GameState;
use crate::judge::NoteResult;
use crate::track::NoteHandle;

/// A keysound with volume (0..=100) and pan (-100..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundCue {
    pub index: u32,
    pub volume: i32,
    pub pan: i32,
}

/// Playback requests for the host's audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundIntent {
    Play(SoundCue),
    Stop { index: u32 },
}

/// Key and hit flashes for one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    pub lane: usize,
    /// Pressed (true) or released (false).
    pub state: bool,
    pub is_key_event: bool,
    pub is_hit_event: bool,
    pub is_hit_long_event: bool,
    /// Note that produced a hit event; may go stale once the note retires.
    pub note: Option<NoteHandle>,
}

impl TrackEvent {
    pub fn key(lane: usize, state: bool) -> Self {
        Self {
            lane,
            state,
            is_key_event: true,
            is_hit_event: false,
            is_hit_long_event: false,
            note: None,
        }
    }

    pub fn hit(lane: usize, state: bool, long: bool, note: NoteHandle) -> Self {
        Self {
            lane,
            state,
            is_key_event: false,
            is_hit_event: true,
            is_hit_long_event: long,
            note: Some(note),
        }
    }
}

/// One scored judgement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteHitInfo {
    pub lane: usize,
    pub result: NoteResult,
    pub note_type: NoteType,
    /// Judged time minus input time; positive when early.
    pub offset: f64,
    /// Judges a hold tail.
    pub is_release: bool,
    /// Note never accepted a press; no hit flash is shown.
    pub ignore: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayEvent {
    Track(TrackEvent),
    Hit(NoteHitInfo),
    Jam { combo: u32 },
    LongNote { combo: u32 },
    Sound(SoundIntent),
    StateChanged(GameState),
}

/// Input forwarded by the host, possibly from another thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(usize),
    KeyUp(usize),
    ScrollSpeedDown,
    ScrollSpeedUp,
}
