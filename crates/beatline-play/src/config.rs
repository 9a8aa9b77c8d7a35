use std::path::Path;

use anyhow::Result;
use beatline_model::LANE_COUNT;
use serde::{Deserialize, Serialize};

use crate::score::Difficulty;

pub const NOTE_SPEED_MIN: i32 = 10;
pub const NOTE_SPEED_MAX: i32 = 1000;
pub const SONG_RATE_MIN: f64 = 0.5;
pub const SONG_RATE_MAX: f64 = 2.0;
pub const AUDIO_VOLUME_MAX: f64 = 100.0;
pub const GUIDE_LINE_INDEX_MAX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Chart, judge and presentation modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ModConfig {
    pub autoplay: bool,
    pub mirror: bool,
    pub random: bool,
    /// Lane permutation applied when neither mirror nor random is set.
    pub rearrange: Option<[usize; LANE_COUNT]>,
    /// Scroll at constant speed, ignoring SV.
    pub no_sv: bool,
    /// Fixed millisecond windows instead of beat-relative ones.
    pub static_judge: bool,
    pub hidden: bool,
    pub flashlight: bool,
    /// Seed for the random lane mod; drawn fresh when unset.
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct PlayConfig {
    pub note_speed: i32,
    pub song_rate: f64,
    pub audio_offset: f64,
    pub audio_volume: f64,
    pub auto_sound: bool,
    pub difficulty: Difficulty,
    pub hit_position: f64,
    pub lane_offset: f64,
    pub guide_line_index: usize,
    pub resolution: Resolution,
    pub note_frame_count: u32,
    pub mods: ModConfig,
    /// Static judge with every tier window collapsed to zero.
    pub legacy_ms_windows: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            note_speed: 180,
            song_rate: 1.0,
            audio_offset: 0.0,
            audio_volume: AUDIO_VOLUME_MAX,
            auto_sound: false,
            difficulty: Difficulty::Easy,
            hit_position: 480.0,
            lane_offset: 5.0,
            guide_line_index: 0,
            resolution: Resolution::default(),
            note_frame_count: 1,
            mods: ModConfig::default(),
            legacy_ms_windows: false,
        }
    }
}

impl PlayConfig {
    pub fn validate(&mut self) {
        self.note_speed = self.note_speed.clamp(NOTE_SPEED_MIN, NOTE_SPEED_MAX);
        if !self.song_rate.is_finite() {
            self.song_rate = 1.0;
        }
        self.song_rate = self.song_rate.clamp(SONG_RATE_MIN, SONG_RATE_MAX);
        if !self.audio_offset.is_finite() {
            self.audio_offset = 0.0;
        }
        if !self.audio_volume.is_finite() {
            self.audio_volume = AUDIO_VOLUME_MAX;
        }
        self.audio_volume = self.audio_volume.clamp(0.0, AUDIO_VOLUME_MAX);
        self.guide_line_index = self.guide_line_index.min(GUIDE_LINE_INDEX_MAX);
        self.note_frame_count = self.note_frame_count.max(1);
        self.resolution.width = self.resolution.width.max(1);
        self.resolution.height = self.resolution.height.max(1);
    }

    /// Read config from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: PlayConfig = serde_json::from_str(&data)?;
        config.validate();
        Ok(config)
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
