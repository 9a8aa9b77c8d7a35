// Gameplay: notes, judgement, scoring, autoplay and the frame engine

pub mod arena;
pub mod autoplay;
pub mod config;
pub mod engine;
mod error;
pub mod event;
pub mod judge;
pub mod lane_cover;
pub mod note;
pub mod note_pool;
pub mod render;
pub mod score;
pub mod session;
pub mod timing_line;
pub mod track;

pub use autoplay::{
    ReplayCursor, ReplayHitInfo, ReplayHitKind, create_replay, read_replay, write_replay,
};
pub use config::{ModConfig, PlayConfig, Resolution};
pub use engine::{GameState, RhythmEngine};
pub use error::PlayError;
pub use event::{InputEvent, NoteHitInfo, PlayEvent, SoundCue, SoundIntent, TrackEvent};
pub use judge::{HoldResult, Judge, JudgeWindows, Judgement, MsWindows, NoteResult};
pub use lane_cover::LaneCover;
pub use note::{Note, NoteDesc, NoteState};
pub use note_pool::{NoteImageType, NoteVisualPool, VisualHandle};
pub use render::{CoverSegment, DrawCommand, RenderContext};
pub use score::{Difficulty, ScoreManager, ScoreSnapshot};
pub use track::{GameTrack, NoteHandle};
