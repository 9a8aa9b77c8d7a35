// Hit-timing classification
//
// Errors are `hit_time - time`: positive when the press comes early.

use serde::{Deserialize, Serialize};

/// Judgement tier, ordered worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum NoteResult {
    #[default]
    Miss,
    Bad,
    Good,
    Cool,
}

/// Hold-body scoring tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldResult {
    HoldBreak,
    HoldAdd,
}

/// Outcome of judging one press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    /// The input is consumed by the note.
    pub accepted: bool,
    pub result: NoteResult,
}

impl Judgement {
    pub const REJECTED: Self = Self {
        accepted: false,
        result: NoteResult::Miss,
    };

    fn accepted(result: NoteResult) -> Self {
        Self {
            accepted: true,
            result,
        }
    }
}

/// Resolved window widths in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindows {
    pub cool: f64,
    pub good: f64,
    pub bad: f64,
    /// Widest distance still consumed as a MISS.
    pub miss: f64,
    /// Earliest press that [`Judge::is_accepted`] admits.
    pub early_accept: f64,
    /// Lateness after which the note counts as missed.
    pub late_miss: f64,
}

impl JudgeWindows {
    fn classify(&self, error: f64) -> Judgement {
        let distance = error.abs();
        if distance <= self.cool {
            Judgement::accepted(NoteResult::Cool)
        } else if distance <= self.good {
            Judgement::accepted(NoteResult::Good)
        } else if distance <= self.bad {
            Judgement::accepted(NoteResult::Bad)
        } else if distance <= self.miss {
            Judgement::accepted(NoteResult::Miss)
        } else {
            Judgement::REJECTED
        }
    }
}

// ---------------------------------------------------------------------------
// Beat-relative windows
// ---------------------------------------------------------------------------

/// One 4/4 measure at 1 BPM, in milliseconds.
const MEASURE_MS_AT_ONE_BPM: f64 = 240_000.0;
const TICKS_PER_MEASURE: f64 = 192.0;

const COOL_TICKS: f64 = 6.0;
const GOOD_TICKS: f64 = 18.0;
const BAD_TICKS: f64 = 25.0;
const MISS_TICKS: f64 = 30.0;

/// Length of one 1/192-measure tick at `bpm`.
pub fn tick_ms(bpm: f64) -> f64 {
    MEASURE_MS_AT_ONE_BPM / bpm / TICKS_PER_MEASURE
}

// ---------------------------------------------------------------------------
// Fixed millisecond windows
// ---------------------------------------------------------------------------

/// Millisecond thresholds for the static judge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsWindows {
    pub cool: f64,
    pub good: f64,
    pub bad: f64,
    pub miss: f64,
}

impl Default for MsWindows {
    fn default() -> Self {
        Self {
            cool: 41.0,
            good: 125.0,
            bad: 173.0,
            miss: 184.0,
        }
    }
}

/// Timing judge selected at load.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Judge {
    /// Windows in 1/192-measure ticks of the note's BPM.
    #[default]
    BeatBased,
    /// Fixed millisecond windows.
    MsBased(MsWindows),
    /// Millisecond acceptance with every tier threshold at zero: only an exact
    /// hit is COOL and everything else inside the window is a MISS.
    LegacyMsBased(MsWindows),
}

impl Judge {
    pub fn ms_based() -> Self {
        Self::MsBased(MsWindows::default())
    }

    pub fn legacy_ms_based() -> Self {
        Self::LegacyMsBased(MsWindows::default())
    }

    /// Window widths for a note judged at `bpm`.
    pub fn windows(&self, bpm: f64) -> JudgeWindows {
        match *self {
            Self::BeatBased => {
                let tick = tick_ms(bpm);
                let miss = MISS_TICKS * tick;
                JudgeWindows {
                    cool: COOL_TICKS * tick,
                    good: GOOD_TICKS * tick,
                    bad: BAD_TICKS * tick,
                    miss,
                    early_accept: miss,
                    late_miss: miss,
                }
            }
            Self::MsBased(w) => JudgeWindows {
                cool: w.cool,
                good: w.good,
                bad: w.bad,
                miss: w.miss,
                early_accept: w.bad,
                late_miss: w.miss,
            },
            Self::LegacyMsBased(w) => JudgeWindows {
                cool: 0.0,
                good: 0.0,
                bad: 0.0,
                miss: 0.0,
                early_accept: w.bad,
                late_miss: w.miss,
            },
        }
    }

    /// Classify an input at `time` against a note at `hit_time`.
    pub fn calculate_result(&self, hit_time: f64, bpm: f64, time: f64) -> Judgement {
        self.windows(bpm).classify(hit_time - time)
    }

    /// The note is not too far ahead.
    pub fn is_accepted(&self, hit_time: f64, bpm: f64, time: f64) -> bool {
        hit_time - time <= self.windows(bpm).early_accept
    }

    /// The note is too far behind to be hit.
    pub fn is_missed(&self, hit_time: f64, bpm: f64, time: f64) -> bool {
        time - hit_time > self.windows(bpm).late_miss
    }
}
