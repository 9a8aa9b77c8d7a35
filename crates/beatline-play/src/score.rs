// Score, combo, jam gauge, pills and life

use serde::{Deserialize, Serialize};

use crate::event::NoteHitInfo;
use crate::judge::{HoldResult, NoteResult};

pub const MAX_LIFE: f32 = 100.0;
pub const MAX_JAM_GAUGE: i32 = 100;
pub const MAX_PILLS: u32 = 5;
/// Consecutive COOLs that earn one pill.
const COOLS_PER_PILL: u32 = 15;

/// Life drain tier. Easy never fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// Life change per result, as (COOL, GOOD, BAD, MISS).
    fn life_table(self) -> [f32; 4] {
        match self {
            Self::Easy => [0.3, 0.2, -1.0, -5.0],
            Self::Normal => [0.2, 0.1, -0.7, -4.0],
            Self::Hard => [0.1, 0.0, -0.5, -3.0],
        }
    }

    pub fn life_delta(self, result: NoteResult) -> f32 {
        let table = self.life_table();
        match result {
            NoteResult::Cool => table[0],
            NoteResult::Good => table[1],
            NoteResult::Bad => table[2],
            NoteResult::Miss => table[3],
        }
    }
}

/// Counters exposed to the host after each judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub score: i64,
    pub cool: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
    pub jam_combo: u32,
    pub max_jam_combo: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub ln_combo: u32,
    pub ln_max_combo: u32,
}

/// What one judgement changed, for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreUpdate {
    /// The judgement after pill conversion; `None` when suppressed.
    pub reported: Option<NoteHitInfo>,
    /// New jam combo when the gauge filled.
    pub jam: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ScoreManager {
    difficulty: Difficulty,
    snapshot: ScoreSnapshot,
    jam_gauge: i32,
    cool_combo: u32,
    pills: u32,
    life: f32,
}

impl ScoreManager {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            snapshot: ScoreSnapshot::default(),
            jam_gauge: 0,
            cool_combo: 0,
            pills: 0,
            life: MAX_LIFE,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.snapshot
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    pub fn pills(&self) -> u32 {
        self.pills
    }

    pub fn jam_gauge(&self) -> i32 {
        self.jam_gauge
    }

    pub fn is_failed(&self) -> bool {
        self.difficulty >= Difficulty::Normal && self.life <= 0.0
    }

    fn add_life(&mut self, delta: f32) {
        if self.life > 0.0 {
            self.life = (self.life + delta).clamp(0.0, MAX_LIFE);
        }
    }

    fn jam_bonus(&self, per_jam: i64) -> i64 {
        per_jam * i64::from(self.snapshot.jam_combo)
    }

    pub fn on_hit(&mut self, info: NoteHitInfo) -> ScoreUpdate {
        let mut info = info;

        match info.result {
            NoteResult::Cool => {
                self.add_life(self.difficulty.life_delta(NoteResult::Cool));
                self.jam_gauge += 4;
                self.snapshot.score += 200 + self.jam_bonus(10);
                self.snapshot.cool += 1;
            }
            NoteResult::Good => {
                self.add_life(self.difficulty.life_delta(NoteResult::Good));
                self.jam_gauge += 2;
                self.snapshot.score += 100 + self.jam_bonus(5);
                self.snapshot.good += 1;
            }
            NoteResult::Bad if self.pills > 0 => {
                self.pills -= 1;
                info.result = NoteResult::Cool;
                self.snapshot.score += 200 + self.jam_bonus(10);
                self.snapshot.cool += 1;
            }
            NoteResult::Bad => {
                self.add_life(self.difficulty.life_delta(NoteResult::Bad));
                self.jam_gauge = 0;
                self.snapshot.score += 4;
                self.cool_combo = 0;
                self.snapshot.combo = 0;
                self.snapshot.bad += 1;
            }
            NoteResult::Miss => {
                self.add_life(self.difficulty.life_delta(NoteResult::Miss));
                if self.life > 0.0 {
                    self.snapshot.score -= 10;
                }
                self.jam_gauge = 0;
                self.snapshot.combo = 0;
                self.snapshot.jam_combo = 0;
                self.snapshot.miss += 1;
            }
        }

        self.snapshot.score = self.snapshot.score.max(0);
        self.jam_gauge = self.jam_gauge.clamp(0, MAX_JAM_GAUGE);

        if info.result == NoteResult::Cool {
            self.cool_combo += 1;
            if self.cool_combo > COOLS_PER_PILL {
                self.cool_combo = 0;
                self.pills = (self.pills + 1).min(MAX_PILLS);
            }
        } else {
            self.cool_combo = 0;
        }

        if info.result >= NoteResult::Good {
            self.snapshot.combo += 1;
            self.snapshot.max_combo = self.snapshot.max_combo.max(self.snapshot.combo);
        }

        let mut update = ScoreUpdate::default();
        if self.jam_gauge >= MAX_JAM_GAUGE {
            self.jam_gauge = 0;
            self.snapshot.jam_combo += 1;
            self.snapshot.max_jam_combo = self.snapshot.max_jam_combo.max(self.snapshot.jam_combo);
            update.jam = Some(self.snapshot.jam_combo);
        }

        if !(info.result == NoteResult::Miss && self.life <= 0.0) {
            update.reported = Some(info);
        }
        update
    }

    /// Apply a hold-body tick; returns the new hold combo.
    pub fn on_long_note_hold(&mut self, result: HoldResult) -> u32 {
        match result {
            HoldResult::HoldBreak => self.snapshot.ln_combo = 0,
            HoldResult::HoldAdd => self.snapshot.ln_combo += 1,
        }
        self.snapshot.ln_max_combo = self.snapshot.ln_max_combo.max(self.snapshot.ln_combo);
        self.snapshot.ln_combo
    }
}

impl Default for ScoreManager {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatline_model::NoteType;

    fn hit(result: NoteResult) -> NoteHitInfo {
        NoteHitInfo {
            lane: 0,
            result,
            note_type: NoteType::Normal,
            offset: 0.0,
            is_release: false,
            ignore: false,
        }
    }

    #[test]
    fn twenty_five_cools_fill_the_jam_gauge() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        let mut jams = Vec::new();
        for _ in 0..25 {
            if let Some(jam) = score.on_hit(hit(NoteResult::Cool)).jam {
                jams.push(jam);
            }
        }
        let snap = score.snapshot();
        assert_eq!(jams, vec![1]);
        assert_eq!(snap.jam_combo, 1);
        assert_eq!(snap.score, 25 * 200);
        assert_eq!(snap.combo, 25);
        assert_eq!(snap.max_combo, 25);
        assert_eq!(score.jam_gauge(), 0);
    }

    #[test]
    fn jam_combo_raises_later_scores() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..25 {
            score.on_hit(hit(NoteResult::Cool));
        }
        score.on_hit(hit(NoteResult::Cool));
        assert_eq!(score.snapshot().score, 25 * 200 + 210);
        score.on_hit(hit(NoteResult::Good));
        assert_eq!(score.snapshot().score, 25 * 200 + 210 + 105);
    }

    #[test]
    fn sixteen_cools_earn_a_pill() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..15 {
            score.on_hit(hit(NoteResult::Cool));
        }
        assert_eq!(score.pills(), 0);
        score.on_hit(hit(NoteResult::Cool));
        assert_eq!(score.pills(), 1);
    }

    #[test]
    fn pill_converts_bad_into_cool() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..16 {
            score.on_hit(hit(NoteResult::Cool));
        }
        let before = score.snapshot();
        let update = score.on_hit(hit(NoteResult::Bad));

        assert_eq!(update.reported.map(|i| i.result), Some(NoteResult::Cool));
        assert_eq!(score.pills(), 0);
        let after = score.snapshot();
        assert_eq!(after.cool, before.cool + 1);
        assert_eq!(after.bad, 0);
        assert_eq!(after.combo, before.combo + 1);
        assert_eq!(after.score, before.score + 200);
    }

    #[test]
    fn pills_are_capped() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..16 * 8 {
            score.on_hit(hit(NoteResult::Cool));
        }
        assert_eq!(score.pills(), MAX_PILLS);
    }

    #[test]
    fn bad_without_pills_breaks_combo() {
        let mut score = ScoreManager::new(Difficulty::Normal);
        score.on_hit(hit(NoteResult::Cool));
        score.on_hit(hit(NoteResult::Bad));
        let snap = score.snapshot();
        assert_eq!(snap.combo, 0);
        assert_eq!(snap.max_combo, 1);
        assert_eq!(snap.bad, 1);
        assert_eq!(snap.score, 204);
        assert_eq!(score.jam_gauge(), 0);
        assert!((score.life() - 99.3).abs() < 1e-4);
    }

    #[test]
    fn miss_resets_jam_and_costs_score() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..25 {
            score.on_hit(hit(NoteResult::Cool));
        }
        score.on_hit(hit(NoteResult::Miss));
        let snap = score.snapshot();
        assert_eq!(snap.jam_combo, 0);
        assert_eq!(snap.max_jam_combo, 1);
        assert_eq!(snap.combo, 0);
        assert_eq!(snap.score, 25 * 200 - 10);
        assert_eq!(snap.miss, 1);
    }

    #[test]
    fn score_never_goes_negative() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        score.on_hit(hit(NoteResult::Miss));
        assert_eq!(score.snapshot().score, 0);
    }

    #[test]
    fn life_drains_to_zero_and_stays() {
        let mut score = ScoreManager::new(Difficulty::Hard);
        let mut reported = 0;
        for _ in 0..40 {
            if score.on_hit(hit(NoteResult::Miss)).reported.is_some() {
                reported += 1;
            }
        }
        assert_eq!(score.life(), 0.0);
        assert!(score.is_failed());
        // 33 misses leave 1 life; the 34th empties it and goes unreported
        assert_eq!(reported, 33);

        score.on_hit(hit(NoteResult::Cool));
        assert_eq!(score.life(), 0.0);
    }

    #[test]
    fn easy_never_fails() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        for _ in 0..30 {
            score.on_hit(hit(NoteResult::Miss));
        }
        assert_eq!(score.life(), 0.0);
        assert!(!score.is_failed());
    }

    #[test]
    fn life_is_capped_at_max() {
        let mut score = ScoreManager::new(Difficulty::Easy);
        score.on_hit(hit(NoteResult::Cool));
        assert_eq!(score.life(), MAX_LIFE);
    }

    #[test]
    fn hold_combo_tracks_best_run() {
        let mut score = ScoreManager::default();
        assert_eq!(score.on_long_note_hold(HoldResult::HoldAdd), 1);
        assert_eq!(score.on_long_note_hold(HoldResult::HoldAdd), 2);
        assert_eq!(score.on_long_note_hold(HoldResult::HoldBreak), 0);
        assert_eq!(score.on_long_note_hold(HoldResult::HoldAdd), 1);
        assert_eq!(score.snapshot().ln_max_combo, 2);
    }
}
