// Replay generation and playback cursor

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Context, Result};
use beatline_model::{Chart, LANE_COUNT, NoteInfo};
use beatline_timing::TempoMap;
use serde::{Deserialize, Serialize};

use crate::judge::{Judge, NoteResult};

/// Time a generated tap stays pressed.
const TAP_RELEASE_MS: f64 = 25.0;
/// Share of the gap to the next same-lane note used when that note is close.
const TAP_RELEASE_GAP_RATIO: f64 = 0.9;
const MAX_REFINE_STEPS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplayHitKind {
    KeyDown,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayHitInfo {
    pub time: f64,
    pub lane: usize,
    pub kind: ReplayHitKind,
}

impl ReplayHitInfo {
    pub fn key_down(time: f64, lane: usize) -> Self {
        Self {
            time,
            lane,
            kind: ReplayHitKind::KeyDown,
        }
    }

    pub fn key_up(time: f64, lane: usize) -> Self {
        Self {
            time,
            lane,
            kind: ReplayHitKind::KeyUp,
        }
    }
}

/// Chronological order; at equal times a release comes before a press so a
/// lane can be let go and re-pressed on the same millisecond.
pub fn sort_replay(events: &mut [ReplayHitInfo]) {
    events.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then_with(|| match (a.kind, b.kind) {
                (ReplayHitKind::KeyUp, ReplayHitKind::KeyDown) => Ordering::Less,
                (ReplayHitKind::KeyDown, ReplayHitKind::KeyUp) => Ordering::Greater,
                _ => Ordering::Equal,
            })
    });
}

/// Walk `time` toward `target` one millisecond at a time until it lands in
/// the COOL window.
fn snap_into_cool(judge: &Judge, target: f64, bpm: f64, time: f64) -> f64 {
    let mut time = time;
    for _ in 0..MAX_REFINE_STEPS {
        let judgement = judge.calculate_result(target, bpm, time);
        if judgement.accepted && judgement.result == NoteResult::Cool {
            break;
        }
        let remaining = target - time;
        if remaining.abs() <= 1.0 {
            time = target;
        } else {
            time += remaining.signum();
        }
    }
    time
}

fn tap_release(note: &NoteInfo, next: Option<&NoteInfo>) -> f64 {
    let release = note.start_time + TAP_RELEASE_MS;
    match next {
        Some(next) if next.start_time <= release => {
            note.start_time + (next.start_time - note.start_time) * TAP_RELEASE_GAP_RATIO
        }
        _ => release,
    }
}

/// Press and release events that score every note as COOL under `judge`.
pub fn create_replay(chart: &Chart, judge: &Judge) -> Vec<ReplayHitInfo> {
    let tempo = TempoMap::new(chart.bpms.clone());
    let mut events = Vec::with_capacity(chart.notes.len() * 2);

    let mut lanes: [Vec<&NoteInfo>; LANE_COUNT] = std::array::from_fn(|_| Vec::new());
    for note in &chart.notes {
        if let Some(lane) = lanes.get_mut(note.lane) {
            lane.push(note);
        }
    }

    for (lane, notes) in lanes.iter_mut().enumerate() {
        notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        for (i, note) in notes.iter().enumerate() {
            let down = snap_into_cool(
                judge,
                note.start_time,
                tempo.bpm_at(note.start_time),
                note.start_time,
            );
            events.push(ReplayHitInfo::key_down(down, lane));

            let up = if note.is_hold() {
                snap_into_cool(
                    judge,
                    note.end_time,
                    tempo.bpm_at(note.end_time),
                    note.end_time,
                )
            } else {
                tap_release(note, notes.get(i + 1).copied())
            };
            events.push(ReplayHitInfo::key_up(up, lane));
        }
    }

    sort_replay(&mut events);
    log::debug!("Generated {} autoplay events", events.len());
    events
}

pub fn read_replay(path: &Path) -> Result<Vec<ReplayHitInfo>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay {}", path.display()))?;
    let mut events: Vec<ReplayHitInfo> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse replay {}", path.display()))?;
    sort_replay(&mut events);
    Ok(events)
}

pub fn write_replay(path: &Path, events: &[ReplayHitInfo]) -> Result<()> {
    let text = serde_json::to_string_pretty(events)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write replay {}", path.display()))
}

/// Replay events consumed frame by frame.
#[derive(Debug, Clone, Default)]
pub struct ReplayCursor {
    events: Vec<ReplayHitInfo>,
    next: usize,
}

impl ReplayCursor {
    pub fn new(mut events: Vec<ReplayHitInfo>) -> Self {
        sort_replay(&mut events);
        Self { events, next: 0 }
    }

    /// Every not-yet-consumed event with `time <= position`, in order.
    pub fn advance(&mut self, position: f64) -> &[ReplayHitInfo] {
        let start = self.next;
        while self
            .events
            .get(self.next)
            .is_some_and(|e| e.time <= position)
        {
            self.next += 1;
        }
        &self.events[start..self.next]
    }

    pub fn events(&self) -> &[ReplayHitInfo] {
        &self.events
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }
}
