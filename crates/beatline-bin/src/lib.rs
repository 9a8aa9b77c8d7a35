// Headless simulation: chart loading and a fixed-step engine run

use std::path::Path;

use anyhow::{Context, Result, bail};
use beatline_model::Chart;
use beatline_play::{
    GameState, NoteResult, PlayConfig, PlayEvent, ReplayHitInfo, RhythmEngine, ScoreSnapshot,
};
use serde::Serialize;

/// Default frame step: 240 updates per second.
pub const DEFAULT_STEP_MS: f64 = 1000.0 / 240.0;

/// Read a chart JSON file and run chart preparation on it.
pub fn load_chart(path: &Path) -> Result<Chart> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chart {}", path.display()))?;
    let mut chart: Chart = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse chart {}", path.display()))?;
    chart
        .prepare()
        .with_context(|| format!("Invalid chart {}", path.display()))?;
    Ok(chart)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitCounts {
    pub cool: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl HitCounts {
    fn record(&mut self, result: NoteResult) {
        match result {
            NoteResult::Cool => self.cool += 1,
            NoteResult::Good => self.good += 1,
            NoteResult::Bad => self.bad += 1,
            NoteResult::Miss => self.miss += 1,
        }
    }
}

/// Outcome of one simulated play.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub title: String,
    pub snapshot: ScoreSnapshot,
    /// Judgements as reported to the host, after pill conversion.
    pub reported: HitCounts,
    pub life: f32,
    pub failed: bool,
    pub frames: u64,
    pub end_position: f64,
    #[serde(skip)]
    pub replay: Vec<ReplayHitInfo>,
}

/// Run a whole play at `step_ms` per frame, feeding input only from the
/// replay (or autoplay when the config asks for it).
pub fn simulate(
    chart: Chart,
    config: PlayConfig,
    replay: Option<Vec<ReplayHitInfo>>,
    step_ms: f64,
) -> Result<SimulationReport> {
    if !step_ms.is_finite() || step_ms <= 0.0 {
        bail!("Frame step must be a positive number of milliseconds, got {step_ms}");
    }

    let mut engine = RhythmEngine::new(config);
    engine.load(chart, replay)?;
    engine.start()?;
    if engine.is_autoplay() {
        log::info!("Autoplay: {} input events", engine.replay_events().len());
    } else {
        log::info!("No input source; every note will miss");
    }

    let mut reported = HitCounts::default();
    let mut frames = 0u64;
    let delta = step_ms / 1000.0;
    while engine.state() == GameState::Playing {
        engine.update(delta);
        frames += 1;
        for event in engine.drain_events() {
            if let PlayEvent::Hit(info) = event {
                reported.record(info.result);
            }
        }
    }
    log::info!(
        "Finished {} after {} frames at {:.0} ms",
        engine.title(),
        frames,
        engine.audio_position()
    );

    Ok(SimulationReport {
        title: engine.title().to_string(),
        snapshot: engine.snapshot(),
        reported,
        life: engine.score().life(),
        failed: engine.score().is_failed(),
        frames,
        end_position: engine.audio_position(),
        replay: engine.replay_events().to_vec(),
    })
}
