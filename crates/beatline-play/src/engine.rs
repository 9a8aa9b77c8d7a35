// Gameplay engine: clock, note admission, input routing and frame output

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use beatline_model::{Chart, LANE_COUNT, LaneModifier, LaneRandom, Mirror, Rearrange};
use beatline_timing::TimingCurve;

use crate::autoplay::{ReplayCursor, ReplayHitInfo, ReplayHitKind, create_replay};
use crate::config::{ModConfig, NOTE_SPEED_MAX, NOTE_SPEED_MIN, PlayConfig};
use crate::error::PlayError;
use crate::event::{InputEvent, PlayEvent, SoundCue, SoundIntent};
use crate::judge::Judge;
use crate::lane_cover::LaneCover;
use crate::note::{HoldTail, Note, NoteDesc};
use crate::render::{DrawCommand, RenderContext, guide_line_length};
use crate::score::{ScoreManager, ScoreSnapshot};
use crate::session::Session;
use crate::timing_line::TimingLineManager;
use crate::track::{FrameState, GameTrack, NoteHandle};

/// Silence before the chart's own zero when play starts.
pub const LEAD_IN_MS: f64 = 3000.0;
/// Play ends this long after the chart length.
pub const END_GRACE_MS: f64 = 2500.0;
/// Largest clock advance applied in one frame.
pub const MAX_CLOCK_STEP_MS: f64 = 5000.0;
/// Notes are admitted this many ms (scaled by 1/notespeed) ahead.
const NOTE_ADMIT_MS: f64 = 3000.0;
const PREBUFFER_UNITS: f64 = 300_000.0;
const SCROLL_SPEED_STEP: i32 = 10;
const BASE_ASPECT: f64 = 16.0 / 9.0;
const NOTESPEED_SCALE: f64 = 1920.0 / 1366.0;

/// Lane x offsets relative to the configured lane offset.
const LANE_X: [f64; LANE_COUNT] = [5.0, 33.0, 55.0, 82.0, 114.0, 142.0, 164.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Preparing,
    NotGame,
    Playing,
    PostGame,
}

/// A keysound or background sample fired by the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledSample {
    time: f64,
    cue: SoundCue,
}

pub struct RhythmEngine {
    config: PlayConfig,
    state: GameState,
    chart: Chart,
    title: String,
    curve: TimingCurve,
    judge: Judge,
    tracks: Vec<GameTrack>,
    session: Session,
    timing_lines: TimingLineManager,
    lane_cover: Option<LaneCover>,

    notes: Vec<NoteDesc>,
    next_note: usize,
    samples: Vec<ScheduledSample>,
    next_sample: usize,
    replay: Option<ReplayCursor>,
    replay_frame: Vec<ReplayHitInfo>,

    input_tx: Sender<InputEvent>,
    input_rx: Receiver<InputEvent>,

    audio_position: f64,
    game_position: f64,
    track_position: f64,
    bpm_index: usize,
    sv_index: usize,
    current_bpm: f64,
    current_sv_multiplier: f64,
    audio_length: f64,
    scroll_speed: i32,
    rate: f64,
    game_resolution: (f64, f64),
    virtual_resolution: (f64, f64),
    image_index: u32,
    started_at: Option<Instant>,
    play_time: Duration,
}

fn apply_mods(chart: &mut Chart, mods: &ModConfig) -> Result<(), PlayError> {
    let mut modifier: Box<dyn LaneModifier> = if mods.mirror {
        Box::new(Mirror)
    } else if mods.random {
        let seed = mods.random_seed.unwrap_or_else(rand::random);
        Box::new(LaneRandom::new(seed))
    } else if let Some(lanes) = mods.rearrange {
        Box::new(Rearrange::new(lanes)?)
    } else {
        return Ok(());
    };
    chart.apply_mod(modifier.as_mut());
    Ok(())
}

fn select_judge(config: &PlayConfig) -> Judge {
    if !config.mods.static_judge {
        return Judge::BeatBased;
    }
    if config.legacy_ms_windows {
        log::debug!("Judge: legacy millisecond windows");
        Judge::legacy_ms_based()
    } else {
        Judge::ms_based()
    }
}

/// Display title, with the song rate when it is not 1x.
pub fn format_title(level: i32, title: &str, rate: f64) -> String {
    let title = format!("Lv.{level} {title}");
    if rate != 1.0 {
        format!("[{rate:.2}x] {title}")
    } else {
        title
    }
}

pub fn virtual_resolution(width: f64, height: f64) -> (f64, f64) {
    let ratio = width / height;
    if ratio >= BASE_ASPECT {
        (width * ratio, height)
    } else {
        (width, height / ratio)
    }
}

impl RhythmEngine {
    pub fn new(config: PlayConfig) -> Self {
        let mut config = config;
        config.validate();
        let (input_tx, input_rx) = mpsc::channel();
        let game_resolution = (
            f64::from(config.resolution.width),
            f64::from(config.resolution.height),
        );

        Self {
            state: GameState::Preparing,
            chart: Chart::default(),
            title: String::new(),
            curve: TimingCurve::from_chart(&Chart::default(), true),
            judge: Judge::default(),
            tracks: Vec::new(),
            session: Session::new(config.difficulty),
            timing_lines: TimingLineManager::default(),
            lane_cover: None,
            notes: Vec::new(),
            next_note: 0,
            samples: Vec::new(),
            next_sample: 0,
            replay: None,
            replay_frame: Vec::new(),
            input_tx,
            input_rx,
            audio_position: 0.0,
            game_position: 0.0,
            track_position: 0.0,
            bpm_index: 0,
            sv_index: 0,
            current_bpm: 0.0,
            current_sv_multiplier: 1.0,
            audio_length: 0.0,
            scroll_speed: config.note_speed,
            rate: config.song_rate,
            game_resolution,
            virtual_resolution: virtual_resolution(game_resolution.0, game_resolution.1),
            image_index: 0,
            started_at: None,
            play_time: Duration::ZERO,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load a prepared chart. A supplied replay drives input instead of the
    /// player, taking the place of generated autoplay.
    pub fn load(
        &mut self,
        chart: Chart,
        replay: Option<Vec<ReplayHitInfo>>,
    ) -> Result<(), PlayError> {
        if self.state != GameState::Preparing {
            return Err(PlayError::InvalidState {
                action: "load",
                state: self.state,
            });
        }
        chart.validate()?;
        if chart.base_bpm <= 0.0 {
            return Err(PlayError::UnpreparedChart);
        }

        let mut chart = chart;
        apply_mods(&mut chart, &self.config.mods)?;

        self.curve = TimingCurve::from_chart(&chart, self.config.mods.no_sv);
        self.judge = select_judge(&self.config);
        self.tracks = (0..LANE_COUNT)
            .map(|lane| GameTrack::new(lane, self.config.lane_offset + LANE_X[lane]))
            .collect();
        self.build_notes(&chart);
        self.audio_length = chart.length();
        self.timing_lines = TimingLineManager::new(&chart, &self.curve, self.audio_length);
        self.title = format_title(chart.level, &chart.title, self.rate);
        self.lane_cover = LaneCover::from_mods(self.config.mods.hidden, self.config.mods.flashlight);
        self.current_bpm = chart.bpms.first().map_or(0.0, |tp| tp.value);
        self.current_sv_multiplier = chart.initial_sv_multiplier;

        self.replay = match replay {
            Some(events) => {
                log::info!("Replay mode: {} events", events.len());
                Some(ReplayCursor::new(events))
            }
            None if self.config.mods.autoplay => {
                log::info!("Autoplay mode");
                Some(ReplayCursor::new(create_replay(&chart, &self.judge)))
            }
            None => None,
        };

        log::info!(
            "Loaded {}: {} notes, {} samples, base BPM {}, length {:.0} ms, judge {:?}",
            self.title,
            self.notes.len(),
            self.samples.len(),
            chart.base_bpm,
            self.audio_length,
            self.judge,
        );
        self.chart = chart;

        self.set_state(GameState::NotGame);
        self.update_game_position();
        self.update_notes();
        Ok(())
    }

    fn build_notes(&mut self, chart: &Chart) {
        let volume = self.config.audio_volume;
        let detach_keysounds = self.config.audio_offset != 0.0 || self.config.auto_sound;
        let cue = |index: u32, v: f32, pan: f32| SoundCue {
            index,
            volume: (f64::from(v) * volume).round() as i32,
            pan: (f64::from(pan) * 100.0).round() as i32,
        };

        let mut notes = Vec::with_capacity(chart.notes.len());
        let mut samples = Vec::new();
        for note in &chart.notes {
            let tail = note.is_hold().then(|| HoldTail {
                end_time: note.end_time,
                end_track_position: self.curve.offset_at(note.end_time),
                end_bpm: self.curve.bpm_at(note.end_time),
            });
            let mut sound = note.keysound.map(|index| cue(index, note.volume, note.pan));
            if detach_keysounds && let Some(cue) = sound.take() {
                samples.push(ScheduledSample {
                    time: note.start_time,
                    cue,
                });
            }
            notes.push(NoteDesc {
                lane: note.lane,
                start_time: note.start_time,
                start_bpm: self.curve.bpm_at(note.start_time),
                initial_track_position: self.curve.offset_at(note.start_time),
                tail,
                sound,
            });
        }
        for sample in &chart.auto_samples {
            samples.push(ScheduledSample {
                time: sample.start_time,
                cue: cue(sample.index, sample.volume, sample.pan),
            });
        }

        notes.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.end_time().total_cmp(&b.end_time()))
        });
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));

        self.notes = notes;
        self.next_note = 0;
        self.samples = samples;
        self.next_sample = 0;
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    fn set_state(&mut self, state: GameState) {
        if self.state != state {
            log::debug!("Engine state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.session.emit(PlayEvent::StateChanged(state));
        }
    }

    pub fn start(&mut self) -> Result<(), PlayError> {
        if self.state != GameState::NotGame {
            return Err(PlayError::InvalidState {
                action: "start",
                state: self.state,
            });
        }
        self.audio_position -= LEAD_IN_MS;
        self.bpm_index = 0;
        self.sv_index = 0;
        self.update_game_position();
        self.started_at = Some(Instant::now());
        self.set_state(GameState::Playing);
        log::info!("Play started: {}", self.title);
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == GameState::PostGame {
            return;
        }
        self.update_play_time();
        self.set_state(GameState::PostGame);
        log::info!(
            "Play stopped at {:.0} ms: {:?}",
            self.audio_position,
            self.session.score.snapshot()
        );
    }

    /// Loaded and waiting for [`start`](Self::start).
    pub fn is_ready(&self) -> bool {
        self.state == GameState::NotGame
    }

    // -----------------------------------------------------------------------
    // Frame update
    // -----------------------------------------------------------------------

    /// Advance by `delta` seconds of wall time.
    pub fn update(&mut self, delta: f64) {
        self.drain_input();
        if self.state != GameState::Playing {
            return;
        }

        let mut step = delta * self.rate * 1000.0;
        if !step.is_finite() || step < 0.0 {
            log::warn!("Ignoring clock step {step}");
            step = 0.0;
        } else if step > MAX_CLOCK_STEP_MS {
            log::warn!("Clock step {step:.0} ms clamped to {MAX_CLOCK_STEP_MS} ms");
            step = MAX_CLOCK_STEP_MS;
        }
        self.audio_position += step;

        if self.audio_position > self.audio_length + END_GRACE_MS {
            self.stop();
        }

        if (self.audio_position as i64) % 1000 == 0 {
            self.image_index = (self.image_index + 1) % self.config.note_frame_count.max(1);
        }

        self.virtual_resolution = virtual_resolution(self.game_resolution.0, self.game_resolution.1);
        self.update_game_position();
        self.update_notes();

        let notespeed = self.notespeed();
        let prebuffer = self.prebuffer();
        self.timing_lines
            .update(self.track_position, self.game_position, notespeed, prebuffer);

        let frame = FrameState {
            game_position: self.game_position,
            track_position: self.track_position,
            prebuffer,
        };
        for track in &mut self.tracks {
            track.update(&frame, &self.judge, &mut self.session);
        }

        self.play_samples();
        self.play_replay_frame();
        self.update_play_time();

        if self.state == GameState::Playing && self.session.score.is_failed() {
            log::info!("Life depleted at {:.0} ms", self.audio_position);
            self.stop();
        }
    }

    fn update_game_position(&mut self) {
        self.game_position = self.audio_position + self.config.audio_offset;

        let bpms = &self.chart.bpms;
        while self.bpm_index + 1 < bpms.len()
            && bpms[self.bpm_index + 1].start_time <= self.game_position
        {
            self.bpm_index += 1;
        }
        if let Some(tp) = bpms.get(self.bpm_index) {
            self.current_bpm = tp.value;
        }

        if self.curve.is_static() {
            self.current_sv_multiplier = 1.0;
        } else {
            let svs = &self.chart.svs;
            while self.sv_index < svs.len() && svs[self.sv_index].start_time <= self.game_position {
                self.sv_index += 1;
            }
            self.current_sv_multiplier = match self.sv_index {
                0 => self.chart.initial_sv_multiplier,
                i => svs[i - 1].value,
            };
        }

        self.track_position = self
            .curve
            .offset_at_hinted(self.game_position, self.sv_index);
    }

    fn update_notes(&mut self) {
        let notespeed = self.notespeed();
        let prebuffer = self.prebuffer();
        while let Some(desc) = self.notes.get(self.next_note) {
            let due = self.game_position + NOTE_ADMIT_MS / notespeed > desc.start_time
                || self.track_position - desc.initial_track_position > prebuffer;
            if !due {
                break;
            }
            if let Some(track) = self.tracks.get_mut(desc.lane) {
                track.add_note(*desc, &mut self.session);
            }
            self.next_note += 1;
        }
    }

    fn play_samples(&mut self) {
        while let Some(sample) = self.samples.get(self.next_sample) {
            if self.audio_position < sample.time {
                break;
            }
            self.session
                .emit(PlayEvent::Sound(SoundIntent::Play(sample.cue)));
            self.next_sample += 1;
        }
    }

    fn play_replay_frame(&mut self) {
        let Some(cursor) = self.replay.as_mut() else {
            return;
        };
        self.replay_frame.clear();
        self.replay_frame
            .extend_from_slice(cursor.advance(self.game_position));

        for hit in &self.replay_frame {
            let Some(track) = self.tracks.get_mut(hit.lane) else {
                log::warn!("Replay event on lane {} ignored", hit.lane);
                continue;
            };
            match hit.kind {
                ReplayHitKind::KeyDown => track.on_key_down(hit.time, &self.judge, &mut self.session),
                ReplayHitKind::KeyUp => track.on_key_up(hit.time, &self.judge, &mut self.session),
            }
        }
    }

    fn update_play_time(&mut self) {
        if let Some(started) = self.started_at {
            self.play_time = Duration::from_secs(started.elapsed().as_secs());
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Sender for input from other threads, applied at the next
    /// [`update`](Self::update).
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.input_tx.clone()
    }

    fn drain_input(&mut self) {
        while let Ok(event) = self.input_rx.try_recv() {
            if let Err(err) = self.handle_input(event) {
                log::warn!("Input {event:?} dropped: {err}");
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), PlayError> {
        match event {
            InputEvent::KeyDown(lane) => self.key_down(lane),
            InputEvent::KeyUp(lane) => self.key_up(lane),
            InputEvent::ScrollSpeedDown => {
                self.change_scroll_speed(-SCROLL_SPEED_STEP);
                Ok(())
            }
            InputEvent::ScrollSpeedUp => {
                self.change_scroll_speed(SCROLL_SPEED_STEP);
                Ok(())
            }
        }
    }

    /// Whether key input on `lane` reaches its track right now.
    fn accepts_key(&self, lane: usize) -> Result<bool, PlayError> {
        if lane >= LANE_COUNT {
            return Err(PlayError::LaneOutOfRange(lane));
        }
        Ok(self.state == GameState::Playing && self.replay.is_none() && lane < self.tracks.len())
    }

    /// Press `lane` at the current game position. Ignored outside play and
    /// while a replay drives input.
    pub fn key_down(&mut self, lane: usize) -> Result<(), PlayError> {
        if self.accepts_key(lane)? {
            self.tracks[lane].on_key_down(self.game_position, &self.judge, &mut self.session);
        }
        Ok(())
    }

    pub fn key_up(&mut self, lane: usize) -> Result<(), PlayError> {
        if self.accepts_key(lane)? {
            self.tracks[lane].on_key_up(self.game_position, &self.judge, &mut self.session);
        }
        Ok(())
    }

    fn change_scroll_speed(&mut self, step: i32) {
        self.scroll_speed = (self.scroll_speed + step).clamp(NOTE_SPEED_MIN, NOTE_SPEED_MAX);
        log::debug!("Scroll speed {}", self.scroll_speed);
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), PlayError> {
        if width == 0 || height == 0 {
            return Err(PlayError::InvalidResolution { width, height });
        }
        self.game_resolution = (f64::from(width), f64::from(height));
        self.virtual_resolution = virtual_resolution(self.game_resolution.0, self.game_resolution.1);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<PlayEvent> {
        self.session.drain_events()
    }

    pub fn render(&self) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        if self.state != GameState::Playing {
            return out;
        }

        let ctx = RenderContext {
            track_position: self.track_position,
            notespeed: self.notespeed(),
            hit_position: self.config.hit_position,
            guide_line_length: guide_line_length(self.config.guide_line_index),
            image_index: self.image_index,
        };
        self.timing_lines.render(&ctx, &mut out);
        for track in &self.tracks {
            track.render(&ctx, &mut out);
        }
        if let Some(cover) = self.lane_cover {
            out.push(cover.draw_command());
        }
        out
    }

    /// Scroll-space to screen scale for the current speed, rate and window.
    pub fn notespeed(&self) -> f64 {
        let speed = f64::from(self.scroll_speed);
        let (_, virtual_height) = self.virtual_resolution;
        let (_, game_height) = self.game_resolution;
        (speed / 10.0) / (20.0 * self.rate) * NOTESPEED_SCALE * (virtual_height / game_height)
    }

    /// Track-position distance ahead of the hit line at which objects load.
    pub fn prebuffer(&self) -> f64 {
        -PREBUFFER_UNITS / self.notespeed()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn judge(&self) -> Judge {
        self.judge
    }

    pub fn audio_position(&self) -> f64 {
        self.audio_position
    }

    pub fn game_position(&self) -> f64 {
        self.game_position
    }

    pub fn track_position(&self) -> f64 {
        self.track_position
    }

    pub fn current_bpm(&self) -> f64 {
        self.current_bpm
    }

    pub fn current_sv_multiplier(&self) -> f64 {
        self.current_sv_multiplier
    }

    pub fn audio_length(&self) -> f64 {
        self.audio_length
    }

    pub fn scroll_speed(&self) -> i32 {
        self.scroll_speed
    }

    pub fn song_rate(&self) -> f64 {
        self.rate
    }

    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn play_time(&self) -> Duration {
        self.play_time
    }

    pub fn is_autoplay(&self) -> bool {
        self.replay.is_some()
    }

    /// Autoplay or replay events still to be dispatched.
    pub fn pending_replay_events(&self) -> usize {
        self.replay.as_ref().map_or(0, ReplayCursor::remaining)
    }

    pub fn replay_events(&self) -> &[ReplayHitInfo] {
        self.replay
            .as_ref()
            .map(ReplayCursor::events)
            .unwrap_or_default()
    }

    pub fn score(&self) -> &ScoreManager {
        &self.session.score
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.session.score.snapshot()
    }

    pub fn track(&self, lane: usize) -> Option<&GameTrack> {
        self.tracks.get(lane)
    }

    pub fn note(&self, lane: usize, handle: NoteHandle) -> Option<&Note> {
        self.tracks.get(lane).and_then(|t| t.note(handle))
    }

    /// Notes not yet handed to a track.
    pub fn pending_notes(&self) -> usize {
        self.notes.len() - self.next_note
    }

    pub fn timing_lines(&self) -> &TimingLineManager {
        &self.timing_lines
    }
}

impl Drop for RhythmEngine {
    fn drop(&mut self) {
        for track in &mut self.tracks {
            track.clear(&mut self.session);
        }
        self.session.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatline_model::{AutoSample, NoteInfo, TimingInfo};

    use crate::judge::NoteResult;

    const STEP: f64 = 0.01;

    fn chart(notes: Vec<NoteInfo>) -> Chart {
        let mut chart = Chart::new(notes, vec![TimingInfo::bpm(0.0, 120.0)], Vec::new());
        chart.title = "Test".to_string();
        chart.level = 12;
        chart.prepare().unwrap();
        chart
    }

    fn started(config: PlayConfig, chart: Chart) -> RhythmEngine {
        let mut engine = RhythmEngine::new(config);
        engine.load(chart, None).unwrap();
        engine.start().unwrap();
        engine
    }

    fn run_until(engine: &mut RhythmEngine, position: f64) {
        while engine.game_position() < position && engine.state() == GameState::Playing {
            engine.update(STEP);
        }
    }

    fn hits(events: &[PlayEvent]) -> Vec<NoteResult> {
        events
            .iter()
            .filter_map(|e| match e {
                PlayEvent::Hit(info) => Some(info.result),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn title_carries_the_rate() {
        assert_eq!(format_title(12, "Song", 1.0), "Lv.12 Song");
        assert_eq!(format_title(12, "Song", 1.5), "[1.50x] Lv.12 Song");
    }

    #[test]
    fn virtual_resolution_follows_aspect() {
        let (w, h) = virtual_resolution(800.0, 600.0);
        assert_eq!(w, 800.0);
        assert!((h - 450.0).abs() < 1e-9);
        let (w, h) = virtual_resolution(1920.0, 1080.0);
        assert!((w - 1920.0 * 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(h, 1080.0);
    }

    #[test]
    fn load_rejects_unprepared_chart() {
        let mut engine = RhythmEngine::new(PlayConfig::default());
        let chart = Chart::new(
            vec![NoteInfo::normal(0, 1000.0)],
            vec![TimingInfo::bpm(0.0, 120.0)],
            Vec::new(),
        );
        assert_eq!(engine.load(chart, None), Err(PlayError::UnpreparedChart));
        assert_eq!(engine.state(), GameState::Preparing);
    }

    #[test]
    fn lifecycle_states() {
        let mut engine = RhythmEngine::new(PlayConfig::default());
        assert!(matches!(
            engine.start(),
            Err(PlayError::InvalidState { action: "start", .. })
        ));

        engine.load(chart(vec![NoteInfo::normal(0, 1000.0)]), None).unwrap();
        assert!(engine.is_ready());
        assert_eq!(engine.title(), "Lv.12 Test");

        engine.start().unwrap();
        assert_eq!(engine.state(), GameState::Playing);
        assert_eq!(engine.audio_position(), -LEAD_IN_MS);

        let events = engine.drain_events();
        assert!(events.contains(&PlayEvent::StateChanged(GameState::NotGame)));
        assert!(events.contains(&PlayEvent::StateChanged(GameState::Playing)));

        engine.stop();
        assert_eq!(engine.state(), GameState::PostGame);
        assert!(engine.load(chart(Vec::new()), None).is_err());
    }

    #[test]
    fn clock_advances_by_rate() {
        let config = PlayConfig {
            song_rate: 1.5,
            ..Default::default()
        };
        let mut engine = started(config, chart(vec![NoteInfo::normal(0, 1000.0)]));
        engine.update(0.1);
        assert!((engine.audio_position() - (-LEAD_IN_MS + 150.0)).abs() < 1e-9);
    }

    #[test]
    fn large_clock_step_is_clamped() {
        let mut engine = started(
            PlayConfig::default(),
            chart(vec![NoteInfo::normal(0, 60_000.0)]),
        );
        engine.update(30.0);
        assert_eq!(engine.audio_position(), -LEAD_IN_MS + MAX_CLOCK_STEP_MS);
    }

    #[test]
    fn audio_offset_shifts_game_position() {
        let config = PlayConfig {
            audio_offset: 40.0,
            ..Default::default()
        };
        let mut engine = started(config, chart(vec![NoteInfo::normal(0, 1000.0)]));
        engine.update(0.5);
        assert_eq!(engine.game_position(), engine.audio_position() + 40.0);
    }

    #[test]
    fn pressing_on_time_scores_cool() {
        let mut engine = started(
            PlayConfig::default(),
            chart(vec![NoteInfo::normal(3, 1000.0)]),
        );
        run_until(&mut engine, 1000.0);
        engine.drain_events();

        engine.key_down(3).unwrap();
        engine.key_up(3).unwrap();
        assert_eq!(hits(&engine.drain_events()), vec![NoteResult::Cool]);
        assert_eq!(engine.snapshot().cool, 1);
    }

    #[test]
    fn key_input_checks_the_lane() {
        let mut engine = started(
            PlayConfig::default(),
            chart(vec![NoteInfo::normal(0, 1000.0)]),
        );
        assert_eq!(engine.key_down(7), Err(PlayError::LaneOutOfRange(7)));
    }

    #[test]
    fn queued_input_applies_on_next_update() {
        let mut engine = started(
            PlayConfig::default(),
            chart(vec![NoteInfo::normal(1, 1000.0)]),
        );
        run_until(&mut engine, 990.0);
        engine.drain_events();

        let tx = engine.input_sender();
        std::thread::spawn(move || {
            tx.send(InputEvent::KeyDown(1)).unwrap();
            tx.send(InputEvent::ScrollSpeedUp).unwrap();
        })
        .join()
        .unwrap();

        engine.update(STEP);
        assert_eq!(hits(&engine.drain_events()), vec![NoteResult::Cool]);
        assert_eq!(engine.scroll_speed(), 190);
    }

    #[test]
    fn unplayed_notes_miss_and_play_ends() {
        let mut engine = started(
            PlayConfig::default(),
            chart(vec![NoteInfo::normal(0, 1000.0), NoteInfo::normal(6, 1200.0)]),
        );
        let mut events = Vec::new();
        while engine.state() == GameState::Playing {
            engine.update(STEP);
            events.extend(engine.drain_events());
        }
        assert_eq!(hits(&events), vec![NoteResult::Miss, NoteResult::Miss]);
        assert_eq!(engine.snapshot().miss, 2);
        assert!(engine.audio_position() > engine.audio_length() + END_GRACE_MS);
    }

    #[test]
    fn autoplay_ignores_player_keys() {
        let config = PlayConfig {
            mods: ModConfig {
                autoplay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut engine = started(config, chart(vec![NoteInfo::normal(2, 1000.0)]));
        assert!(engine.is_autoplay());
        assert_eq!(engine.pending_replay_events(), 2);

        run_until(&mut engine, 500.0);
        engine.key_down(2).unwrap();
        run_until(&mut engine, 1100.0);
        assert_eq!(hits(&engine.drain_events()), vec![NoteResult::Cool]);
        assert_eq!(engine.pending_replay_events(), 0);
    }

    #[test]
    fn auto_samples_fire_in_order() {
        let mut c = chart(vec![NoteInfo::normal(0, 2000.0)]);
        c.auto_samples = vec![
            AutoSample {
                start_time: 500.0,
                index: 7,
                volume: 0.5,
                pan: -0.25,
            },
            AutoSample {
                start_time: 100.0,
                index: 3,
                volume: 1.0,
                pan: 0.0,
            },
        ];
        let mut engine = started(PlayConfig::default(), c);
        run_until(&mut engine, 600.0);

        let played: Vec<SoundCue> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                PlayEvent::Sound(SoundIntent::Play(cue)) => Some(cue),
                _ => None,
            })
            .collect();
        assert_eq!(
            played,
            vec![
                SoundCue {
                    index: 3,
                    volume: 100,
                    pan: 0
                },
                SoundCue {
                    index: 7,
                    volume: 50,
                    pan: -25
                },
            ]
        );
    }

    #[test]
    fn keysounds_detach_with_auto_sound() {
        let config = PlayConfig {
            auto_sound: true,
            ..Default::default()
        };
        let mut engine = RhythmEngine::new(config);
        engine
            .load(chart(vec![NoteInfo::normal(0, 1000.0).with_keysound(4)]), None)
            .unwrap();
        assert_eq!(engine.track(0).unwrap().key_sound(), None);
    }

    #[test]
    fn failing_on_normal_stops_play() {
        let notes = (0..40).map(|i| NoteInfo::normal(0, 1000.0 + f64::from(i) * 100.0)).collect();
        let config = PlayConfig {
            difficulty: crate::score::Difficulty::Normal,
            ..Default::default()
        };
        let mut engine = started(config, chart(notes));
        while engine.state() == GameState::Playing {
            engine.update(STEP);
        }
        assert!(engine.score().is_failed());
        assert_eq!(engine.state(), GameState::PostGame);
        assert!(engine.audio_position() < engine.audio_length());
    }

    #[test]
    fn render_is_empty_before_start() {
        let mut engine = RhythmEngine::new(PlayConfig::default());
        engine.load(chart(vec![NoteInfo::normal(0, 1000.0)]), None).unwrap();
        assert!(engine.render().is_empty());
        engine.start().unwrap();
        run_until(&mut engine, 900.0);
        assert!(
            engine
                .render()
                .iter()
                .any(|c| matches!(c, DrawCommand::Head { lane: 0, .. }))
        );
    }

    #[test]
    fn resolution_must_be_non_zero() {
        let mut engine = RhythmEngine::new(PlayConfig::default());
        assert_eq!(
            engine.set_resolution(0, 600),
            Err(PlayError::InvalidResolution {
                width: 0,
                height: 600
            })
        );
        engine.set_resolution(1920, 1080).unwrap();
    }
}
