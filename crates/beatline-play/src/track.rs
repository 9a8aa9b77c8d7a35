// Per-lane note scheduling, input routing and scoring hand-off

use std::collections::VecDeque;

use beatline_model::NoteType;

use crate::arena::{Arena, Handle};
use crate::event::{PlayEvent, SoundCue, SoundIntent, TrackEvent};
use crate::judge::Judge;
use crate::note::{Note, NoteDesc, NoteSignal};
use crate::render::{DrawCommand, RenderContext};
use crate::session::Session;

pub type NoteHandle = Handle;

/// Notes processed per lane list each frame.
pub const MAX_OBJECTS_PER_LANE: usize = 500;

/// Clock values shared by every track in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub game_position: f64,
    pub track_position: f64,
    pub prebuffer: f64,
}

#[derive(Debug)]
pub struct GameTrack {
    lane: usize,
    x: f64,
    notes: Arena<Note>,
    /// Unresolved notes in chronological order.
    active: VecDeque<NoteHandle>,
    /// Resolved notes still on screen.
    inactive: Vec<NoteHandle>,
    current_hold: Option<NoteHandle>,
    key_sound: Option<SoundCue>,
    scratch: Vec<NoteSignal>,
    queued: Vec<(NoteHandle, NoteSignal)>,
}

impl GameTrack {
    pub fn new(lane: usize, x: f64) -> Self {
        Self {
            lane,
            x,
            notes: Arena::new(),
            active: VecDeque::new(),
            inactive: Vec::new(),
            current_hold: None,
            key_sound: None,
            scratch: Vec::new(),
            queued: Vec::new(),
        }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn note(&self, handle: NoteHandle) -> Option<&Note> {
        self.notes.get(handle)
    }

    pub fn active_notes(&self) -> impl Iterator<Item = &Note> {
        self.active.iter().filter_map(|&h| self.notes.get(h))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Notes ever created for this lane, live or retired.
    pub fn allocated_notes(&self) -> usize {
        self.notes.capacity()
    }

    /// The hold currently pressed, if it has not retired.
    pub fn current_hold(&self) -> Option<&Note> {
        self.current_hold.and_then(|h| self.notes.get(h))
    }

    pub fn key_sound(&self) -> Option<SoundCue> {
        self.key_sound
    }

    pub fn add_note(&mut self, desc: NoteDesc, session: &mut Session) -> NoteHandle {
        let (handle, note) = self.notes.acquire(Note::default);
        note.load(desc, self.x, &mut session.pool);
        if self.key_sound.is_none() {
            self.key_sound = note.sound();
        }
        self.active.push_back(handle);
        handle
    }

    fn retire(&mut self, handle: NoteHandle, session: &mut Session) {
        if let Some(note) = self.notes.get_mut(handle) {
            note.release(&mut session.pool);
        }
        self.notes.release(handle);
        if self.current_hold == Some(handle) {
            self.current_hold = None;
        }
    }

    // -----------------------------------------------------------------------
    // Per-frame update
    // -----------------------------------------------------------------------

    pub fn update(&mut self, frame: &FrameState, judge: &Judge, session: &mut Session) {
        for &handle in self.active.iter().take(MAX_OBJECTS_PER_LANE) {
            let Some(note) = self.notes.get_mut(handle) else {
                continue;
            };
            if note.is_passed() {
                continue;
            }
            if !note.is_drawable()
                && frame.track_position - note.initial_track_position() > frame.prebuffer
            {
                note.set_drawable();
            }
            if note.start_time() <= frame.game_position {
                self.key_sound = note.sound();
            }
            note.update(judge, frame.game_position, &mut self.scratch);
            self.queued
                .extend(self.scratch.drain(..).map(|signal| (handle, signal)));
        }
        self.flush_signals(session);

        let mut kept = VecDeque::with_capacity(self.active.len());
        while let Some(handle) = self.active.pop_front() {
            match self.notes.get(handle).map(|n| (n.is_passed(), n.is_removable())) {
                Some((true, _)) => self.inactive.push(handle),
                Some((_, true)) => self.retire(handle, session),
                Some(_) => kept.push_back(handle),
                None => {}
            }
        }
        self.active = kept;

        for &handle in self.inactive.iter().take(MAX_OBJECTS_PER_LANE) {
            if let Some(note) = self.notes.get_mut(handle)
                && !note.is_removable()
            {
                note.update(judge, frame.game_position, &mut self.scratch);
                self.queued
                    .extend(self.scratch.drain(..).map(|signal| (handle, signal)));
            }
        }
        self.flush_signals(session);

        let inactive = std::mem::take(&mut self.inactive);
        for handle in inactive {
            match self.notes.get(handle).map(Note::is_removable) {
                Some(true) => self.retire(handle, session),
                Some(false) => self.inactive.push(handle),
                None => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn on_key_down(&mut self, time: f64, judge: &Judge, session: &mut Session) {
        session.emit(PlayEvent::Track(TrackEvent::key(self.lane, true)));

        let mut matched = None;
        for &handle in &self.active {
            let Some(note) = self.notes.get_mut(handle) else {
                continue;
            };
            if note.is_passed() || note.is_removable() {
                continue;
            }
            let judgement = note.check_hit(judge, time);
            if judgement.accepted {
                note.on_hit(judgement.result, time, &mut self.scratch);
                self.queued
                    .extend(self.scratch.drain(..).map(|signal| (handle, signal)));
                matched = Some((handle, note.is_hold(), note.sound()));
                break;
            }
        }

        match matched {
            Some((handle, is_hold, sound)) => {
                if is_hold {
                    self.current_hold = Some(handle);
                }
                self.flush_signals(session);
                if let Some(cue) = sound {
                    session.emit(PlayEvent::Sound(SoundIntent::Play(cue)));
                }
            }
            None => {
                if let Some(cue) = self.key_sound {
                    session.emit(PlayEvent::Sound(SoundIntent::Play(cue)));
                }
            }
        }
    }

    pub fn on_key_up(&mut self, time: f64, judge: &Judge, session: &mut Session) {
        session.emit(PlayEvent::Track(TrackEvent::key(self.lane, false)));

        let mut released = false;
        for &handle in &self.active {
            let Some(note) = self.notes.get_mut(handle) else {
                continue;
            };
            if note.is_passed() || note.is_removable() {
                continue;
            }
            let judgement = note.check_release(judge, time);
            if judgement.accepted {
                note.on_release(judgement.result, time, &mut self.scratch);
                self.queued
                    .extend(self.scratch.drain(..).map(|signal| (handle, signal)));
                released = true;
                break;
            }
        }

        if released {
            self.current_hold = None;
            self.flush_signals(session);
        }
    }

    // -----------------------------------------------------------------------
    // Scoring hand-off
    // -----------------------------------------------------------------------

    /// Apply queued note signals in the order the notes raised them.
    fn flush_signals(&mut self, session: &mut Session) {
        let mut queued = std::mem::take(&mut self.queued);
        for (note, signal) in queued.drain(..) {
            match signal {
                NoteSignal::Score(info) => {
                    if !info.ignore {
                        let long = info.is_release || info.note_type == NoteType::Hold;
                        session.emit(PlayEvent::Track(TrackEvent::hit(
                            self.lane,
                            !info.is_release,
                            long,
                            note,
                        )));
                    }
                    let update = session.score.on_hit(info);
                    if let Some(reported) = update.reported {
                        session.emit(PlayEvent::Hit(reported));
                    }
                    if let Some(combo) = update.jam {
                        session.emit(PlayEvent::Jam { combo });
                    }
                }
                NoteSignal::Hold(result) => {
                    let combo = session.score.on_long_note_hold(result);
                    session.emit(PlayEvent::LongNote { combo });
                }
                NoteSignal::StopSound(index) => {
                    session.emit(PlayEvent::Sound(SoundIntent::Stop { index }));
                }
            }
        }
        self.queued = queued;
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn render(&self, ctx: &RenderContext, out: &mut Vec<DrawCommand>) {
        let active = self.active.iter().take(MAX_OBJECTS_PER_LANE);
        let inactive = self.inactive.iter().take(MAX_OBJECTS_PER_LANE);
        for &handle in active.chain(inactive) {
            if let Some(note) = self.notes.get(handle) {
                note.render(ctx, out);
            }
        }
    }

    /// Retire every note, returning visuals to the pool.
    pub fn clear(&mut self, session: &mut Session) {
        let handles: Vec<_> = self
            .active
            .drain(..)
            .chain(self.inactive.drain(..))
            .collect();
        for handle in handles {
            self.retire(handle, session);
        }
        self.current_hold = None;
    }
}
