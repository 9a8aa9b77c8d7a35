// Playable note: per-note judgement state machine and draw output

use beatline_model::NoteType;

use crate::event::{NoteHitInfo, SoundCue};
use crate::judge::{HoldResult, Judge, Judgement, NoteResult};
use crate::note_pool::{NoteImageType, NoteVisualPool, VisualHandle};
use crate::render::{
    DrawCommand, RenderContext, TrailDirection, is_note_visible, note_y, span_is_visible,
};

/// Interval between hold-body score ticks in milliseconds.
pub const HOLD_TICK_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoteState {
    NormalNote,
    NormalNotePassed,
    HoldPre,
    HoldOnHolding,
    HoldMissedActive,
    HoldPassed,
    #[default]
    DoRemove,
}

/// Hold tail timing resolved at load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldTail {
    pub end_time: f64,
    pub end_track_position: f64,
    pub end_bpm: f64,
}

/// Everything a track needs to build a [`Note`], expanded once per load.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoteDesc {
    pub lane: usize,
    pub start_time: f64,
    pub start_bpm: f64,
    pub initial_track_position: f64,
    pub tail: Option<HoldTail>,
    pub sound: Option<SoundCue>,
}

impl NoteDesc {
    pub fn note_type(&self) -> NoteType {
        if self.tail.is_some() {
            NoteType::Hold
        } else {
            NoteType::Normal
        }
    }

    /// Tail time for holds; taps sort ahead of holds at the same start.
    pub fn end_time(&self) -> f64 {
        self.tail.map_or(f64::NEG_INFINITY, |t| t.end_time)
    }
}

/// Side effects a note asks its track to carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteSignal {
    Score(NoteHitInfo),
    Hold(HoldResult),
    StopSound(u32),
}

#[derive(Debug, Default)]
struct NoteVisuals {
    head: Option<VisualHandle>,
    tail: Option<VisualHandle>,
    body: Option<VisualHandle>,
    trail_up: Option<VisualHandle>,
    trail_down: Option<VisualHandle>,
}

impl NoteVisuals {
    fn take_all(&mut self) -> impl Iterator<Item = VisualHandle> {
        [
            self.head.take(),
            self.tail.take(),
            self.body.take(),
            self.trail_up.take(),
            self.trail_down.take(),
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Default)]
pub struct Note {
    desc: NoteDesc,
    x: f64,
    state: NoteState,
    visuals: NoteVisuals,
    drawable: bool,
    ignore: bool,
    hit_result: NoteResult,
    last_score_time: Option<f64>,
}

impl Note {
    /// Reset this (possibly recycled) note to `desc` and borrow its visuals.
    pub fn load(&mut self, desc: NoteDesc, x: f64, pool: &mut NoteVisualPool) {
        self.release(pool);

        let head_type = NoteImageType::lane(desc.lane);
        self.visuals.head = Some(pool.depool(head_type));
        self.visuals.trail_up = Some(pool.depool(NoteImageType::TrailUp));
        self.visuals.trail_down = Some(pool.depool(NoteImageType::TrailDown));
        self.state = match desc.tail {
            Some(_) => {
                self.visuals.tail = Some(pool.depool(head_type));
                self.visuals.body = Some(pool.depool(NoteImageType::hold_lane(desc.lane)));
                NoteState::HoldPre
            }
            None => NoteState::NormalNote,
        };

        self.desc = desc;
        self.x = x;
        self.drawable = false;
        self.ignore = true;
        self.hit_result = NoteResult::Miss;
        self.last_score_time = None;
    }

    /// Return visuals to the pool and mark the note removable.
    pub fn release(&mut self, pool: &mut NoteVisualPool) {
        for visual in self.visuals.take_all() {
            pool.repool(visual);
        }
        self.state = NoteState::DoRemove;
    }

    pub fn desc(&self) -> &NoteDesc {
        &self.desc
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn note_type(&self) -> NoteType {
        self.desc.note_type()
    }

    pub fn is_hold(&self) -> bool {
        self.desc.tail.is_some()
    }

    pub fn lane(&self) -> usize {
        self.desc.lane
    }

    pub fn start_time(&self) -> f64 {
        self.desc.start_time
    }

    pub fn initial_track_position(&self) -> f64 {
        self.desc.initial_track_position
    }

    pub fn sound(&self) -> Option<SoundCue> {
        self.desc.sound
    }

    pub fn hit_result(&self) -> NoteResult {
        self.hit_result
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn is_drawable(&self) -> bool {
        self.drawable
    }

    pub fn set_drawable(&mut self) {
        self.drawable = true;
    }

    pub fn is_passed(&self) -> bool {
        matches!(
            self.state,
            NoteState::NormalNotePassed | NoteState::HoldPassed
        )
    }

    pub fn is_removable(&self) -> bool {
        self.state == NoteState::DoRemove
    }

    /// Time the next judgement targets: the head until it is pressed, then
    /// the tail.
    pub fn hit_time(&self) -> f64 {
        match (self.state, self.desc.tail) {
            (NoteState::HoldPre, _) | (_, None) => self.desc.start_time,
            (_, Some(tail)) => tail.end_time,
        }
    }

    /// Tempo used to size the windows for [`hit_time`](Self::hit_time).
    pub fn bpm_time(&self) -> f64 {
        match (self.state, self.desc.tail) {
            (NoteState::HoldPre, _) | (_, None) => self.desc.start_bpm,
            (_, Some(tail)) => tail.end_bpm,
        }
    }

    fn hit_info(&self, result: NoteResult, time: f64, is_release: bool) -> NoteHitInfo {
        NoteHitInfo {
            lane: self.desc.lane,
            result,
            note_type: self.note_type(),
            offset: self.hit_time() - time,
            is_release,
            ignore: self.ignore,
        }
    }

    // -----------------------------------------------------------------------
    // Per-frame update
    // -----------------------------------------------------------------------

    pub fn update(&mut self, judge: &Judge, time: f64, out: &mut Vec<NoteSignal>) {
        match self.state {
            NoteState::NormalNote | NoteState::NormalNotePassed => {
                if judge.is_missed(self.hit_time(), self.bpm_time(), time) {
                    if self.state == NoteState::NormalNote {
                        self.on_hit(NoteResult::Miss, time, out);
                    }
                    self.state = NoteState::DoRemove;
                }
            }
            NoteState::HoldPre => {
                if judge.is_missed(self.hit_time(), self.bpm_time(), time) {
                    self.on_hit(NoteResult::Miss, time, out);
                }
            }
            NoteState::HoldOnHolding | NoteState::HoldMissedActive | NoteState::HoldPassed => {
                if self.state == NoteState::HoldOnHolding {
                    self.tick_hold(time, out);
                }
                if judge.is_missed(self.hit_time(), self.bpm_time(), time) {
                    if self.state == NoteState::HoldOnHolding {
                        self.on_release(NoteResult::Miss, time, out);
                    }
                    self.state = NoteState::DoRemove;
                }
            }
            NoteState::DoRemove => {}
        }
    }

    fn tick_hold(&mut self, time: f64, out: &mut Vec<NoteSignal>) {
        let (Some(last), Some(tail)) = (self.last_score_time, self.desc.tail) else {
            return;
        };
        if time > self.desc.start_time && time <= tail.end_time && time - last > HOLD_TICK_MS {
            self.last_score_time = Some(last + HOLD_TICK_MS);
            out.push(NoteSignal::Hold(HoldResult::HoldAdd));
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Judge a press at `time`. Only unhit taps, unpressed hold heads, and
    /// broken holds take presses.
    pub fn check_hit(&mut self, judge: &Judge, time: f64) -> Judgement {
        match self.state {
            NoteState::NormalNote | NoteState::HoldPre | NoteState::HoldMissedActive => {
                let judgement = judge.calculate_result(self.hit_time(), self.bpm_time(), time);
                if judgement.accepted {
                    self.ignore = false;
                }
                judgement
            }
            _ => Judgement::REJECTED,
        }
    }

    /// Judge a release at `time`.
    ///
    /// Letting go of a held note outside the window is still consumed, as a
    /// MISS. A broken hold released in the window scores BAD.
    pub fn check_release(&self, judge: &Judge, time: f64) -> Judgement {
        match self.state {
            NoteState::HoldOnHolding | NoteState::HoldMissedActive => {
                let judgement = judge.calculate_result(self.hit_time(), self.bpm_time(), time);
                match (judgement.accepted, self.state) {
                    (true, NoteState::HoldMissedActive) => Judgement {
                        accepted: true,
                        result: NoteResult::Bad,
                    },
                    (true, _) => judgement,
                    (false, NoteState::HoldOnHolding) => Judgement {
                        accepted: true,
                        result: NoteResult::Miss,
                    },
                    (false, _) => Judgement::REJECTED,
                }
            }
            _ => Judgement::REJECTED,
        }
    }

    pub fn on_hit(&mut self, result: NoteResult, time: f64, out: &mut Vec<NoteSignal>) {
        match self.state {
            NoteState::HoldPre => {
                let info = self.hit_info(result, time, false);
                self.last_score_time = Some(time);
                self.hit_result = result;
                if result == NoteResult::Miss {
                    self.state = NoteState::HoldMissedActive;
                    out.push(NoteSignal::Hold(HoldResult::HoldBreak));
                } else {
                    self.state = NoteState::HoldOnHolding;
                    out.push(NoteSignal::Hold(HoldResult::HoldAdd));
                }
                out.push(NoteSignal::Score(info));
            }
            NoteState::HoldMissedActive => {
                let info = self.hit_info(NoteResult::Bad, time, true);
                self.hit_result = NoteResult::Bad;
                self.state = NoteState::HoldPassed;
                out.push(NoteSignal::Hold(HoldResult::HoldBreak));
                out.push(NoteSignal::Score(info));
            }
            NoteState::NormalNote => {
                let info = self.hit_info(result, time, false);
                self.hit_result = result;
                self.state = NoteState::NormalNotePassed;
                out.push(NoteSignal::Score(info));
            }
            _ => {}
        }
    }

    pub fn on_release(&mut self, result: NoteResult, time: f64, out: &mut Vec<NoteSignal>) {
        if !matches!(
            self.state,
            NoteState::HoldOnHolding | NoteState::HoldMissedActive
        ) {
            return;
        }

        let info = self.hit_info(result, time, true);
        self.last_score_time = None;
        self.hit_result = result;
        if result == NoteResult::Miss {
            if let Some(sound) = self.desc.sound {
                out.push(NoteSignal::StopSound(sound.index));
            }
            self.state = NoteState::HoldMissedActive;
            out.push(NoteSignal::Hold(HoldResult::HoldBreak));
        } else {
            self.state = NoteState::HoldPassed;
        }
        out.push(NoteSignal::Score(info));
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn render(&self, ctx: &RenderContext, out: &mut Vec<DrawCommand>) {
        if self.is_removable() || !self.drawable {
            return;
        }

        let lane = self.desc.lane;
        let head_y = note_y(
            ctx.track_position,
            self.desc.initial_track_position,
            ctx.notespeed,
            ctx.hit_position,
        );

        if let (Some(tail), Some(tail_visual), Some(body)) =
            (self.desc.tail, self.visuals.tail, self.visuals.body)
        {
            let tail_y = note_y(
                ctx.track_position,
                tail.end_track_position,
                ctx.notespeed,
                ctx.hit_position,
            );
            let tint = if self.state == NoteState::HoldOnHolding
                && self.hit_result >= NoteResult::Good
            {
                1.0
            } else {
                0.9
            };

            if span_is_visible(tail_y, head_y, ctx.hit_position) {
                out.push(DrawCommand::Body {
                    lane,
                    visual: body,
                    x: self.x,
                    top: tail_y,
                    bottom: head_y,
                    tint,
                    frame: ctx.image_index,
                });
            }
            if is_note_visible(tail_y, ctx.hit_position) {
                self.push_trail(ctx, self.visuals.trail_up, tail_y, TrailDirection::Up, out);
                out.push(DrawCommand::Head {
                    lane,
                    visual: tail_visual,
                    x: self.x,
                    y: tail_y,
                    frame: ctx.image_index,
                });
            }
        }

        if let Some(head) = self.visuals.head
            && is_note_visible(head_y, ctx.hit_position)
        {
            self.push_trail(ctx, self.visuals.trail_down, head_y, TrailDirection::Down, out);
            out.push(DrawCommand::Head {
                lane,
                visual: head,
                x: self.x,
                y: head_y,
                frame: ctx.image_index,
            });
        }
    }

    fn push_trail(
        &self,
        ctx: &RenderContext,
        visual: Option<VisualHandle>,
        y: f64,
        direction: TrailDirection,
        out: &mut Vec<DrawCommand>,
    ) {
        if ctx.guide_line_length <= 0.0 {
            return;
        }
        if let Some(visual) = visual {
            out.push(DrawCommand::Trail {
                lane: self.desc.lane,
                visual,
                x: self.x,
                y,
                length: ctx.guide_line_length,
                direction,
            });
        }
    }
}
