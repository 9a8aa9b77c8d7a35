// Measure lines: built once per load, scrolled with the track

use std::collections::VecDeque;

use beatline_model::Chart;
use beatline_timing::TimingCurve;

use crate::render::{DrawCommand, LINE_VISIBLE_MARGIN, RenderContext, note_y};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingLineDesc {
    pub start_time: f64,
    /// Track position of the line.
    pub offset: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimingLineManager {
    pending: VecDeque<TimingLineDesc>,
    active: Vec<TimingLineDesc>,
}

/// Line times from each BPM segment's measure length, or the chart's own
/// measure list when it has one.
pub fn measure_times(chart: &Chart, length: f64) -> Vec<f64> {
    if !chart.custom_measures.is_empty() {
        return chart.custom_measures.clone();
    }

    let mut times = Vec::new();
    for (i, tp) in chart.bpms.iter().enumerate() {
        let interval = tp.measure_length();
        if !interval.is_finite() || interval <= 0.0 {
            continue;
        }
        let end = chart
            .bpms
            .get(i + 1)
            .map_or(length, |next| next.start_time)
            - 1.0;

        let mut time = tp.start_time;
        while time <= end {
            times.push(time);
            time += interval;
        }
    }
    times
}

impl TimingLineManager {
    pub fn new(chart: &Chart, curve: &TimingCurve, length: f64) -> Self {
        let mut lines: Vec<TimingLineDesc> = measure_times(chart, length)
            .into_iter()
            .map(|start_time| TimingLineDesc {
                start_time,
                offset: curve.offset_at(start_time),
            })
            .collect();
        lines.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        log::debug!("Built {} timing lines", lines.len());

        Self {
            pending: lines.into(),
            active: Vec::new(),
        }
    }

    /// Admit lines entering the prebuffer and drop lines scrolled past the
    /// bottom.
    pub fn update(
        &mut self,
        track_position: f64,
        game_position: f64,
        notespeed: f64,
        prebuffer: f64,
    ) {
        while let Some(line) = self.pending.front() {
            if track_position - line.offset <= prebuffer {
                break;
            }
            self.active.extend(self.pending.pop_front());
        }

        let recycle_after = (300_000.0 / 4.0) / notespeed;
        self.active.retain(|line| {
            !(track_position - line.offset > recycle_after && line.start_time < game_position)
        });
    }

    pub fn render(&self, ctx: &RenderContext, out: &mut Vec<DrawCommand>) {
        for line in &self.active {
            let y = note_y(ctx.track_position, line.offset, ctx.notespeed, ctx.hit_position);
            if y >= 0.0 && y < ctx.hit_position + LINE_VISIBLE_MARGIN {
                out.push(DrawCommand::TimingLine { y });
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
