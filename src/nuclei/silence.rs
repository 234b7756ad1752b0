use tracing::trace;

use crate::curve::Curve;
use crate::error::{ProsodyError, Result};
use crate::types::{Interval, IntervalLabel};

pub const DEFAULT_MIN_PAUSE: f64 = 0.3;
/// Sounding stretches shorter than this are folded back into silence.
pub const MIN_SOUNDING: f64 = 0.1;
const DURATION_TOLERANCE: f64 = 1e-9;

/// Splits an intensity contour into silent and sounding intervals.
#[derive(Debug, Clone, Copy)]
pub struct SilenceSegmenter {
    min_pause: f64,
    min_sounding: f64,
}

impl Default for SilenceSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PAUSE)
    }
}

impl SilenceSegmenter {
    pub fn new(min_pause: f64) -> Self {
        Self {
            min_pause,
            min_sounding: MIN_SOUNDING,
        }
    }

    /// Segments `intensity` over `[0, duration]`.
    ///
    /// `threshold3` is taken relative to the curve maximum; samples below
    /// `max + threshold3` (never lower than the curve minimum) are silent.
    pub fn segment(&self, intensity: &Curve, threshold3: f64, duration: f64) -> Result<Vec<Interval>> {
        intensity.ensure_not_empty("intensity")?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ProsodyError::InvalidDuration(duration));
        }
        let max = intensity.max_parabolic()?;
        let min = intensity.min_parabolic()?;
        let cutoff = (max - threshold3.abs()).max(min);
        trace!(cutoff, max, min, "silence cutoff");

        let runs = label_runs(intensity, cutoff, duration);
        let runs = relabel_short(runs, IntervalLabel::Silent, self.min_pause);
        Ok(relabel_short(runs, IntervalLabel::Sounding, self.min_sounding))
    }
}

fn label_runs(intensity: &Curve, cutoff: f64, duration: f64) -> Vec<Interval> {
    let label_of = |value: f64| {
        if value < cutoff {
            IntervalLabel::Silent
        } else {
            IntervalLabel::Sounding
        }
    };
    let times = intensity.times();
    let values = intensity.values();

    let mut runs = Vec::new();
    let mut start = 0.0;
    let mut label = label_of(values[0]);
    for idx in 1..values.len() {
        let next = label_of(values[idx]);
        if next == label {
            continue;
        }
        let boundary = ((times[idx - 1] + times[idx]) / 2.0).clamp(0.0, duration);
        push_run(&mut runs, start, boundary, label);
        start = boundary;
        label = next;
    }
    push_run(&mut runs, start, duration, label);
    runs
}

fn push_run(runs: &mut Vec<Interval>, start: f64, end: f64, label: IntervalLabel) {
    if end > start {
        runs.push(Interval { start, end, label });
    }
}

/// Flips `label` runs shorter than `min_duration` and merges equal neighbours.
/// A run without neighbours is left alone.
fn relabel_short(runs: Vec<Interval>, label: IntervalLabel, min_duration: f64) -> Vec<Interval> {
    if runs.len() < 2 {
        return runs;
    }
    let mut merged: Vec<Interval> = Vec::with_capacity(runs.len());
    for mut run in runs {
        if run.label == label && run.duration() < min_duration - DURATION_TOLERANCE {
            run.label = label.flipped();
        }
        match merged.last_mut() {
            Some(previous) if previous.label == run.label => previous.end = run.end,
            _ => merged.push(run),
        }
    }
    merged
}
