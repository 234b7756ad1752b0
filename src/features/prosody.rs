use crate::curve::{Curve, FormantCurve};
use crate::types::ProsodyFrame;

pub const DEFAULT_WINDOW_RADIUS: f64 = 0.1;

/// Averages the formant tracks around every voiced pitch sample.
#[derive(Debug, Clone, Copy)]
pub struct ProsodyAligner {
    window_radius: f64,
}

impl Default for ProsodyAligner {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_RADIUS)
    }
}

impl ProsodyAligner {
    pub fn new(window_radius: f64) -> Self {
        Self { window_radius }
    }

    /// One frame per pitch time whose window holds a finite value on all
    /// three formant tracks; other pitch times are skipped.
    pub fn align(&self, pitch: &Curve, formants: &FormantCurve) -> Vec<ProsodyFrame> {
        pitch
            .times()
            .iter()
            .filter_map(|&time| self.frame_at(time, formants))
            .collect()
    }

    fn frame_at(&self, time: f64, formants: &FormantCurve) -> Option<ProsodyFrame> {
        let window = &formants.values()[formants.indices_within(time, self.window_radius)];
        let f1 = channel_mean(window, 0)?;
        let f2 = channel_mean(window, 1)?;
        let f3 = channel_mean(window, 2)?;
        Some(ProsodyFrame { time, f1, f2, f3 })
    }
}

fn channel_mean(window: &[[f64; 3]], channel: usize) -> Option<f64> {
    let (sum, count) = window
        .iter()
        .map(|values| values[channel])
        .filter(|value| !value.is_nan())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
