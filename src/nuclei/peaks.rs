//! Extremum detection on the intensity contour viewed as a waveform.

use std::f64::consts::PI;

use crate::curve::{cubic_at, Curve, Extremum, Interpolation};
use crate::error::{ProsodyError, Result};
use crate::types::PeakCandidate;

/// Interpolation depth used when refining extrema between samples.
pub const SINC_DEPTH: usize = 70;
const GOLDEN: f64 = 0.381_966_011_250_105;
const REFINE_TOLERANCE: f64 = 1e-6;
const REFINE_ITERATIONS: usize = 60;

/// Intensity contour resampled onto a uniform grid.
#[derive(Debug, Clone)]
pub struct DerivedSignal {
    start: f64,
    step: f64,
    samples: Vec<f64>,
}

impl DerivedSignal {
    /// Resamples `intensity` with `oversampling` grid points per mean frame step.
    pub fn from_curve(intensity: &Curve, oversampling: usize) -> Result<Self> {
        intensity.ensure_not_empty("intensity")?;
        let times = intensity.times();
        let start = times[0];
        if times.len() == 1 {
            return Ok(Self {
                start,
                step: 1.0,
                samples: intensity.values().to_vec(),
            });
        }
        let factor = oversampling.max(1);
        let frames = times.len() - 1;
        let step = (times[frames] - start) / (frames * factor) as f64;
        let samples = if factor == 1 {
            intensity.values().to_vec()
        } else {
            (0..=frames * factor)
                .map(|k| intensity.value_at(start + k as f64 * step, Interpolation::Cubic))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Self {
            start,
            step,
            samples,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn time_at(&self, position: f64) -> f64 {
        self.start + position * self.step
    }

    pub fn position_of(&self, time: f64) -> f64 {
        ((time - self.start) / self.step).clamp(0.0, (self.samples.len() - 1) as f64)
    }

    /// Cubic reading of the signal at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        cubic_at(&self.samples, self.position_of(time))
    }

    /// Windowed-sinc reading at a fractional sample position.
    pub fn sinc_at(&self, position: f64, max_depth: usize) -> f64 {
        interpolate_sinc(&self.samples, position, max_depth)
    }
}

/// Finds local extrema of the derived intensity signal.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    oversampling: usize,
    include_maxima: bool,
    include_minima: bool,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            oversampling: 1,
            include_maxima: true,
            include_minima: false,
        }
    }
}

impl PeakDetector {
    pub fn new(oversampling: usize) -> Self {
        Self {
            oversampling: oversampling.max(1),
            ..Self::default()
        }
    }

    pub fn with_extrema(mut self, include_maxima: bool, include_minima: bool) -> Self {
        self.include_maxima = include_maxima;
        self.include_minima = include_minima;
        self
    }

    /// Candidate times in `[0, duration]`, strictly increasing, with the
    /// derived-signal intensity at each.
    pub fn detect(&self, intensity: &Curve, duration: f64) -> Result<Vec<PeakCandidate>> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ProsodyError::InvalidDuration(duration));
        }
        let signal = DerivedSignal::from_curve(intensity, self.oversampling)?;
        let y = signal.samples();
        let mut candidates: Vec<PeakCandidate> = Vec::new();
        for i in 1..y.len().saturating_sub(1) {
            let kind = if self.include_maxima && y[i] > y[i - 1] && y[i] >= y[i + 1] {
                Extremum::Maximum
            } else if self.include_minima && y[i] < y[i - 1] && y[i] <= y[i + 1] {
                Extremum::Minimum
            } else {
                continue;
            };
            let position = refine_extremum(&signal, i, kind);
            let time = signal.time_at(position).clamp(0.0, duration);
            if candidates.last().is_some_and(|prev| time <= prev.time) {
                continue;
            }
            candidates.push(PeakCandidate {
                time,
                intensity: signal.value_at(time),
            });
        }
        Ok(candidates)
    }
}

/// Locates the extremum near sample `index` with sub-sample accuracy.
fn refine_extremum(signal: &DerivedSignal, index: usize, kind: Extremum) -> f64 {
    let y = signal.samples();
    let sign = match kind {
        Extremum::Maximum => -1.0,
        Extremum::Minimum => 1.0,
    };
    // parabolic vertex as a second opinion
    let (left, mid, right) = (y[index - 1], y[index], y[index + 1]);
    let curvature = left - 2.0 * mid + right;
    let guess = if curvature == 0.0 {
        index as f64
    } else {
        index as f64 + 0.5 * (left - right) / curvature
    };
    let objective = |x: f64| sign * signal.sinc_at(x, SINC_DEPTH);
    let lower = (index - 1) as f64;
    let upper = (index + 1) as f64;
    let refined = golden_section(&objective, lower, upper);

    // keep whichever of sinc search, parabola and raw sample scores best
    [refined, guess.clamp(lower, upper), index as f64]
        .into_iter()
        .min_by(|a, b| objective(*a).total_cmp(&objective(*b)))
        .unwrap_or(index as f64)
}

fn golden_section<F>(f: F, mut a: f64, mut b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let mut x1 = a + GOLDEN * (b - a);
    let mut x2 = b - GOLDEN * (b - a);
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    for _ in 0..REFINE_ITERATIONS {
        if (b - a).abs() < REFINE_TOLERANCE {
            break;
        }
        if f1 < f2 {
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = a + GOLDEN * (b - a);
            f1 = f(x1);
        } else {
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = b - GOLDEN * (b - a);
            f2 = f(x2);
        }
    }
    (a + b) / 2.0
}

/// Band-limited interpolation with a raised-cosine tapered sinc kernel.
pub fn interpolate_sinc(y: &[f64], x: f64, max_depth: usize) -> f64 {
    let n = y.len();
    if n == 0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return y[0];
    }
    if x >= (n - 1) as f64 {
        return y[n - 1];
    }
    let mid_left = x.floor() as usize;
    let mid_right = mid_left + 1;
    if x == mid_left as f64 {
        return y[mid_left];
    }
    let depth = max_depth.min(mid_left + 1).min(n - mid_right);
    if depth <= 1 {
        let frac = x - mid_left as f64;
        return y[mid_left] * (1.0 - frac) + y[mid_right] * frac;
    }
    let half_window = depth as f64 + 0.5;
    let weight = |phi: f64| {
        let taper = 0.5 + 0.5 * (PI * phi / half_window).cos();
        (PI * phi).sin() / (PI * phi) * taper
    };
    let mut result = 0.0;
    for i in (mid_left + 1 - depth)..=mid_left {
        result += y[i] * weight(x - i as f64);
    }
    for i in mid_right..(mid_right + depth) {
        result += y[i] * weight(i as f64 - x);
    }
    result
}
