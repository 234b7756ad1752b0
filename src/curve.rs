//! Time series shared by intensity, pitch and formant tracks.
//!
//! Statistics on scalar curves follow the interpolation conventions of the
//! Praat analysis objects the thresholds were tuned against: extrema are
//! refined with a parabola through the neighbouring samples, quantiles
//! interpolate linearly between sorted values and point lookups use a
//! four-point cubic.

use std::ops::Range;

use crate::error::{ProsodyError, Result};

/// Ordered samples `(time, value)` with strictly increasing times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<V> {
    times: Vec<f64>,
    values: Vec<V>,
}

/// Single-valued curve (intensity in dB, pitch in Hz).
pub type Curve = TimeSeries<f64>;

/// Three parallel formant tracks (F1, F2, F3); `NaN` marks a gap.
pub type FormantCurve = TimeSeries<[f64; 3]>;

/// How a curve value is read between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Linear,
    Cubic,
}

impl<V> TimeSeries<V> {
    pub fn new(times: Vec<f64>, values: Vec<V>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(ProsodyError::invalid_curve(format!(
                "{} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(bad) = times.iter().position(|t| !t.is_finite()) {
            return Err(ProsodyError::invalid_curve(format!(
                "non-finite time at index {bad}"
            )));
        }
        if let Some(idx) = times.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(ProsodyError::invalid_curve(format!(
                "time does not increase at index {} ({} -> {})",
                idx + 1,
                times[idx],
                times[idx + 1]
            )));
        }
        Ok(Self { times, values })
    }

    pub fn from_samples<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, V)>,
    {
        let (times, values) = samples.into_iter().unzip();
        Self::new(times, values)
    }

    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &V)> + '_ {
        self.times.iter().copied().zip(self.values.iter())
    }

    /// Fails with `InvalidCurve` when the series has no samples.
    pub fn ensure_not_empty(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Err(ProsodyError::invalid_curve(format!("{what} curve is empty")))
        } else {
            Ok(())
        }
    }

    /// Indices of samples with `|time - center| <= radius`.
    pub fn indices_within(&self, center: f64, radius: f64) -> Range<usize> {
        let start = self.times.partition_point(|&t| t < center - radius);
        let end = self.times.partition_point(|&t| t <= center + radius);
        start..end.max(start)
    }

    /// Fractional sample position of `time`, clamped to the sampled range.
    fn position_of(&self, time: f64) -> f64 {
        let last = self.times.len() - 1;
        if time <= self.times[0] {
            return 0.0;
        }
        if time >= self.times[last] {
            return last as f64;
        }
        let upper = self.times.partition_point(|&t| t <= time);
        let lower = upper - 1;
        let span = self.times[upper] - self.times[lower];
        lower as f64 + (time - self.times[lower]) / span
    }
}

impl Curve {
    /// Minimum over the whole curve with parabolic refinement of local minima.
    pub fn min_parabolic(&self) -> Result<f64> {
        self.ensure_not_empty("intensity")?;
        Ok(parabolic_extremum(&self.values, Extremum::Minimum))
    }

    /// Maximum over the whole curve with parabolic refinement of local maxima.
    pub fn max_parabolic(&self) -> Result<f64> {
        self.ensure_not_empty("intensity")?;
        Ok(parabolic_extremum(&self.values, Extremum::Maximum))
    }

    /// Quantile of the sample values, `q` in `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        self.ensure_not_empty("intensity")?;
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        Ok(sorted_quantile(&sorted, q))
    }

    pub fn value_at(&self, time: f64, interpolation: Interpolation) -> Result<f64> {
        self.ensure_not_empty("intensity")?;
        let position = self.position_of(time);
        Ok(match interpolation {
            Interpolation::Nearest => self.values[position.round() as usize],
            Interpolation::Linear => linear_at(&self.values, position),
            Interpolation::Cubic => cubic_at(&self.values, position),
        })
    }

    /// Lowest raw sample value with time in `[from, to]`.
    ///
    /// When no sample falls inside the range, the nearest samples to both
    /// range ends stand in for it.
    pub fn minimum_between(&self, from: f64, to: f64) -> Result<f64> {
        self.ensure_not_empty("intensity")?;
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let start = self.times.partition_point(|&t| t < from);
        let end = self.times.partition_point(|&t| t <= to);
        if start < end {
            return Ok(self.values[start..end]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min));
        }
        let left = self.value_at(from, Interpolation::Nearest)?;
        let right = self.value_at(to, Interpolation::Nearest)?;
        Ok(left.min(right))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extremum {
    Minimum,
    Maximum,
}

fn parabolic_extremum(values: &[f64], kind: Extremum) -> f64 {
    let better = |candidate: f64, best: f64| match kind {
        Extremum::Minimum => candidate < best,
        Extremum::Maximum => candidate > best,
    };
    let first = values[0];
    let last = values[values.len() - 1];
    let mut best = if better(last, first) { last } else { first };
    for window in values.windows(3) {
        let (left, mid, right) = (window[0], window[1], window[2]);
        let is_local = match kind {
            Extremum::Minimum => mid < left && mid <= right,
            Extremum::Maximum => mid > left && mid >= right,
        };
        if !is_local {
            continue;
        }
        let refined = parabola_vertex(left, mid, right);
        if better(refined, best) {
            best = refined;
        }
    }
    best
}

/// Value at the vertex of the parabola through three equidistant samples.
pub(crate) fn parabola_vertex(left: f64, mid: f64, right: f64) -> f64 {
    let curvature = left - 2.0 * mid + right;
    if curvature == 0.0 {
        return mid;
    }
    let slope = right - left;
    mid - slope * slope / (8.0 * curvature)
}

fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let place = q * n as f64 + 0.5;
    let left = place.floor();
    if left >= n as f64 {
        return sorted[n - 1];
    }
    if left < 1.0 {
        return sorted[0];
    }
    let index = left as usize - 1;
    let frac = place - left;
    sorted[index] + frac * (sorted[index + 1] - sorted[index])
}

pub(crate) fn linear_at(values: &[f64], position: f64) -> f64 {
    let last = values.len() - 1;
    let lower = (position.floor().max(0.0) as usize).min(last);
    let upper = (lower + 1).min(last);
    let frac = position - lower as f64;
    values[lower] * (1.0 - frac) + values[upper] * frac
}

/// Four-point Lagrange interpolation around `position`, edges clamped.
pub(crate) fn cubic_at(values: &[f64], position: f64) -> f64 {
    let last = values.len() as isize - 1;
    let base = position.floor() as isize;
    let frac = position - base as f64;
    if frac == 0.0 {
        return values[base.clamp(0, last) as usize];
    }
    let at = |offset: isize| values[(base + offset).clamp(0, last) as usize];
    let (y0, y1, y2, y3) = (at(-1), at(0), at(1), at(2));
    let f = frac;
    -y0 * f * (f - 1.0) * (f - 2.0) / 6.0 + y1 * (f + 1.0) * (f - 1.0) * (f - 2.0) / 2.0
        - y2 * (f + 1.0) * f * (f - 2.0) / 2.0
        + y3 * (f + 1.0) * f * (f - 1.0) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(values: &[f64], step: f64) -> Curve {
        Curve::from_samples(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64 * step, v)),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_increasing_times() {
        let err = Curve::new(vec![0.0, 0.2, 0.2], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ProsodyError::InvalidCurve(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(Curve::new(vec![0.0, 0.1], vec![1.0]).is_err());
    }

    #[test]
    fn parabolic_maximum_overshoots_between_samples() {
        let c = curve(&[0.0, 10.0, 10.0, 0.0], 0.1);
        // left=0, mid=10, right=10 -> 10 - 100 / (8 * -10)
        assert!((c.max_parabolic().unwrap() - 11.25).abs() < 1e-12);
    }

    #[test]
    fn endpoints_count_for_extrema() {
        let c = curve(&[5.0, 4.0, 3.0, 2.0], 0.1);
        assert_eq!(c.min_parabolic().unwrap(), 2.0);
        assert_eq!(c.max_parabolic().unwrap(), 5.0);
    }

    #[test]
    fn quantile_interpolates_sorted_values() {
        let c = curve(&[4.0, 1.0, 3.0, 2.0], 0.1);
        // place = 0.5 * 4 + 0.5 = 2.5 -> halfway between 2 and 3
        assert!((c.quantile(0.5).unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(c.quantile(0.99).unwrap(), 4.0);
        assert_eq!(c.quantile(0.0).unwrap(), 1.0);
    }

    #[test]
    fn cubic_hits_samples_and_follows_a_line() {
        let c = curve(&[0.0, 1.0, 2.0, 3.0, 4.0], 1.0);
        assert_eq!(c.value_at(2.0, Interpolation::Cubic).unwrap(), 2.0);
        assert!((c.value_at(1.25, Interpolation::Cubic).unwrap() - 1.25).abs() < 1e-12);
        assert_eq!(c.value_at(-3.0, Interpolation::Cubic).unwrap(), 0.0);
    }

    #[test]
    fn minimum_between_uses_samples_in_range() {
        let c = curve(&[5.0, 1.0, 4.0, 0.5, 6.0], 1.0);
        assert_eq!(c.minimum_between(0.0, 2.0).unwrap(), 1.0);
        assert_eq!(c.minimum_between(2.0, 0.0).unwrap(), 1.0);
        // no sample strictly inside (2.2, 2.7): nearest values at both ends
        assert_eq!(c.minimum_between(2.2, 2.7).unwrap(), 0.5);
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let c = curve(&[0.0, 0.0, 0.0, 0.0, 0.0], 0.5);
        assert_eq!(c.indices_within(1.0, 0.5), 1..4);
        assert_eq!(c.indices_within(10.0, 0.5), 5..5);
    }

    #[test]
    fn empty_curve_has_no_statistics() {
        let c = Curve::empty();
        assert!(matches!(
            c.max_parabolic(),
            Err(ProsodyError::InvalidCurve(_))
        ));
    }
}
