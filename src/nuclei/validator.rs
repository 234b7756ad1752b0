use crate::curve::{Curve, Interpolation};
use crate::error::Result;
use crate::types::{NucleiScan, PeakCandidate};

pub const DEFAULT_MIN_DIP: f64 = 2.0;

/// Keeps the peaks separated from the following candidate by a deep enough valley.
#[derive(Debug, Clone, Copy)]
pub struct PeakValidator {
    min_dip: f64,
}

impl Default for PeakValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DIP)
    }
}

struct ScanState {
    time: f64,
    intensity: f64,
    scan: NucleiScan,
}

impl PeakValidator {
    pub fn new(min_dip: f64) -> Self {
        Self { min_dip }
    }

    /// Drops candidates not louder than `threshold`, then runs the dip scan.
    pub fn validate(
        &self,
        candidates: &[PeakCandidate],
        intensity: &Curve,
        threshold: f64,
    ) -> Result<NucleiScan> {
        let loud: Vec<PeakCandidate> = candidates
            .iter()
            .copied()
            .filter(|candidate| candidate.intensity > threshold)
            .collect();
        self.scan(&loud, intensity)
    }

    /// Walks consecutive candidate pairs.
    ///
    /// The valley is the lowest intensity between the reference point and the
    /// next candidate; candidate `p` is accepted when the reference loudness
    /// exceeds that valley by more than `min_dip`. The reference then moves to
    /// the next candidate, reading its loudness back from `intensity`. The last
    /// candidate is never judged on its own.
    pub fn scan(&self, candidates: &[PeakCandidate], intensity: &Curve) -> Result<NucleiScan> {
        let Some(first) = candidates.first() else {
            return Ok(NucleiScan::default());
        };
        intensity.ensure_not_empty("intensity")?;
        let initial = ScanState {
            time: first.time,
            intensity: first.intensity,
            scan: NucleiScan::default(),
        };
        let state = candidates
            .windows(2)
            .try_fold(initial, |mut state, pair| -> Result<ScanState> {
                let (peak, next) = (pair[0], pair[1]);
                let dip = intensity.minimum_between(state.time, next.time)?;
                if (state.intensity - dip).abs() > self.min_dip {
                    state.scan.count += 1;
                    state.scan.times.push(peak.time);
                }
                state.time = next.time;
                state.intensity = intensity.value_at(next.time, Interpolation::Cubic)?;
                Ok(state)
            })?;
        Ok(state.scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProsodyError;

    fn curve(values: &[f64], step: f64) -> Curve {
        Curve::from_samples(values.iter().enumerate().map(|(i, &v)| (i as f64 * step, v))).unwrap()
    }

    fn peak(time: f64, intensity: f64) -> PeakCandidate {
        PeakCandidate { time, intensity }
    }

    #[test]
    fn no_candidates_is_not_an_error() {
        let scan = PeakValidator::default()
            .validate(&[], &Curve::empty(), 40.0)
            .unwrap();
        assert_eq!(scan, NucleiScan::default());
    }

    #[test]
    fn single_candidate_is_never_counted() {
        let intensity = curve(&[40.0, 70.0, 40.0], 0.1);
        let scan = PeakValidator::default()
            .validate(&[peak(0.1, 70.0)], &intensity, 30.0)
            .unwrap();
        assert_eq!(scan.count, 0);
    }

    #[test]
    fn quiet_candidates_are_dropped_before_scanning() {
        let intensity = curve(&[40.0, 70.0, 30.0, 35.0, 30.0, 72.0, 30.0, 71.0, 40.0], 0.1);
        let candidates = [peak(0.1, 70.0), peak(0.3, 35.0), peak(0.5, 72.0), peak(0.7, 71.0)];
        let scan = PeakValidator::default()
            .validate(&candidates, &intensity, 50.0)
            .unwrap();
        // 0.1 -> 0.5 dips to 30, 0.5 -> 0.7 dips to 30
        assert_eq!(scan.count, 2);
        assert_eq!(scan.times, vec![0.1, 0.5]);
    }

    #[test]
    fn larger_min_dip_never_counts_more() {
        let values: Vec<f64> = (0..400)
            .map(|i| 60.0 + 9.0 * (i as f64 * 0.21).sin() + 4.0 * (i as f64 * 0.77).cos())
            .collect();
        let intensity = curve(&values, 0.01);
        let candidates: Vec<PeakCandidate> = (1..values.len() - 1)
            .filter(|&i| values[i] > values[i - 1] && values[i] >= values[i + 1])
            .map(|i| peak(i as f64 * 0.01, values[i]))
            .collect();
        assert!(candidates.len() > 10);

        let mut previous = usize::MAX;
        for step in 0..40 {
            let min_dip = step as f64 * 0.5;
            let count = PeakValidator::new(min_dip)
                .validate(&candidates, &intensity, 0.0)
                .unwrap()
                .count;
            assert!(count <= previous, "min_dip {min_dip} raised count to {count}");
            previous = count;
        }
    }

    #[test]
    fn candidates_need_an_intensity_curve() {
        let err = PeakValidator::default()
            .scan(&[peak(0.1, 60.0), peak(0.2, 62.0)], &Curve::empty())
            .unwrap_err();
        assert!(matches!(err, ProsodyError::InvalidCurve(_)));
    }
}
