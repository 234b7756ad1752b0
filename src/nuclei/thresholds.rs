use crate::curve::Curve;
use crate::error::Result;
use crate::types::ThresholdSet;

pub const DEFAULT_SILENCE_DB: f64 = -25.0;
const TOP_QUANTILE: f64 = 0.99;

/// Derives silence and peak thresholds from intensity statistics.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEstimator {
    silence_db: f64,
}

impl Default for ThresholdEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_DB)
    }
}

impl ThresholdEstimator {
    pub fn new(silence_db: f64) -> Self {
        Self { silence_db }
    }

    pub fn estimate(&self, intensity: &Curve) -> Result<ThresholdSet> {
        intensity.ensure_not_empty("intensity")?;
        let min_intensity = intensity.min_parabolic()?;
        let max_intensity = intensity.max_parabolic()?;
        let top = intensity.quantile(TOP_QUANTILE)?;

        let mut threshold = top + self.silence_db;
        let threshold2 = max_intensity - top;
        let threshold3 = self.silence_db - threshold2;
        if threshold < min_intensity {
            threshold = min_intensity;
        }
        Ok(ThresholdSet {
            threshold,
            threshold2,
            threshold3,
        })
    }
}
