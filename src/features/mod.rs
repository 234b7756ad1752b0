//! Per-recording feature extraction.

pub mod prosody;

use std::path::Path;

use tracing::debug;

use crate::acoustics::AcousticCurveProvider;
use crate::config::AnalysisConfig;
use crate::curve::Curve;
use crate::error::{ProsodyError, Result};
use crate::nuclei::{rate, PeakDetector, PeakValidator, SilenceSegmenter, ThresholdEstimator};
use crate::types::{FeatureRecord, Interval, NucleiScan, ThresholdSet};

pub use prosody::ProsodyAligner;

/// Everything derived from the intensity contour alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RateAnalysis {
    pub thresholds: ThresholdSet,
    pub intervals: Vec<Interval>,
    pub nuclei: NucleiScan,
    pub speaking_time: f64,
    pub speech_rate: f64,
    pub articulation_rate: Option<f64>,
}

/// Runs the analysis stages in order and assembles a [`FeatureRecord`].
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: AnalysisConfig,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl FeatureExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn extract<P: AcousticCurveProvider>(
        &self,
        provider: &P,
        audio: &Path,
    ) -> Result<FeatureRecord> {
        let signal = provider.load(audio)?;
        self.extract_signal(provider, &signal)
    }

    /// Same as [`extract`](Self::extract) for a signal that is already loaded.
    pub fn extract_signal<P: AcousticCurveProvider>(
        &self,
        provider: &P,
        signal: &P::Signal,
    ) -> Result<FeatureRecord> {
        let duration = provider.duration(signal);
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ProsodyError::InvalidDuration(duration));
        }

        let intensity = provider.intensity_curve(signal, self.config.intensity_pitch_floor)?;
        let rates = self.analyze_intensity(&intensity, duration)?;

        let pitch = provider.pitch_curve(signal)?;
        let formants = provider.formant_curve(signal)?;
        let aligned = ProsodyAligner::new(self.config.window_radius).align(&pitch, &formants);
        debug!(
            pitch_samples = pitch.len(),
            formant_frames = formants.len(),
            aligned = aligned.len(),
            "aligned formants to pitch"
        );

        Ok(FeatureRecord {
            pitch: pitch.iter().map(|(time, &hz)| (time, hz)).collect(),
            formants: aligned,
            speech_rate: rates.speech_rate,
            speaking_time: rates.speaking_time,
            nuclei: rates.nuclei.count,
            duration,
            articulation_rate: rates.articulation_rate,
        })
    }

    /// Thresholds, segmentation and the validated nucleus count.
    pub fn analyze_intensity(&self, intensity: &Curve, duration: f64) -> Result<RateAnalysis> {
        let thresholds = ThresholdEstimator::new(self.config.silence_db).estimate(intensity)?;
        debug!(
            threshold = thresholds.threshold,
            threshold2 = thresholds.threshold2,
            threshold3 = thresholds.threshold3,
            "estimated intensity thresholds"
        );

        let intervals = SilenceSegmenter::new(self.config.min_pause).segment(
            intensity,
            thresholds.threshold3,
            duration,
        )?;
        let speaking_time = rate::speaking_time(&intervals);
        debug!(intervals = intervals.len(), speaking_time, "segmented silences");

        let candidates = PeakDetector::new(self.config.peak_oversampling)
            .with_extrema(true, self.config.include_minima)
            .detect(intensity, duration)?;
        let nuclei = PeakValidator::new(self.config.min_dip).validate(
            &candidates,
            intensity,
            thresholds.threshold,
        )?;
        debug!(
            candidates = candidates.len(),
            nuclei = nuclei.count,
            "validated syllable nuclei"
        );

        Ok(RateAnalysis {
            speech_rate: rate::speech_rate(nuclei.count, duration)?,
            articulation_rate: rate::articulation_rate(nuclei.count, speaking_time),
            thresholds,
            intervals,
            nuclei,
            speaking_time,
        })
    }
}
