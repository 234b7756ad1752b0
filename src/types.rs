//! Value types flowing between the analysis stages.

use serde::{Deserialize, Serialize};

/// Classification of a stretch of signal against the silence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalLabel {
    Silent,
    Sounding,
}

impl IntervalLabel {
    pub fn flipped(self) -> Self {
        match self {
            Self::Silent => Self::Sounding,
            Self::Sounding => Self::Silent,
        }
    }
}

/// A labeled time range; a segmentation is contiguous from 0 to the duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64, // seconds
    pub end: f64,   // seconds
    pub label: IntervalLabel,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_sounding(&self) -> bool {
        self.label == IntervalLabel::Sounding
    }
}

/// Thresholds derived from intensity statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    /// Loudness a peak must exceed to count as a nucleus candidate (dB).
    pub threshold: f64,
    /// Distance between the curve maximum and its 99% quantile (dB).
    pub threshold2: f64,
    /// Silence threshold relative to the curve maximum (dB), used for segmentation.
    pub threshold3: f64,
}

/// Local intensity extremum proposed as a syllable nucleus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    pub time: f64,
    pub intensity: f64,
}

/// Outcome of the dip filter: the nuclei accepted during the scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleiScan {
    pub count: usize,
    pub times: Vec<f64>,
}

/// Formant averages around one voiced pitch time.
///
/// Serialized as `[time, f1, f2, f3]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, f64, f64)", into = "(f64, f64, f64, f64)")]
pub struct ProsodyFrame {
    pub time: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

impl From<(f64, f64, f64, f64)> for ProsodyFrame {
    fn from((time, f1, f2, f3): (f64, f64, f64, f64)) -> Self {
        Self { time, f1, f2, f3 }
    }
}

impl From<ProsodyFrame> for (f64, f64, f64, f64) {
    fn from(frame: ProsodyFrame) -> Self {
        (frame.time, frame.f1, frame.f2, frame.f3)
    }
}

/// Per-recording feature aggregate written to the output sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Voiced pitch samples as `(time, hz)`.
    pub pitch: Vec<(f64, f64)>,
    pub formants: Vec<ProsodyFrame>,
    /// Validated nuclei per second of signal.
    pub speech_rate: f64,
    /// Total duration of sounding intervals in seconds.
    pub speaking_time: f64,
    pub nuclei: usize,
    pub duration: f64,
    /// Validated nuclei per second of speaking time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articulation_rate: Option<f64>,
}
