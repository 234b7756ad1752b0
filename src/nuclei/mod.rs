//! Syllable-nuclei detection on an intensity contour.
//!
//! Thresholds come from the contour statistics, the contour is split into
//! silent and sounding stretches, local peaks are proposed as nuclei and a dip
//! filter keeps the peaks that stand out from their neighbours.

pub mod peaks;
pub mod rate;
pub mod silence;
pub mod thresholds;
pub mod validator;

pub use peaks::{DerivedSignal, PeakDetector};
pub use silence::SilenceSegmenter;
pub use thresholds::ThresholdEstimator;
pub use validator::PeakValidator;
