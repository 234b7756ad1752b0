//! Acoustic curve extraction behind a capability trait.
//!
//! The nuclei and prosody stages only see curves, so they can be driven by
//! synthetic data in tests. [`NativeAnalyzer`] is the implementation used by
//! the command line tool.

pub mod formant;
pub mod intensity;
pub mod pitch;

use std::path::Path;

use tracing::debug;

use crate::audio::decoder::decode_audio;
use crate::config::AnalysisConfig;
use crate::curve::{Curve, FormantCurve};
use crate::error::{ProsodyError, Result};

/// Source of intensity, pitch and formant curves for a loaded recording.
pub trait AcousticCurveProvider {
    type Signal;

    fn load(&self, audio: &Path) -> Result<Self::Signal>;

    /// Signal length in seconds.
    fn duration(&self, signal: &Self::Signal) -> f64;

    /// Intensity contour in dB; `pitch_floor` sets the analysis window.
    fn intensity_curve(&self, signal: &Self::Signal, pitch_floor: f64) -> Result<Curve>;

    /// Pitch in Hz with unvoiced samples removed.
    fn pitch_curve(&self, signal: &Self::Signal) -> Result<Curve>;

    /// F1, F2 and F3 tracks, `NaN` where a formant was not resolved.
    fn formant_curve(&self, signal: &Self::Signal) -> Result<FormantCurve>;
}

/// Mono recording at its native sample rate.
#[derive(Debug, Clone)]
pub struct Sound {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

impl Sound {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Curve provider computing everything in-process.
#[derive(Debug, Clone)]
pub struct NativeAnalyzer {
    pitch: pitch::PitchSettings,
    formant: formant::FormantSettings,
}

impl Default for NativeAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl NativeAnalyzer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            pitch: pitch::PitchSettings {
                floor: config.pitch_floor,
                ceiling: config.pitch_ceiling,
            },
            formant: formant::FormantSettings {
                max_formant_hz: config.max_formant_hz,
                ..formant::FormantSettings::default()
            },
        }
    }
}

impl AcousticCurveProvider for NativeAnalyzer {
    type Signal = Sound;

    fn load(&self, audio: &Path) -> Result<Sound> {
        let decoded = decode_audio(audio)
            .map_err(|err| ProsodyError::provider(format!("{}: {:#}", audio.display(), err)))?;
        if decoded.samples.is_empty() {
            return Err(ProsodyError::provider(format!(
                "{} contains no audio samples",
                audio.display()
            )));
        }
        debug!(
            path = %audio.display(),
            samples = decoded.samples.len(),
            sample_rate = decoded.sample_rate,
            "decoded recording"
        );
        Ok(Sound::new(decoded.samples, decoded.sample_rate))
    }

    fn duration(&self, signal: &Sound) -> f64 {
        signal.duration()
    }

    fn intensity_curve(&self, signal: &Sound, pitch_floor: f64) -> Result<Curve> {
        intensity::sound_to_intensity(signal, pitch_floor)
    }

    fn pitch_curve(&self, signal: &Sound) -> Result<Curve> {
        pitch::sound_to_pitch(signal, &self.pitch)
    }

    fn formant_curve(&self, signal: &Sound) -> Result<FormantCurve> {
        formant::sound_to_formant_burg(signal, &self.formant)
    }
}
