use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::features::prosody::DEFAULT_WINDOW_RADIUS;
use crate::nuclei::silence::DEFAULT_MIN_PAUSE;
use crate::nuclei::thresholds::DEFAULT_SILENCE_DB;
use crate::nuclei::validator::DEFAULT_MIN_DIP;

/// Tunables for one extraction run, loadable from JSON.
///
/// Missing keys fall back to the defaults, so a file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Silence threshold below the loud end of the intensity range (dB, negative).
    #[serde(alias = "silenceDb")]
    pub silence_db: f64,
    /// Shortest silence treated as a pause (s).
    #[serde(alias = "minPause")]
    pub min_pause: f64,
    /// Valley depth separating two nuclei (dB).
    #[serde(alias = "minDip")]
    pub min_dip: f64,
    /// Half-width of the formant averaging window around each pitch sample (s).
    #[serde(alias = "windowRadius")]
    pub window_radius: f64,
    /// Lowest pitch the intensity analysis window must resolve (Hz).
    pub intensity_pitch_floor: f64,
    /// Grid points per intensity frame for the derived peak signal.
    pub peak_oversampling: usize,
    /// Also propose intensity minima as nucleus candidates.
    pub include_minima: bool,
    pub pitch_floor: f64,
    pub pitch_ceiling: f64,
    /// Ceiling of the formant search range (Hz).
    pub max_formant_hz: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            silence_db: DEFAULT_SILENCE_DB,
            min_pause: DEFAULT_MIN_PAUSE,
            min_dip: DEFAULT_MIN_DIP,
            window_radius: DEFAULT_WINDOW_RADIUS,
            intensity_pitch_floor: 50.0,
            peak_oversampling: 1,
            include_minima: false,
            pitch_floor: 75.0,
            pitch_ceiling: 600.0,
            max_formant_hz: 5500.0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("invalid analysis config {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.silence_db.is_finite() && self.silence_db < 0.0,
            "silence_db must be negative, got {}",
            self.silence_db
        );
        ensure!(
            self.min_pause.is_finite() && self.min_pause >= 0.0,
            "min_pause must be non-negative, got {}",
            self.min_pause
        );
        ensure!(
            self.min_dip.is_finite() && self.min_dip >= 0.0,
            "min_dip must be non-negative, got {}",
            self.min_dip
        );
        ensure!(
            self.window_radius.is_finite() && self.window_radius >= 0.0,
            "window_radius must be non-negative, got {}",
            self.window_radius
        );
        ensure!(
            self.intensity_pitch_floor > 0.0,
            "intensity_pitch_floor must be positive"
        );
        ensure!(self.peak_oversampling >= 1, "peak_oversampling must be at least 1");
        ensure!(
            self.pitch_floor > 0.0 && self.pitch_ceiling > self.pitch_floor,
            "pitch range {}..{} Hz is empty",
            self.pitch_floor,
            self.pitch_ceiling
        );
        ensure!(
            self.max_formant_hz > 100.0,
            "max_formant_hz must exceed 100 Hz"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisConfig;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(r#"{ "min_dip": 1.5, "minPause": 0.25 }"#).unwrap();
        assert_eq!(config.min_dip, 1.5);
        assert_eq!(config.min_pause, 0.25);
        assert_eq!(config.silence_db, -25.0);
        assert_eq!(config.window_radius, 0.1);
    }

    #[test]
    fn rejects_positive_silence_threshold() {
        assert!(AnalysisConfig::from_json(r#"{ "silence_db": 5.0 }"#).is_err());
    }

    #[test]
    fn rejects_inverted_pitch_range() {
        let config = AnalysisConfig {
            pitch_floor: 300.0,
            pitch_ceiling: 100.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_are_valid() {
        AnalysisConfig::default().validate().unwrap();
    }
}
