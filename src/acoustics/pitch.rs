use std::panic::{self, AssertUnwindSafe};

use aus::analysis;

use super::Sound;
use crate::audio::resample;
use crate::curve::Curve;
use crate::error::{panic_message, ProsodyError, Result};

pub(crate) const TARGET_SAMPLE_RATE: u32 = 16_000;
/// Analysis frames cover three periods of the pitch floor.
const PERIODS_PER_FRAME: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct PitchSettings {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for PitchSettings {
    fn default() -> Self {
        Self {
            floor: 75.0,
            ceiling: 600.0,
        }
    }
}

/// Voiced pitch samples (Hz) estimated with probabilistic YIN.
pub fn sound_to_pitch(sound: &Sound, settings: &PitchSettings) -> Result<Curve> {
    let audio = resample::linear_resample(&sound.samples, sound.sample_rate, TARGET_SAMPLE_RATE)
        .map_err(|err| ProsodyError::provider(err.to_string()))?;
    let frame_len = frame_length_samples(settings.floor);
    if audio.len() < frame_len {
        return Ok(Curve::empty());
    }
    let (timestamps, pitches, voiced_flags, _confidence) = contain_panic(|| {
        analysis::pyin_pitch_estimator(
            &audio,
            TARGET_SAMPLE_RATE,
            settings.floor,
            settings.ceiling,
            frame_len,
        )
    })?;
    voiced_samples(&timestamps, &pitches, &voiced_flags)
}

/// Runs the estimator, turning a panic inside it into a provider failure.
fn contain_panic<T>(estimate: impl FnOnce() -> T) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(estimate)).map_err(|payload| {
        ProsodyError::provider(format!(
            "pitch estimation panicked: {}",
            panic_message(payload.as_ref())
        ))
    })
}

fn frame_length_samples(floor: f64) -> usize {
    ((PERIODS_PER_FRAME / floor) * TARGET_SAMPLE_RATE as f64).ceil().max(1.0) as usize
}

/// Keeps voiced, finite, non-zero estimates; repeated timestamps keep the first.
fn voiced_samples(timestamps: &[f64], pitches: &[f64], voiced: &[bool]) -> Result<Curve> {
    let mut times: Vec<f64> = Vec::with_capacity(pitches.len());
    let mut values = Vec::with_capacity(pitches.len());
    for ((&time, &pitch), &flag) in timestamps.iter().zip(pitches).zip(voiced) {
        if !flag || !pitch.is_finite() || pitch <= 0.0 {
            continue;
        }
        if times.last().is_some_and(|&last| time <= last) {
            continue;
        }
        times.push(time);
        values.push(pitch);
    }
    Curve::new(times, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_voiced_positive_estimates() {
        let times = [0.00, 0.01, 0.02, 0.03, 0.04];
        let pitches = [0.0, 120.0, f64::NAN, 130.0, 140.0];
        let voiced = [false, true, true, true, false];
        let curve = voiced_samples(&times, &pitches, &voiced).unwrap();
        assert_eq!(curve.times(), &[0.01, 0.03]);
        assert_eq!(curve.values(), &[120.0, 130.0]);
    }

    #[test]
    fn frame_spans_three_floor_periods() {
        assert_eq!(frame_length_samples(75.0), 640);
    }

    fn modulated_tone(seconds: f64, hz: f64, envelope_hz: f64, rate: u32) -> Sound {
        let samples = (0..(seconds * rate as f64) as usize)
            .map(|n| {
                let t = n as f64 / rate as f64;
                let envelope = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * envelope_hz * t).cos();
                0.5 * envelope * (2.0 * std::f64::consts::PI * hz * t).sin()
            })
            .collect();
        Sound::new(samples, rate)
    }

    #[test]
    fn estimator_panic_becomes_provider_failure() {
        let result: Result<()> = contain_panic(|| panic!("index out of range"));
        match result {
            Err(ProsodyError::ExternalProviderFailure(message)) => {
                assert!(message.contains("index out of range"), "{message}")
            }
            other => panic!("expected provider failure, got {other:?}"),
        }
    }

    #[test]
    fn enveloped_tone_never_panics() {
        let sound = modulated_tone(2.0, 220.0, 4.0, 16_000);
        match sound_to_pitch(&sound, &PitchSettings::default()) {
            Ok(curve) => assert!(curve.values().iter().all(|hz| *hz > 0.0)),
            Err(ProsodyError::ExternalProviderFailure(_)) => {}
            Err(other) => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn short_signal_has_no_pitch() {
        let sound = Sound::new(vec![0.0; 100], 16_000);
        let curve = sound_to_pitch(&sound, &PitchSettings::default()).unwrap();
        assert!(curve.is_empty());
    }
}
