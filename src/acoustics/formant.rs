//! Formant tracking by Burg linear prediction.
//!
//! The signal is band-limited to twice the formant ceiling and pre-emphasized,
//! then each Gaussian-windowed frame is fitted with an all-pole model whose
//! complex poles give the formant frequencies.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use num_complex::Complex64;
use tracing::trace;

use super::Sound;
use crate::audio::resample::spectral_resample;
use crate::curve::FormantCurve;
use crate::error::{ProsodyError, Result};

/// Formants closer than this to 0 Hz or to the ceiling are discarded.
const EDGE_MARGIN_HZ: f64 = 50.0;
const SCHUR_EPSILON: f64 = 1e-12;
const SCHUR_MAX_ITERATIONS: usize = 500;
const POLISH_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct FormantSettings {
    /// Seconds between frames; zero picks a quarter of the window length.
    pub time_step: f64,
    pub max_num_formants: usize,
    pub max_formant_hz: f64,
    /// Half the physical analysis window (s).
    pub window_length: f64,
    /// Pre-emphasis corner frequency (Hz).
    pub pre_emphasis_from: f64,
}

impl Default for FormantSettings {
    fn default() -> Self {
        Self {
            time_step: 0.0,
            max_num_formants: 5,
            max_formant_hz: 5500.0,
            window_length: 0.025,
            pre_emphasis_from: 50.0,
        }
    }
}

pub fn sound_to_formant_burg(sound: &Sound, settings: &FormantSettings) -> Result<FormantCurve> {
    if settings.max_num_formants == 0 || !(settings.max_formant_hz > 2.0 * EDGE_MARGIN_HZ) {
        return Err(ProsodyError::provider(format!(
            "unusable formant settings: {} formants up to {} Hz",
            settings.max_num_formants, settings.max_formant_hz
        )));
    }
    let native_rate = sound.sample_rate as f64;
    let duration = sound.duration();
    let target_rate = 2.0 * settings.max_formant_hz;
    let (samples, rate) = if target_rate < native_rate {
        let resampled = spectral_resample(&sound.samples, native_rate, target_rate)
            .map_err(|err| ProsodyError::provider(err.to_string()))?;
        (resampled, target_rate)
    } else {
        (sound.samples.clone(), native_rate)
    };
    let emphasized = pre_emphasize(&samples, rate, settings.pre_emphasis_from);

    let physical_window = 2.0 * settings.window_length;
    let window_len = (physical_window * rate).round() as usize | 1;
    let half_window = (window_len / 2) as isize;
    let window = gaussian_window(window_len);
    let time_step = if settings.time_step > 0.0 {
        settings.time_step
    } else {
        settings.window_length / 4.0
    };
    let frame_count = (((duration - physical_window) / time_step).floor() + 1.0).max(1.0) as usize;
    let first_time = (duration - (frame_count - 1) as f64 * time_step) / 2.0;
    let order = 2 * settings.max_num_formants;
    let ceiling = settings.max_formant_hz - EDGE_MARGIN_HZ;

    let mut frames = Vec::with_capacity(frame_count);
    let mut frame = vec![0.0; window_len];
    for index in 0..frame_count {
        let time = first_time + index as f64 * time_step;
        let start = (time * rate).round() as isize - half_window;
        for (offset, (slot, weight)) in frame.iter_mut().zip(&window).enumerate() {
            let idx = start + offset as isize;
            *slot = if idx < 0 {
                0.0
            } else {
                emphasized.get(idx as usize).map_or(0.0, |&s| s * weight)
            };
        }
        let coefficients = burg_lpc(&frame, order);
        let mut formants = pole_frequencies(&coefficients, rate, EDGE_MARGIN_HZ, ceiling);
        formants.truncate(settings.max_num_formants);
        trace!(time, found = formants.len(), "formant frame");
        frames.push((time, first_three(&formants)));
    }
    FormantCurve::from_samples(frames)
}

fn first_three(formants: &[f64]) -> [f64; 3] {
    let mut out = [f64::NAN; 3];
    for (slot, &value) in out.iter_mut().zip(formants) {
        *slot = value;
    }
    out
}

fn pre_emphasize(samples: &[f64], rate: f64, from_hz: f64) -> Vec<f64> {
    let alpha = (-2.0 * PI * from_hz / rate).exp();
    let mut previous = 0.0;
    samples
        .iter()
        .map(|&sample| {
            let out = sample - alpha * previous;
            previous = sample;
            out
        })
        .collect()
}

fn gaussian_window(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let mid = (len - 1) as f64 / 2.0;
    (0..len)
        .map(|i| {
            let x = (i as f64 - mid) / mid;
            (-12.0 * x * x).exp()
        })
        .collect()
}

/// Prediction polynomial `[1, a1, .., a_order]` estimated with Burg's method.
fn burg_lpc(samples: &[f64], order: usize) -> Vec<f64> {
    let n = samples.len();
    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;
    if n <= order {
        return a;
    }
    let mut forward = samples.to_vec();
    let mut backward = samples.to_vec();
    for k in 1..=order {
        let (mut num, mut den) = (0.0, 0.0);
        for i in k..n {
            num += forward[i] * backward[i - 1];
            den += forward[i] * forward[i] + backward[i - 1] * backward[i - 1];
        }
        if den < 1e-30 {
            break;
        }
        let reflection = -2.0 * num / den;
        // Descending order keeps backward[i - 1] unmodified when it is read.
        for i in (k..n).rev() {
            let f = forward[i];
            forward[i] = f + reflection * backward[i - 1];
            backward[i] = backward[i - 1] + reflection * f;
        }
        let previous = a.clone();
        for i in 1..k {
            a[i] = previous[i] + reflection * previous[k - i];
        }
        a[k] = reflection;
    }
    a
}

/// Frequencies (Hz, ascending) of the upper half-plane poles inside `[low, high]`.
fn pole_frequencies(a: &[f64], rate: f64, low: f64, high: f64) -> Vec<f64> {
    let mut frequencies: Vec<f64> = polynomial_roots(a)
        .into_iter()
        .filter(|root| root.im > 0.0)
        .filter(|root| root.norm() < 1.0)
        .map(|root| root.arg() * rate / (2.0 * PI))
        .filter(|&freq| freq >= low && freq <= high)
        .collect();
    frequencies.sort_by(f64::total_cmp);
    frequencies
}

/// Roots of `z^p + a1 z^(p-1) + .. + ap`, polished with Newton steps and
/// reflected into the unit circle.
fn polynomial_roots(a: &[f64]) -> Vec<Complex64> {
    let order = a.len().saturating_sub(1);
    if order == 0 || a[1..].iter().map(|c| c.abs()).sum::<f64>() < 1e-10 {
        return Vec::new();
    }
    let mut companion = DMatrix::<f64>::zeros(order, order);
    for (col, &coefficient) in a[1..].iter().enumerate() {
        companion[(0, col)] = -coefficient;
    }
    for row in 1..order {
        companion[(row, row - 1)] = 1.0;
    }
    let Some(schur) = companion.try_schur(SCHUR_EPSILON, SCHUR_MAX_ITERATIONS) else {
        return Vec::new();
    };
    schur
        .complex_eigenvalues()
        .iter()
        .map(|eigen| {
            let root = polish(a, Complex64::new(eigen.re, eigen.im));
            let radius = root.norm();
            if radius > 1.0 {
                root.conj() / (radius * radius)
            } else {
                root
            }
        })
        .collect()
}

fn polish(a: &[f64], mut z: Complex64) -> Complex64 {
    for _ in 0..POLISH_ITERATIONS {
        let mut value = Complex64::new(1.0, 0.0);
        let mut slope = Complex64::new(0.0, 0.0);
        for &coefficient in &a[1..] {
            slope = value + z * slope;
            value = value * z + coefficient;
        }
        if slope.norm() < 1e-30 {
            break;
        }
        let step = value / slope;
        z -= step;
        if step.norm() < 1e-10 * z.norm() {
            break;
        }
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse train through two resonators at 700 and 1200 Hz.
    fn synthetic_vowel(rate: u32, seconds: f64) -> Vec<f64> {
        let rate_f = rate as f64;
        let len = (seconds * rate_f) as usize;
        let period = (rate_f / 120.0) as usize;
        let mut signal: Vec<f64> = (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect();
        for (freq, bandwidth) in [(700.0, 60.0), (1200.0, 80.0)] {
            let radius = (-PI * bandwidth / rate_f).exp();
            let c1 = 2.0 * radius * (2.0 * PI * freq / rate_f).cos();
            let c2 = -radius * radius;
            let (mut y1, mut y2) = (0.0, 0.0);
            for sample in signal.iter_mut() {
                let y = *sample + c1 * y1 + c2 * y2;
                y2 = y1;
                y1 = y;
                *sample = y;
            }
        }
        signal
    }

    #[test]
    fn burg_recovers_a_resonator() {
        let rate = 10_000.0;
        let radius: f64 = 0.97;
        let theta = 2.0 * PI * 1000.0 / rate;
        let (c1, c2) = (2.0 * radius * theta.cos(), -radius * radius);
        let mut state = (0.0, 0.0);
        let mut seed = 12345u64;
        let signal: Vec<f64> = (0..4000)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let noise = ((seed >> 11) as f64 / (1u64 << 53) as f64) - 0.5;
                let y = noise + c1 * state.0 + c2 * state.1;
                state = (y, state.0);
                y
            })
            .collect();
        let a = burg_lpc(&signal, 2);
        assert!((a[1] + c1).abs() < 0.05, "a1 = {}", a[1]);
        assert!((a[2] + c2).abs() < 0.05, "a2 = {}", a[2]);
        let freqs = pole_frequencies(&a, rate, 50.0, 4950.0);
        assert_eq!(freqs.len(), 1);
        assert!((freqs[0] - 1000.0).abs() < 30.0, "pole at {}", freqs[0]);
    }

    #[test]
    fn tracks_first_two_formants_of_synthetic_vowel() {
        let sound = Sound::new(synthetic_vowel(16_000, 0.5), 16_000);
        let curve = sound_to_formant_burg(&sound, &FormantSettings::default()).unwrap();
        assert!(curve.len() > 10);
        let middle = curve.values()[curve.len() / 2];
        // Spare poles model the spectral tilt and pull estimates upward a little.
        assert!((550.0..950.0).contains(&middle[0]), "F1 = {}", middle[0]);
        assert!((1050.0..1600.0).contains(&middle[1]), "F2 = {}", middle[1]);
    }

    #[test]
    fn silence_has_no_formants() {
        let sound = Sound::new(vec![0.0; 8_000], 16_000);
        let curve = sound_to_formant_burg(&sound, &FormantSettings::default()).unwrap();
        assert!(!curve.is_empty());
        assert!(curve.values().iter().all(|f| f.iter().all(|v| v.is_nan())));
    }

    #[test]
    fn roots_of_known_quadratic() {
        // (z - 0.5i)(z + 0.5i) = z^2 + 0.25
        let roots = polynomial_roots(&[1.0, 0.0, 0.25]);
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|r| (r.norm() - 0.5).abs() < 1e-9));
    }

    #[test]
    fn first_three_pads_with_nan() {
        let out = first_three(&[500.0]);
        assert_eq!(out[0], 500.0);
        assert!(out[1].is_nan() && out[2].is_nan());
    }
}
