use ndarray::Array1;

use super::Sound;
use crate::curve::Curve;
use crate::error::{ProsodyError, Result};

/// Reference pressure squared (20 µPa)².
const REFERENCE_POWER: f64 = 4.0e-10;
/// dB reported for digitally silent frames.
const SILENT_DB: f64 = -300.0;

/// Intensity contour in dB from a Kaiser-windowed mean square.
///
/// The window spans `6.4 / pitch_floor` seconds so that periodicity down to
/// the floor does not ripple the contour; frames advance by `0.8 / pitch_floor`
/// and are centered on the signal.
pub fn sound_to_intensity(sound: &Sound, pitch_floor: f64) -> Result<Curve> {
    if pitch_floor.is_nan() || pitch_floor <= 0.0 {
        return Err(ProsodyError::provider(format!(
            "intensity pitch floor must be positive, got {pitch_floor}"
        )));
    }
    let rate = sound.sample_rate as f64;
    let duration = sound.duration();
    let window_duration = 6.4 / pitch_floor;
    let time_step = 0.8 / pitch_floor;
    if duration < window_duration {
        return Err(ProsodyError::provider(format!(
            "signal of {duration:.3} s is shorter than the {window_duration:.3} s intensity window"
        )));
    }

    let half_window = (window_duration / 2.0 * rate).round() as isize;
    let window = kaiser_window((2 * half_window + 1) as usize);
    let weight_sum = window.sum();

    let frame_count = ((duration - window_duration) / time_step).floor() as usize + 1;
    let first_time = (duration - (frame_count - 1) as f64 * time_step) / 2.0;

    let mut times = Vec::with_capacity(frame_count);
    let mut values = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let time = first_time + frame as f64 * time_step;
        let center = (time * rate).round() as isize;
        let segment = Array1::from_iter((-half_window..=half_window).map(|offset| {
            let idx = center + offset;
            if idx < 0 || idx as usize >= sound.samples.len() {
                0.0
            } else {
                sound.samples[idx as usize]
            }
        }));
        let mean = segment.dot(&window) / weight_sum;
        let centered = segment.mapv(|x| (x - mean) * (x - mean));
        let power = centered.dot(&window) / weight_sum;
        times.push(time);
        values.push(power_to_db(power));
    }
    Curve::new(times, values)
}

fn power_to_db(power: f64) -> f64 {
    if power < 1e-30 {
        SILENT_DB
    } else {
        10.0 * (power / REFERENCE_POWER).log10()
    }
}

fn kaiser_window(length: usize) -> Array1<f64> {
    let beta = 2.0 * std::f64::consts::PI * std::f64::consts::PI + 0.5;
    let norm = bessel_i0(beta);
    let span = (length + 1) as f64;
    Array1::from_iter((1..=length).map(|i| {
        let x = (2.0 * i as f64 - span) / span;
        bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / norm
    }))
}

/// Modified Bessel function of the first kind, order zero.
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..500 {
        let factor = half / k as f64;
        term *= factor * factor;
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}
