use crate::error::{ProsodyError, Result};
use crate::types::Interval;

/// Total duration of the sounding intervals; zero when there are none.
pub fn speaking_time(intervals: &[Interval]) -> f64 {
    intervals
        .iter()
        .filter(|interval| interval.is_sounding())
        .map(Interval::duration)
        .sum()
}

/// Validated nuclei per second of signal.
pub fn speech_rate(nuclei: usize, duration: f64) -> Result<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ProsodyError::InvalidDuration(duration));
    }
    Ok(nuclei as f64 / duration)
}

/// Validated nuclei per second of speaking time, `None` without speech.
pub fn articulation_rate(nuclei: usize, speaking_time: f64) -> Option<f64> {
    (speaking_time.is_finite() && speaking_time > 0.0).then(|| nuclei as f64 / speaking_time)
}
