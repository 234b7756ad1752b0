use anyhow::{ensure, Result};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Linearly resample `samples` from `source_rate` to `target_rate`.
pub fn linear_resample(samples: &[f64], source_rate: u32, target_rate: u32) -> Result<Vec<f64>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let last_index = samples.len() - 1;
    let output = (0..output_len)
        .map(|i| {
            let position = i as f64 / ratio;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = position - left as f64;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect();
    Ok(output)
}

/// Band-limited resampling through the frequency domain.
///
/// The spectrum is truncated (down) or zero-padded (up) to the new length,
/// which is `round(len * target / source)`.
pub fn spectral_resample(samples: &[f64], source_rate: f64, target_rate: f64) -> Result<Vec<f64>> {
    ensure!(
        source_rate > 0.0 && target_rate > 0.0,
        "sample rates must be positive ({source_rate} -> {target_rate})"
    );
    if samples.is_empty() || (source_rate - target_rate).abs() < 1e-6 {
        return Ok(samples.to_vec());
    }
    let n = samples.len();
    let new_len = (n as f64 * target_rate / source_rate).round() as usize;
    if new_len == 0 {
        return Ok(Vec::new());
    }

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let mut resized = vec![Complex::new(0.0, 0.0); new_len];
    let half = n.min(new_len) / 2;
    resized[..=half].copy_from_slice(&spectrum[..=half]);
    for i in 1..half {
        resized[new_len - i] = spectrum[n - i];
    }
    if n.min(new_len) % 2 == 1 {
        if half > 0 {
            resized[new_len - half] = spectrum[n - half];
        }
    } else if new_len < n {
        // Both aliases fold onto the new Nyquist bin.
        resized[half] = spectrum[half] + spectrum[n - half];
    } else if new_len > n {
        let nyquist = spectrum[half] * 0.5;
        resized[half] = nyquist;
        resized[new_len - half] = nyquist;
    }

    planner.plan_fft_inverse(new_len).process(&mut resized);
    let scale = 1.0 / n as f64;
    Ok(resized.iter().map(|c| c.re * scale).collect())
}
