use anyhow::Result;
use approx::assert_abs_diff_eq;
use prosodia::curve::Curve;
use prosodia::features::FeatureExtractor;
use prosodia::nuclei::{rate, PeakValidator, SilenceSegmenter, ThresholdEstimator};
use prosodia::types::{IntervalLabel, PeakCandidate};
use prosodia::ProsodyError;

fn frames(values: &[f64], step: f64) -> Result<Curve> {
    Ok(Curve::from_samples(
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| ((i as f64 + 0.5) * step, value)),
    )?)
}

/// 1 s of −10 dB with a 0.3 s block at −40 dB in the middle.
fn pause_in_the_middle() -> Result<Curve> {
    let values: Vec<f64> = (0..100)
        .map(|i| if (35..65).contains(&i) { -40.0 } else { -10.0 })
        .collect();
    frames(&values, 0.01)
}

#[test]
fn pause_splits_speech_into_two_sounding_intervals() -> Result<()> {
    let intensity = pause_in_the_middle()?;
    let thresholds = ThresholdEstimator::new(-25.0).estimate(&intensity)?;
    let intervals = SilenceSegmenter::new(0.25).segment(&intensity, thresholds.threshold3, 1.0)?;

    let labels: Vec<IntervalLabel> = intervals.iter().map(|interval| interval.label).collect();
    assert_eq!(
        labels,
        vec![
            IntervalLabel::Sounding,
            IntervalLabel::Silent,
            IntervalLabel::Sounding
        ]
    );
    assert_abs_diff_eq!(intervals[1].start, 0.35, epsilon = 1e-9);
    assert_abs_diff_eq!(intervals[1].end, 0.65, epsilon = 1e-9);
    assert_abs_diff_eq!(rate::speaking_time(&intervals), 0.7, epsilon = 1e-9);
    Ok(())
}

#[test]
fn intervals_cover_the_whole_signal() -> Result<()> {
    let intensity = pause_in_the_middle()?;
    let analysis = FeatureExtractor::default().analyze_intensity(&intensity, 1.0)?;
    let intervals = &analysis.intervals;
    assert_eq!(intervals.first().map(|i| i.start), Some(0.0));
    assert_eq!(intervals.last().map(|i| i.end), Some(1.0));
    for pair in intervals.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
        assert_ne!(pair[0].label, pair[1].label);
    }
    Ok(())
}

/// Samples every 0.1 s; candidates sit on the samples at 0.1, 0.5 and 0.9.
fn dip_curve() -> Result<Curve> {
    let values = [50.0, 60.0, 40.0, 20.0, 35.0, 40.0, 58.0, 55.0, 60.0, 65.0, 50.0];
    Ok(Curve::from_samples(
        values.iter().enumerate().map(|(i, &v)| (i as f64 * 0.1, v)),
    )?)
}

fn dip_candidates() -> Vec<PeakCandidate> {
    [(0.1, 60.0), (0.5, 40.0), (0.9, 65.0)]
        .into_iter()
        .map(|(time, intensity)| PeakCandidate { time, intensity })
        .collect()
}

#[test]
fn dip_scan_follows_the_reference_point() -> Result<()> {
    let intensity = dip_curve()?;
    // 0.1 -> 0.5: reference 60 dB, lowest sample 20 dB, 40 dB dip: accepted.
    // 0.5 -> 0.9: reference re-read at 0.5 is 40 dB, lowest sample 40 dB: rejected.
    // 0.9 is last and never judged.
    let scan = PeakValidator::new(2.0).validate(&dip_candidates(), &intensity, -25.0)?;
    assert_eq!(scan.count, 1);
    assert_eq!(scan.times, vec![0.1]);
    Ok(())
}

#[test]
fn deeper_dip_requirement_never_adds_nuclei() -> Result<()> {
    let intensity = dip_curve()?;
    let candidates = dip_candidates();
    let mut previous = usize::MAX;
    for min_dip in [0.0, 1.0, 2.0, 10.0, 39.9, 40.0, 50.0] {
        let count = PeakValidator::new(min_dip)
            .validate(&candidates, &intensity, -25.0)?
            .count;
        assert!(count <= previous, "min_dip {min_dip} raised count to {count}");
        previous = count;
    }
    assert_eq!(previous, 0);
    Ok(())
}

#[test]
fn no_candidates_means_zero_rate() -> Result<()> {
    let intensity = dip_curve()?;
    let scan = PeakValidator::default().validate(&[], &intensity, 0.0)?;
    assert_eq!(scan.count, 0);
    assert_eq!(rate::speech_rate(scan.count, 1.0)?, 0.0);
    Ok(())
}

#[test]
fn zero_duration_cannot_carry_a_rate() {
    let err = rate::speech_rate(3, 0.0).unwrap_err();
    assert!(matches!(err, ProsodyError::InvalidDuration(d) if d == 0.0));
}

#[test]
fn empty_intensity_is_an_invalid_curve() {
    let err = ThresholdEstimator::default()
        .estimate(&Curve::empty())
        .unwrap_err();
    assert!(matches!(err, ProsodyError::InvalidCurve(_)));
}
