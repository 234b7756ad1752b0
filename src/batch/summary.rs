use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::types::FeatureRecord;

/// Means over every pitch sample and formant frame of a record directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusSummary {
    pub records: usize,
    pub pitch: Option<f64>,
    pub f1: Option<f64>,
    pub f2: Option<f64>,
    pub f3: Option<f64>,
}

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Reads every `*.json` record directly inside `dir`.
///
/// Files that do not parse as a record are logged and skipped.
pub fn summarize_dir(dir: &Path) -> Result<CorpusSummary> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read record directory {:?}", dir))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        match read_record(path) {
            Ok(record) => records.push(record),
            Err(err) => warn!(path = %path.display(), error = %format!("{err:#}"), "skipping record"),
        }
    }
    Ok(summarize(&records))
}

fn read_record(path: &Path) -> Result<FeatureRecord> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("{:?} is not a feature record", path))
}

pub fn summarize(records: &[FeatureRecord]) -> CorpusSummary {
    let (mut pitch, mut f1, mut f2, mut f3) = (
        Mean::default(),
        Mean::default(),
        Mean::default(),
        Mean::default(),
    );
    for record in records {
        record.pitch.iter().for_each(|&(_, hz)| pitch.push(hz));
        for frame in &record.formants {
            f1.push(frame.f1);
            f2.push(frame.f2);
            f3.push(frame.f3);
        }
    }
    CorpusSummary {
        records: records.len(),
        pitch: pitch.value(),
        f1: f1.value(),
        f2: f2.value(),
        f3: f3.value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::sink::JsonSink;
    use crate::types::ProsodyFrame;

    fn record(pitch: &[f64], formants: &[[f64; 3]]) -> FeatureRecord {
        FeatureRecord {
            pitch: pitch.iter().enumerate().map(|(i, &hz)| (i as f64 * 0.01, hz)).collect(),
            formants: formants
                .iter()
                .enumerate()
                .map(|(i, f)| ProsodyFrame {
                    time: i as f64 * 0.01,
                    f1: f[0],
                    f2: f[1],
                    f3: f[2],
                })
                .collect(),
            speech_rate: 1.0,
            speaking_time: 1.0,
            nuclei: 1,
            duration: 1.0,
            articulation_rate: Some(1.0),
        }
    }

    #[test]
    fn pools_samples_across_records() {
        let summary = summarize(&[
            record(&[100.0, 200.0], &[[500.0, 1500.0, 2500.0]]),
            record(&[300.0], &[[700.0, 1700.0, 2700.0], [600.0, 1600.0, 2600.0]]),
        ]);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.pitch, Some(200.0));
        assert_eq!(summary.f1, Some(600.0));
        assert_eq!(summary.f3, Some(2600.0));
    }

    #[test]
    fn empty_corpus_has_no_means() {
        let summary = summarize(&[]);
        assert_eq!(summary, CorpusSummary::default());
    }

    #[test]
    fn directory_summary_skips_foreign_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::create(dir.path()).unwrap();
        sink.write_to(&sink.record_path(Path::new("a.wav")), &record(&[120.0], &[])).unwrap();
        sink.write_to(&sink.record_path(Path::new("b.wav")), &record(&[180.0], &[])).unwrap();
        fs::write(dir.path().join("notes.json"), r#"{"hello": 1}"#).unwrap();
        fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let summary = summarize_dir(dir.path()).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.pitch, Some(150.0));
        assert_eq!(summary.f1, None);
    }
}
