//! Parallel extraction over many recordings.

pub mod sink;
pub mod summary;

use std::fs;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::acoustics::AcousticCurveProvider;
use crate::error::panic_message;
use crate::features::FeatureExtractor;

pub use sink::JsonSink;
pub use summary::{summarize_dir, CorpusSummary};

/// Per-file outcome counts of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(audio, record)` pairs in input order.
    pub written: Vec<(PathBuf, PathBuf)>,
    /// `(audio, reason)` pairs in input order.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

enum Outcome {
    Written { index: usize, record: PathBuf },
    Failed { index: usize, reason: String },
}

/// Expands `inputs` into a sorted, de-duplicated list of audio files.
///
/// Files named directly are kept whatever their extension; directories are
/// walked recursively for files ending in `extension` (case-insensitive).
/// Missing paths are logged and skipped.
pub fn collect_inputs(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            walk_dir(input, extension, &mut files)?;
        } else {
            warn!(path = %input.display(), "input does not exist; skipping");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read input directory {:?}", dir))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {:?}", dir))?
            .path();
        if path.is_dir() {
            walk_dir(&path, extension, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Worker count for `requested` jobs; zero means one per available core.
pub fn resolve_jobs(requested: usize, files: usize) -> usize {
    let jobs = if requested == 0 {
        thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        requested
    };
    jobs.min(files).max(1)
}

/// Extracts every file in `files` on `jobs` scoped workers and writes the
/// records through `sink`.
///
/// Record names are fixed before the workers start, so recordings sharing a
/// file name never write the same record. Each file is claimed exactly once
/// from a shared cursor. Errors and panics are confined to their own file.
pub fn run_batch<P>(
    provider: &P,
    extractor: &FeatureExtractor,
    sink: &JsonSink,
    files: &[PathBuf],
    jobs: usize,
) -> BatchReport
where
    P: AcousticCurveProvider + Sync,
{
    let jobs = resolve_jobs(jobs, files.len());
    let records = sink.assign_record_paths(files);
    let records = &records;
    let cursor = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    info!(files = files.len(), jobs, "starting feature extraction");

    thread::scope(|scope| {
        for worker in 0..jobs {
            let tx = tx.clone();
            let cursor = &cursor;
            scope.spawn(move || loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(audio) = files.get(index) else {
                    break;
                };
                debug!(worker, path = %audio.display(), "processing");
                let outcome =
                    process_file(provider, extractor, sink, index, audio, &records[index]);
                if tx.send(outcome).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut outcomes: Vec<Outcome> = rx.into_iter().collect();
    outcomes.sort_by_key(|outcome| match outcome {
        Outcome::Written { index, .. } | Outcome::Failed { index, .. } => *index,
    });
    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Written { index, record } => {
                report.written.push((files[index].clone(), record))
            }
            Outcome::Failed { index, reason } => {
                report.failed.push((files[index].clone(), reason))
            }
        }
    }
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "feature extraction finished"
    );
    report
}

fn process_file<P: AcousticCurveProvider>(
    provider: &P,
    extractor: &FeatureExtractor,
    sink: &JsonSink,
    index: usize,
    audio: &Path,
    record_path: &Path,
) -> Outcome {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<()> {
        let record = extractor
            .extract(provider, audio)
            .with_context(|| format!("failed to analyse {:?}", audio))?;
        sink.write_to(record_path, &record)
            .with_context(|| format!("failed to write {:?}", record_path))
    }));
    match attempt {
        Ok(Ok(())) => {
            let record = record_path.to_path_buf();
            info!(path = %audio.display(), record = %record.display(), "wrote features");
            Outcome::Written { index, record }
        }
        Ok(Err(err)) => {
            let reason = format!("{err:#}");
            error!(path = %audio.display(), error = %reason, "extraction failed");
            Outcome::Failed { index, reason }
        }
        Err(payload) => {
            let reason = format!("analysis panicked: {}", panic_message(payload.as_ref()));
            error!(path = %audio.display(), error = %reason, "extraction failed");
            Outcome::Failed { index, reason }
        }
    }
}
