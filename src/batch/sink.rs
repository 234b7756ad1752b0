use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::types::FeatureRecord;

/// Writes one pretty-printed JSON record per recording into a directory.
#[derive(Debug, Clone)]
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    /// Creates the output directory (and parents) when missing.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<audio file stem>.json`
    pub fn record_path(&self, audio: &Path) -> PathBuf {
        self.named(stem(audio))
    }

    /// One distinct record path per file, in input order.
    ///
    /// The first file keeps `<stem>.json`. A later file whose name is taken
    /// becomes `<parent>_<stem>.json`, numbered further if that is taken too.
    /// Names are compared case-insensitively.
    pub fn assign_record_paths(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        let mut taken = HashSet::new();
        files
            .iter()
            .map(|audio| {
                let plain = self.record_path(audio);
                if taken.insert(name_key(&plain)) {
                    return plain;
                }
                let mut base = audio
                    .parent()
                    .and_then(Path::file_name)
                    .map(OsString::from)
                    .unwrap_or_else(|| "recording".into());
                base.push("_");
                base.push(stem(audio));
                let mut candidate = self.named(base.clone());
                let mut counter = 2;
                while !taken.insert(name_key(&candidate)) {
                    let mut numbered = base.clone();
                    numbered.push(format!("_{counter}"));
                    candidate = self.named(numbered);
                    counter += 1;
                }
                warn!(
                    path = %audio.display(),
                    taken = %plain.display(),
                    record = %candidate.display(),
                    "record name already in use; renamed"
                );
                candidate
            })
            .collect()
    }

    pub fn write_to(&self, path: &Path, record: &FeatureRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn named(&self, mut name: OsString) -> PathBuf {
        name.push(".json");
        self.dir.join(name)
    }
}

fn stem(audio: &Path) -> OsString {
    audio
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| "recording".into())
}

fn name_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
