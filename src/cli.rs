use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::AnalysisConfig;

pub const DEFAULT_OUT_DIR: &str = "out/json/features";

#[derive(Parser, Debug)]
#[command(
    name = "prosodia",
    version,
    about = "Batch prosodic feature extraction (pitch, formants, speech rate)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse recordings and write one JSON feature record per file.
    Extract(ExtractArgs),
    /// Print corpus-wide pitch and formant means over a record directory.
    Summarize(SummarizeArgs),
}

/// Command-line overrides for [`AnalysisConfig`] values.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Silence threshold below the intensity maximum in dB (negative).
    #[arg(long = "silence-db", allow_hyphen_values = true)]
    pub silence_db: Option<f64>,
    /// Shortest silence counted as a pause, in seconds.
    #[arg(long = "min-pause")]
    pub min_pause: Option<f64>,
    /// Minimum intensity dip between two nuclei, in dB.
    #[arg(long = "min-dip")]
    pub min_dip: Option<f64>,
    /// Half-width of the formant averaging window, in seconds.
    #[arg(long = "window-radius")]
    pub window_radius: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Audio files or directories to scan.
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory receiving the JSON records.
    #[arg(long = "out-dir", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
    /// JSON file with analysis settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Worker threads; 0 uses every available core.
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,
    /// Extension of the audio files picked up inside directories.
    #[arg(long, default_value = "wav")]
    pub extension: String,
    #[command(flatten)]
    pub tuning: TuningArgs,
}

impl ExtractArgs {
    /// Config file (or defaults) with the command-line overrides applied.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        let tuning = &self.tuning;
        if let Some(value) = tuning.silence_db {
            config.silence_db = value;
        }
        if let Some(value) = tuning.min_pause {
            config.min_pause = value;
        }
        if let Some(value) = tuning.min_dip {
            config.min_dip = value;
        }
        if let Some(value) = tuning.window_radius {
            config.window_radius = value;
        }
        config.validate()?;
        ensure!(!self.extension.trim().is_empty(), "extension must not be empty");
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Directory holding the JSON records.
    #[arg(value_name = "DIR", default_value = DEFAULT_OUT_DIR)]
    pub dir: PathBuf,
}
