use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prosodia::acoustics::NativeAnalyzer;
use prosodia::batch::{self, JsonSink};
use prosodia::cli::{Cli, Command, ExtractArgs, SummarizeArgs};
use prosodia::features::FeatureExtractor;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract(args) => handle_extract(&args),
        Command::Summarize(args) => handle_summarize(&args),
    }
}

fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let config = args
        .analysis_config()
        .context("Failed to load analysis settings")?;
    let sink = JsonSink::create(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;
    let files = batch::collect_inputs(&args.inputs, &args.extension)?;
    if files.is_empty() {
        info!("no audio files found");
        return Ok(());
    }

    let provider = NativeAnalyzer::from_config(&config);
    let extractor = FeatureExtractor::new(config);
    let report = batch::run_batch(&provider, &extractor, &sink, &files, args.jobs);

    println!(
        "Processed {} file(s): {} written, {} failed",
        report.total(),
        report.written.len(),
        report.failed.len()
    );
    for (audio, reason) in &report.failed {
        println!("  failed: {} ({})", audio.display(), reason);
    }
    Ok(())
}

fn handle_summarize(args: &SummarizeArgs) -> Result<()> {
    let summary = batch::summarize_dir(&args.dir)?;
    let show = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
    println!("Records: {}", summary.records);
    println!("Average Pitch: {}", show(summary.pitch));
    println!("Average F1: {}", show(summary.f1));
    println!("Average F2: {}", show(summary.f2));
    println!("Average F3: {}", show(summary.f3));
    Ok(())
}
