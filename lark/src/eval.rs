//! Eval subcommand - score transcription accuracy against a reference.

use crate::cli::ModelArgs;
use crate::engine::{Device, TdtEngine};
use eyre::{Context, Result};
use lark_eval::chunk::DEFAULT_CHUNK_DURATION;
use lark_eval::{ChunkConfig, EvaluationRecord, Evaluator};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default output path for evaluation results.
const DEFAULT_OUTPUT: &str = "evaluation_results.json";

/// CLI arguments for accuracy evaluation.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to input WAV file
    pub audio: PathBuf,

    /// Path to reference transcript text file
    pub reference: PathBuf,

    /// Output JSON path for the evaluation record
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Chunk duration in seconds for long audio
    #[arg(long, default_value_t = DEFAULT_CHUNK_DURATION)]
    pub chunk_duration: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Resolved configuration for accuracy evaluation.
#[derive(Debug)]
pub struct Config {
    pub audio: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub chunk_config: ChunkConfig,
    pub model_id: String,
    pub device: Device,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let chunk_config = ChunkConfig::new(args.chunk_duration);
        chunk_config.validate()?;

        Ok(Self {
            audio: args.audio,
            reference: args.reference,
            output: args.output,
            chunk_config,
            model_id: args.model.model_id,
            device: args.model.device,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    // Validate inputs before any model work
    eyre::ensure!(
        config.audio.is_file(),
        "audio file not found: {:?}",
        config.audio.display()
    );

    let reference = read_reference(&config.reference)?;

    tracing::info!(
        audio = ?config.audio.display(),
        reference_chars = reference.len(),
        "starting evaluation"
    );

    let s = Instant::now();

    let engine = TdtEngine::from_hub(&config.model_id, config.device)?;

    let d = s.elapsed();
    tracing::info!(duration = %format_secs(d.as_secs_f64()), "model loaded");

    let mut evaluator = Evaluator::new(engine, config.chunk_config)?;
    let record = evaluator.evaluate(&config.audio, &reference)?;

    print_summary(&record);

    // Written only after a fully successful run; failures leave no file behind
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(&config.output, json)
        .wrap_err_with(|| format!("failed to write results: {:?}", config.output.display()))?;

    tracing::info!(path = ?config.output.display(), "results saved");

    Ok(())
}

/// Load and validate the reference transcript.
fn read_reference(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read reference: {:?}", path.display()))?;

    let text = text.trim().to_string();
    eyre::ensure!(!text.is_empty(), "reference text is empty: {:?}", path.display());

    Ok(text)
}

/// Print evaluation results to stdout.
fn print_summary(record: &EvaluationRecord) {
    let metrics = &record.metrics;

    println!("audio file:          {}", record.audio_path);
    println!(
        "audio duration:      {} ({:.2} min)",
        format_secs(record.audio_duration),
        record.audio_duration / 60.0
    );
    println!(
        "transcription time:  {}",
        format_secs(record.transcription_time)
    );
    println!("real-time factor:    {:.4}", record.rtf);
    println!();
    println!("word error rate:     {:.2}%", metrics.wer);
    println!("char error rate:     {:.2}%", metrics.cer);
    println!("word accuracy:       {:.2}%", metrics.word_accuracy);
    println!("char accuracy:       {:.2}%", metrics.char_accuracy);
    println!("reference words:     {}", metrics.reference_words);
    println!("hypothesis words:    {}", metrics.hypothesis_words);
}

/// Format seconds as a string with two decimal places.
pub(crate) fn format_secs(secs: f64) -> String {
    format!("{:.2}s", secs)
}
