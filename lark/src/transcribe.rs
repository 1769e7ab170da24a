//! Transcribe subcommand - produce a hypothesis without scoring it.

use crate::cli::ModelArgs;
use crate::engine::{Device, TdtEngine};
use crate::eval::format_secs;
use eyre::{Context, Result};
use lark_eval::audio::WavStream;
use lark_eval::chunk::DEFAULT_CHUNK_DURATION;
use lark_eval::{ChunkConfig, Evaluator};
use std::path::PathBuf;
use std::time::Instant;

/// CLI arguments for transcription.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to input WAV file
    pub audio: PathBuf,

    /// Write the hypothesis here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Chunk duration in seconds for long audio
    #[arg(long, default_value_t = DEFAULT_CHUNK_DURATION)]
    pub chunk_duration: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Resolved configuration for transcription.
#[derive(Debug)]
pub struct Config {
    pub audio: PathBuf,
    pub output: Option<PathBuf>,
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
            output: args.output,
            chunk_config,
            model_id: args.model.model_id,
            device: args.model.device,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    eyre::ensure!(
        config.audio.is_file(),
        "audio file not found: {:?}",
        config.audio.display()
    );

    let mut stream = WavStream::open(&config.audio)
        .wrap_err_with(|| format!("failed to load audio: {:?}", config.audio.display()))?;

    let s = Instant::now();

    let engine = TdtEngine::from_hub(&config.model_id, config.device)?;

    let d = s.elapsed();
    tracing::info!(duration = %format_secs(d.as_secs_f64()), "model loaded");

    let mut evaluator = Evaluator::new(engine, config.chunk_config)?;
    let result = evaluator.transcribe(&mut stream)?;

    tracing::info!(
        segments = result.segments,
        transcription_time = %format_secs(result.transcription_time),
        "transcription completed"
    );

    match &config.output {
        Some(path) => {
            std::fs::write(path, &result.hypothesis)
                .wrap_err_with(|| format!("failed to write hypothesis: {:?}", path.display()))?;
            tracing::info!(path = ?path.display(), "hypothesis saved");
        }
        None => println!("{}", result.hypothesis),
    }

    Ok(())
}
