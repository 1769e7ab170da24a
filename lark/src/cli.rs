//! CLI argument definitions using clap.

use crate::engine::{Device, MODEL_ID};
use clap::{Parser, Subcommand};
use eyre::Result;

#[derive(Debug, Parser)]
#[command(name = "lark")]
#[command(about = "ASR accuracy evaluation against reference transcripts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate transcription accuracy against a reference transcript
    Eval(crate::eval::Args),

    /// Transcribe an audio file and print the hypothesis
    Transcribe(crate::transcribe::Args),
}

/// Model and device selection shared by subcommands.
#[derive(clap::Args, Debug)]
pub struct ModelArgs {
    /// Hugging Face model repository id
    #[arg(long, default_value = MODEL_ID)]
    pub model_id: String,

    /// Compute device for inference
    #[arg(long, value_enum, default_value = "auto")]
    pub device: Device,
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Eval(args) => crate::eval::execute(args.try_into()?),
        Commands::Transcribe(args) => crate::transcribe::execute(args.try_into()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_eval_command_with_defaults() {
        let cli = Cli::parse_from(["lark", "eval", "audio.wav", "ref.txt"]);

        match &cli.command {
            Commands::Eval(args)
                if args.audio.to_str() == Some("audio.wav")
                    && args.reference.to_str() == Some("ref.txt") =>
            {
                assert_eq!(args.output.to_str(), Some("evaluation_results.json"));
                assert!((args.chunk_duration - 30.0).abs() < 0.001);
                assert_eq!(args.model.device, Device::Auto);
                assert_eq!(args.model.model_id, MODEL_ID);
            }
            _ => panic!("unexpected command: {:?}", cli.command),
        }
    }

    #[test]
    fn parses_eval_with_options() {
        let cli = Cli::parse_from([
            "lark",
            "eval",
            "audio.wav",
            "ref.txt",
            "-o",
            "results.json",
            "--chunk-duration",
            "45",
            "--device",
            "cpu",
        ]);

        match &cli.command {
            Commands::Eval(args) => {
                assert_eq!(args.output.to_str(), Some("results.json"));
                assert!((args.chunk_duration - 45.0).abs() < 0.001);
                assert_eq!(args.model.device, Device::Cpu);
            }
            _ => panic!("unexpected command: {:?}", cli.command),
        }
    }

    #[test]
    fn parses_transcribe_command() {
        let cli = Cli::parse_from(["lark", "transcribe", "audio.wav"]);

        match &cli.command {
            Commands::Transcribe(args) if args.audio.to_str() == Some("audio.wav") => {
                assert!(args.output.is_none());
                assert!((args.chunk_duration - 30.0).abs() < 0.001);
            }
            _ => panic!("unexpected command: {:?}", cli.command),
        }
    }

    #[test]
    fn parses_transcribe_with_output() {
        let cli = Cli::parse_from(["lark", "transcribe", "audio.wav", "-o", "hyp.txt"]);

        match &cli.command {
            Commands::Transcribe(args) => {
                assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("hyp.txt"));
            }
            _ => panic!("unexpected command: {:?}", cli.command),
        }
    }
}
