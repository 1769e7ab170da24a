//! lark-eval: ASR accuracy evaluation for long audio.
//!
//! Measures transcription quality (WER/CER) and throughput (RTF) of a
//! speech-to-text engine against a known-correct reference transcript.
//! Audio of arbitrary length is split into bounded, non-overlapping
//! segments that are transcribed in order and concatenated into a single
//! hypothesis, so multi-hour recordings never need a single inference pass
//! or a fully decoded in-memory stream.
//!
//! # Architecture
//!
//! - [`audio::WavStream`]: lazily-read 16kHz WAV source
//! - [`chunk::ChunkPlan`]: frame-exact segmentation of the stream
//! - [`traits::Transcriber`]: the external speech-to-text capability
//! - [`pipeline::Evaluator`]: ordered chunk transcription with timing
//! - [`metrics::EvalMetrics`]: normalized-text WER/CER computation
//! - [`report::EvaluationRecord`]: the serialized result
//!
//! # Quick Start
//!
//! ```ignore
//! use lark_eval::chunk::ChunkConfig;
//! use lark_eval::pipeline::Evaluator;
//!
//! let engine = MyEngine::load()?; // anything implementing Transcriber
//! let mut evaluator = Evaluator::new(engine, ChunkConfig::default())?;
//!
//! let record = evaluator.evaluate("audio.wav", &reference_text)?;
//! println!("WER: {:.2}%", record.metrics.wer);
//! ```

pub mod audio;
pub mod chunk;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod traits;

pub use chunk::ChunkConfig;
pub use error::{Error, Result};
pub use metrics::EvalMetrics;
pub use pipeline::{CancelToken, Evaluator, Transcription};
pub use report::EvaluationRecord;
pub use traits::Transcriber;
