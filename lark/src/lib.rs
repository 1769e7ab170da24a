//! Lark: evaluate ASR transcription accuracy against reference transcripts.
//!
//! Wraps the [`lark_eval`] pipeline with a Parakeet TDT ONNX engine and a
//! command-line interface.

pub mod cli;
pub mod engine;
pub mod eval;
pub mod transcribe;
