//! Core traits for the evaluation pipeline.

use crate::error::TranscriberError;

/// External transcription capability consumed by the pipeline.
///
/// The evaluation core treats the ASR model as a black box: anything that
/// turns a chunk of audio into text can be evaluated. The error type is
/// boxed so engines keep their own error enums.
///
/// Note: takes `&mut self` because inference runtimes such as ONNX Runtime
/// require mutable session access.
pub trait Transcriber {
    /// Transcribe one segment of 16kHz mono audio samples.
    fn transcribe(&mut self, samples: &[f32]) -> Result<String, TranscriberError>;
}
