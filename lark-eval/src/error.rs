//! Error types for lark-eval organized by pipeline stage.

use thiserror::Error;

/// Boxed error produced by an external transcription engine.
///
/// Engines live outside this crate, so the orchestrator accepts any boxed
/// error and attaches the failing segment index when wrapping it.
pub type TranscriberError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Evaluation pipeline error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Audio loading stage error
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Metric computation error
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Report assembly error
    #[error(transparent)]
    Report(#[from] ReportError),

    /// External transcription engine failed on one segment.
    ///
    /// Fatal for the run: substituting empty text for the failed segment
    /// would corrupt WER/CER without warning.
    #[error("transcription failed on segment {index}")]
    Transcription {
        index: usize,
        #[source]
        source: TranscriberError,
    },

    /// Run aborted via the cancellation token before completing.
    #[error("evaluation cancelled after {completed} of {total} segments")]
    Cancelled { completed: usize, total: usize },
}

/// Configuration errors (chunking parameters).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Non-positive or non-finite chunk duration
    #[error("invalid chunk duration: {0}s (must be positive)")]
    InvalidChunkDuration(f64),
}

/// Audio loading and validation errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Stream contains no samples
    #[error("audio stream is empty")]
    EmptyStream,

    /// Sample rate validation failed
    #[error("invalid sample rate: expected {expected}Hz, got {got}Hz")]
    InvalidSampleRate { expected: u32, got: u32 },

    /// Channel count validation failed
    #[error("invalid channel count: expected mono or stereo, got {0} channels")]
    InvalidChannels(u16),

    /// IO error during audio loading
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV file format error
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

/// Metric computation errors.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Reference has zero words after normalization; error rates are
    /// undefined with nothing to compare against.
    #[error("reference text contains no words")]
    EmptyReference,
}

/// Report assembly errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Zero or negative audio duration makes RTF undefined
    #[error("invalid audio duration: {0}s")]
    InvalidAudioDuration(f64),
}

/// Result type alias for lark-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

// Nested From implementations for automatic error conversion chains

// hound::Error → AudioError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Audio(AudioError::Hound(e))
    }
}

// std::io::Error → AudioError → Error
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Audio(AudioError::Io(e))
    }
}
