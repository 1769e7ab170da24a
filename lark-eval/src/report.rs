//! Final evaluation record assembly.

use crate::error::ReportError;
use crate::metrics::EvalMetrics;
use serde::Serialize;

/// Complete result of one evaluation run.
///
/// Immutable once constructed; serialized as the tool's JSON output.
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationRecord {
    /// Path of the evaluated audio file
    pub audio_path: String,
    /// Total audio duration in seconds
    pub audio_duration: f64,
    /// Sum of per-segment transcription times in seconds
    pub transcription_time: f64,
    /// Real-time factor: transcription_time / audio_duration
    pub rtf: f64,
    /// Concatenated model output
    pub hypothesis: String,
    /// Ground-truth transcript
    pub reference: String,
    /// Accuracy metrics
    pub metrics: EvalMetrics,
}

impl EvaluationRecord {
    /// Assemble a record and compute the real-time factor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAudioDuration` unless `audio_duration > 0`; RTF is
    /// undefined otherwise.
    pub fn new(
        audio_path: String,
        audio_duration: f64,
        transcription_time: f64,
        hypothesis: String,
        reference: String,
        metrics: EvalMetrics,
    ) -> Result<Self, ReportError> {
        if !audio_duration.is_finite() || audio_duration <= 0.0 {
            return Err(ReportError::InvalidAudioDuration(audio_duration));
        }

        Ok(Self {
            audio_path,
            audio_duration,
            transcription_time,
            rtf: transcription_time / audio_duration,
            hypothesis,
            reference,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> EvalMetrics {
        EvalMetrics::compute("a b", "a b").unwrap()
    }

    fn record(duration: f64, time: f64) -> Result<EvaluationRecord, ReportError> {
        EvaluationRecord::new(
            "audio.wav".to_string(),
            duration,
            time,
            "a b".to_string(),
            "a b".to_string(),
            metrics(),
        )
    }

    #[test]
    fn computes_rtf() {
        // Two hours of audio transcribed in six minutes
        let record = record(7200.0, 360.5).unwrap();

        assert!((record.rtf - 0.0501).abs() < 1e-3);
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(matches!(
            record(0.0, 1.0),
            Err(ReportError::InvalidAudioDuration(_))
        ));
        assert!(matches!(
            record(-1.0, 1.0),
            Err(ReportError::InvalidAudioDuration(_))
        ));
    }

    #[test]
    fn serializes_expected_fields() {
        let record = record(10.0, 1.0).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        for key in [
            "audio_path",
            "audio_duration",
            "transcription_time",
            "rtf",
            "hypothesis",
            "reference",
            "metrics",
        ] {
            assert!(json.get(key).is_some(), "missing field: {key}");
        }
        assert!(json["metrics"].get("wer").is_some());
    }
}
