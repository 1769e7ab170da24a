//! Chunked transcription orchestration and end-to-end evaluation.

use crate::audio::WavStream;
use crate::chunk::ChunkConfig;
use crate::error::{Error, Result};
use crate::metrics::EvalMetrics;
use crate::report::EvaluationRecord;
use crate::traits::Transcriber;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Cooperative cancellation signal for a running evaluation.
///
/// Cloned tokens share one flag; raising it from any thread aborts the run
/// before the next segment. An aborted run fails with `Error::Cancelled`
/// instead of yielding a partial record, since metrics over an incomplete
/// hypothesis would be misleading.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, unraised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the signal has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of transcribing one stream chunk by chunk.
#[derive(Clone, Debug)]
pub struct Transcription {
    /// Per-segment texts joined with single spaces, in segment order
    pub hypothesis: String,
    /// Sum of per-segment engine times in seconds.
    ///
    /// Excludes chunking and audio I/O so RTF reflects inference cost only.
    pub transcription_time: f64,
    /// Total audio duration in seconds
    pub audio_duration: f64,
    /// Number of segments processed
    pub segments: usize,
}

/// Drives sequential chunk transcription and metric computation.
pub struct Evaluator<T> {
    transcriber: T,
    config: ChunkConfig,
    cancel: CancelToken,
}

impl<T: Transcriber> Evaluator<T> {
    /// Create an evaluator over a transcription engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChunkDuration` for a non-positive chunk duration.
    pub fn new(transcriber: T, config: ChunkConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            transcriber,
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Token that aborts this evaluator's runs from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Transcribe a stream segment by segment.
    ///
    /// Segments are processed strictly in order and their texts concatenated
    /// in that order. A failed segment aborts the run: padding it with empty
    /// text would silently corrupt WER/CER.
    pub fn transcribe(&mut self, stream: &mut WavStream) -> Result<Transcription> {
        let plan = self.config.plan(stream.frames(), stream.sample_rate())?;
        let total = plan.segment_count();

        tracing::info!(
            segments = total,
            duration_sec = stream.duration(),
            "starting chunked transcription"
        );

        let mut texts = Vec::with_capacity(total);
        let mut transcription_time = 0.0;

        for segment in plan {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    completed: segment.index,
                    total,
                });
            }

            let samples = stream.read_frames(segment.frame_count() as usize)?;

            let started = Instant::now();
            let text = self
                .transcriber
                .transcribe(&samples)
                .map_err(|source| Error::Transcription {
                    index: segment.index,
                    source,
                })?;
            let elapsed = started.elapsed().as_secs_f64();

            tracing::debug!(chunk = segment.index + 1, total, elapsed, "transcribed chunk");

            transcription_time += elapsed;
            texts.push(text);
        }

        Ok(Transcription {
            hypothesis: texts.join(" "),
            transcription_time,
            audio_duration: stream.duration(),
            segments: total,
        })
    }

    /// Run the full evaluation: transcribe, score, assemble the record.
    pub fn evaluate(
        &mut self,
        audio_path: impl AsRef<Path>,
        reference: &str,
    ) -> Result<EvaluationRecord> {
        let audio_path = audio_path.as_ref();
        let mut stream = WavStream::open(audio_path)?;

        let transcription = self.transcribe(&mut stream)?;
        let metrics = EvalMetrics::compute(reference, &transcription.hypothesis)?;

        tracing::info!(
            wer = metrics.wer,
            cer = metrics.cer,
            transcription_time = transcription.transcription_time,
            "evaluation completed"
        );

        let record = EvaluationRecord::new(
            audio_path.display().to_string(),
            transcription.audio_duration,
            transcription.transcription_time,
            transcription.hypothesis,
            reference.to_string(),
            metrics,
        )?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;
    use crate::error::TranscriberError;
    use hound::{SampleFormat, WavWriter};
    use std::path::PathBuf;

    /// Engine stub that returns scripted texts and records call shapes.
    struct ScriptedEngine {
        calls: usize,
        sample_counts: Vec<usize>,
        fail_at: Option<usize>,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                calls: 0,
                sample_counts: Vec::new(),
                fail_at: None,
            }
        }

        fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::new()
            }
        }
    }

    impl Transcriber for ScriptedEngine {
        fn transcribe(&mut self, samples: &[f32]) -> std::result::Result<String, TranscriberError> {
            let index = self.calls;
            self.calls += 1;
            self.sample_counts.push(samples.len());

            if self.fail_at == Some(index) {
                return Err("engine exploded".into());
            }

            Ok(format!("seg{index}"))
        }
    }

    fn write_silence_wav(name: &str, duration_sec: f64) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..(duration_sec * SAMPLE_RATE as f64) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        path
    }

    #[test]
    fn preserves_segment_order() {
        let path = write_silence_wav("lark_pipeline_order.wav", 9.5);
        let mut stream = WavStream::open(&path).unwrap();

        let mut evaluator = Evaluator::new(ScriptedEngine::new(), ChunkConfig::new(3.0)).unwrap();
        let result = evaluator.transcribe(&mut stream).unwrap();

        assert_eq!(result.hypothesis, "seg0 seg1 seg2 seg3");
        assert_eq!(result.segments, 4);
        assert!((result.audio_duration - 9.5).abs() < 0.001);

        // Segment sample counts: [3s, 3s, 3s, 0.5s] at 16kHz
        assert_eq!(
            evaluator.transcriber.sample_counts,
            vec![48000, 48000, 48000, 8000]
        );

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn fails_fast_on_engine_error() {
        // 13 seconds at 3s chunks: 5 segments, engine dies on the third
        let path = write_silence_wav("lark_pipeline_fail.wav", 13.0);
        let mut stream = WavStream::open(&path).unwrap();

        let mut evaluator =
            Evaluator::new(ScriptedEngine::failing_at(2), ChunkConfig::new(3.0)).unwrap();
        let result = evaluator.transcribe(&mut stream);

        match result {
            Err(Error::Transcription { index: 2, .. }) => {}
            other => panic!("expected Transcription error on segment 2, got {other:?}"),
        }
        // No segment after the failing one was attempted
        assert_eq!(evaluator.transcriber.calls, 3);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn cancellation_aborts_before_next_segment() {
        let path = write_silence_wav("lark_pipeline_cancel.wav", 9.5);
        let mut stream = WavStream::open(&path).unwrap();

        let mut evaluator = Evaluator::new(ScriptedEngine::new(), ChunkConfig::new(3.0)).unwrap();
        evaluator.cancel_token().cancel();

        match evaluator.transcribe(&mut stream) {
            Err(Error::Cancelled {
                completed: 0,
                total: 4,
            }) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert_eq!(evaluator.transcriber.calls, 0);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_invalid_chunk_duration() {
        assert!(Evaluator::new(ScriptedEngine::new(), ChunkConfig::new(0.0)).is_err());
    }
}
