//! Lazily-read WAV audio source for long recordings.

use crate::error::{AudioError, Result};
use hound::{SampleFormat, WavReader, WavSpec};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Expected sample rate for ASR models (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// A WAV file opened for sequential, on-demand reading.
///
/// Multi-hour recordings never fit comfortably in memory as decoded f32
/// samples, so the reader stays open and frames are pulled per segment as
/// the orchestrator consumes them. Stereo input is downmixed to mono and
/// integer samples are scaled to f32 in [-1, 1].
pub struct WavStream {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    total_frames: u64,
}

impl WavStream {
    /// Open a WAV file and validate it for evaluation.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - Sample rate is not 16kHz
    /// - Channel count is invalid (0 or > 2)
    /// - The stream contains no samples
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_rate != SAMPLE_RATE {
            return Err(AudioError::InvalidSampleRate {
                expected: SAMPLE_RATE,
                got: spec.sample_rate,
            }
            .into());
        }

        if spec.channels == 0 || spec.channels > 2 {
            return Err(AudioError::InvalidChannels(spec.channels).into());
        }

        let total_frames = u64::from(reader.duration());
        if total_frames == 0 {
            return Err(AudioError::EmptyStream.into());
        }

        Ok(Self {
            reader,
            spec,
            total_frames,
        })
    }

    /// Sample rate of the stream.
    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    /// Total number of per-channel sample frames.
    pub fn frames(&self) -> u64 {
        self.total_frames
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.total_frames as f64 / f64::from(self.spec.sample_rate)
    }

    /// Read up to `max_frames` frames as mono f32 samples.
    ///
    /// Consumes the stream sequentially: each call resumes where the
    /// previous one stopped. Returns fewer frames only at end of stream.
    pub fn read_frames(&mut self, max_frames: usize) -> Result<Vec<f32>> {
        let want = max_frames * usize::from(self.spec.channels);
        let mut interleaved = Vec::with_capacity(want);

        match self.spec.sample_format {
            SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(want) {
                    interleaved.push(sample?);
                }
            }
            SampleFormat::Int => {
                for sample in self.reader.samples::<i16>().take(want) {
                    interleaved.push(sample? as f32 / i16::MAX as f32);
                }
            }
        }

        if self.spec.channels == 2 {
            Ok(interleaved
                .chunks(2)
                .map(|frame| frame.iter().sum::<f32>() / 2.0)
                .collect())
        } else {
            Ok(interleaved)
        }
    }
}
