//! Audio chunking for evaluating long recordings segment by segment.

use crate::error::{AudioError, ConfigError, Result};

/// Default chunk duration in seconds
pub const DEFAULT_CHUNK_DURATION: f64 = 30.0;

/// Configuration for audio chunking.
///
/// Segments are disjoint: segment `i` covers `[i*duration, (i+1)*duration)`
/// of the stream, with the final segment truncated at stream end.
#[derive(Clone, Copy, Debug)]
pub struct ChunkConfig {
    /// Chunk duration in seconds for long audio
    pub duration: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_CHUNK_DURATION,
        }
    }
}

impl ChunkConfig {
    /// Create a new chunk configuration.
    pub fn new(duration_sec: f64) -> Self {
        Self {
            duration: duration_sec,
        }
    }

    /// Validate the configured duration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.duration.is_finite() && self.duration > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidChunkDuration(self.duration))
        }
    }

    /// Chunk size in sample frames at the given sample rate.
    pub fn chunk_frames(&self, sample_rate: u32) -> u64 {
        ((self.duration * f64::from(sample_rate)).round() as u64).max(1)
    }

    /// Plan the segmentation of a stream with `total_frames` frames.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChunkDuration` for a non-positive duration and
    /// `EmptyStream` when the stream has no frames.
    pub fn plan(&self, total_frames: u64, sample_rate: u32) -> Result<ChunkPlan> {
        self.validate()?;

        if total_frames == 0 {
            return Err(AudioError::EmptyStream.into());
        }

        Ok(ChunkPlan {
            total_frames,
            chunk_frames: self.chunk_frames(sample_rate),
            sample_rate,
            index: 0,
        })
    }
}

/// A contiguous, non-overlapping span of the source stream.
///
/// Boundaries are exact sample frames, so the union of all segments
/// reconstructs the stream with no gaps or overlaps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Position in the chunking (0-based); also the concatenation order
    pub index: usize,
    /// First frame of the span (inclusive)
    pub start_frame: u64,
    /// Last frame of the span (exclusive)
    pub end_frame: u64,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Segment {
    /// Number of sample frames in the segment.
    pub fn frame_count(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Lazy iterator over the segments of a stream.
///
/// The plan is cheap to build and `Clone`, so a consumer can restart from
/// any point without touching the underlying audio. Frame positions are
/// derived from the segment index rather than accumulated, avoiding float
/// drift over many segments.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    total_frames: u64,
    chunk_frames: u64,
    sample_rate: u32,
    index: usize,
}

impl ChunkPlan {
    /// Total number of segments the plan produces.
    pub fn segment_count(&self) -> usize {
        self.total_frames.div_ceil(self.chunk_frames) as usize
    }
}

impl Iterator for ChunkPlan {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let start_frame = self.index as u64 * self.chunk_frames;
        if start_frame >= self.total_frames {
            return None;
        }

        let end_frame = (start_frame + self.chunk_frames).min(self.total_frames);
        let rate = f64::from(self.sample_rate);

        let segment = Segment {
            index: self.index,
            start_frame,
            end_frame,
            start: start_frame as f64 / rate,
            end: end_frame as f64 / rate,
        };

        self.index += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segment_count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkPlan {}
