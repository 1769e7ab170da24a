//! Mel-spectrogram feature extraction for the TDT encoder.

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Mel-spectrogram configuration.
#[derive(Clone, Copy, Debug)]
pub struct MelConfig {
    pub n_mels: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub win_length: usize,
    pub preemphasis: f32,
    pub sample_rate: usize,
}

impl MelConfig {
    /// Parakeet TDT front end (128 mel features at 16kHz).
    pub const PARAKEET: Self = Self {
        n_mels: 128,
        n_fft: 512,
        hop_length: 160,
        win_length: 400,
        preemphasis: 0.97,
        sample_rate: 16000,
    };
}

/// Mel-spectrogram extractor.
///
/// The Hann window, mel filterbank, and FFT plan are computed once at
/// construction; chunked transcription calls `extract` once per segment.
pub struct MelExtractor {
    config: MelConfig,
    window: Vec<f32>,
    filterbank: Array2<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelExtractor {
    /// Extractor configured for Parakeet TDT models.
    pub fn parakeet() -> Self {
        Self::new(MelConfig::PARAKEET)
    }

    pub fn new(config: MelConfig) -> Self {
        let window = hann_window(config.win_length);
        let filterbank = mel_filterbank(config.n_fft, config.n_mels, config.sample_rate);
        let fft = FftPlanner::new().plan_fft_forward(config.n_fft);

        Self {
            config,
            window,
            filterbank,
            fft,
        }
    }

    /// Extract mel-spectrogram features from 16kHz mono samples.
    ///
    /// Applies preemphasis, STFT, the mel filterbank, log compression, and
    /// per-feature mean/variance normalization. Returns `(time_steps,
    /// n_mels)`; zero rows when the audio is shorter than one analysis
    /// window.
    pub fn extract(&self, audio: &[f32]) -> Array2<f32> {
        if audio.len() < self.config.win_length {
            return Array2::zeros((0, self.config.n_mels));
        }

        let audio = preemphasized(audio, self.config.preemphasis);
        let power = self.power_spectrogram(&audio);

        let mel = self.filterbank.dot(&power).mapv(|x| x.max(1e-10).ln());

        normalize_features(mel.t().to_owned())
    }

    /// STFT power spectrogram, `(freq_bins, num_frames)`.
    fn power_spectrogram(&self, audio: &[f32]) -> Array2<f32> {
        let MelConfig {
            n_fft,
            hop_length,
            win_length,
            ..
        } = self.config;

        let num_frames = (audio.len() - win_length) / hop_length + 1;
        let freq_bins = n_fft / 2 + 1;
        let mut spectrogram = Array2::zeros((freq_bins, num_frames));

        let mut frame = vec![Complex::default(); n_fft];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop_length;

            frame.fill(Complex::default());
            for (i, (&sample, &weight)) in audio[start..start + win_length]
                .iter()
                .zip(&self.window)
                .enumerate()
            {
                frame[i] = Complex::new(sample * weight, 0.0);
            }

            self.fft.process(&mut frame);

            for (k, value) in frame.iter().take(freq_bins).enumerate() {
                spectrogram[[k, frame_idx]] = value.norm_sqr();
            }
        }

        spectrogram
    }
}

/// Preemphasis filter: `y[i] = x[i] - coef * x[i-1]`.
fn preemphasized(audio: &[f32], coef: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(audio.len());
    out.push(audio[0]);

    for pair in audio.windows(2) {
        out.push(pair[1] - coef * pair[0]);
    }

    out
}

/// Hann window for STFT framing.
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / (len as f32 - 1.0)).cos())
        .collect()
}

fn hz_to_mel(freq: f32) -> f32 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank, `(n_mels, freq_bins)`.
fn mel_filterbank(n_fft: usize, n_mels: usize, sample_rate: usize) -> Array2<f32> {
    let freq_bins = n_fft / 2 + 1;
    let mut filterbank = Array2::zeros((n_mels, freq_bins));

    let max_mel = hz_to_mel(sample_rate as f32 / 2.0);
    let mel_points: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
        .collect();

    let bin_width = sample_rate as f32 / n_fft as f32;

    for m in 0..n_mels {
        let (left, center, right) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);

        for k in 0..freq_bins {
            let freq = k as f32 * bin_width;

            filterbank[[m, k]] = if freq >= left && freq <= center {
                (freq - left) / (center - left)
            } else if freq > center && freq <= right {
                (right - freq) / (right - center)
            } else {
                0.0
            };
        }
    }

    filterbank
}

/// Normalize each feature dimension to mean 0, std 1.
fn normalize_features(mut features: Array2<f32>) -> Array2<f32> {
    let num_frames = features.shape()[0];

    for mut column in features.columns_mut() {
        let mean = column.iter().sum::<f32>() / num_frames as f32;
        let variance =
            column.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / num_frames as f32;
        let std = variance.sqrt().max(1e-10);

        column.mapv_inplace(|x| (x - mean) / std);
    }

    features
}
