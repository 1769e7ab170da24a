//! Parakeet TDT ONNX transcription engine.
//!
//! Implements the evaluation pipeline's [`Transcriber`] seam with the
//! Token-and-Duration Transducer architecture: mel-spectrogram features feed
//! an encoder, and a joint decoder predicts tokens together with how many
//! frames to skip. Only the decoded text leaves this module; the evaluation
//! report has no use for timestamps.

mod mel;

pub use mel::{MelConfig, MelExtractor};

use eyre::{OptionExt, Result, WrapErr, eyre};
use hf_hub::api::sync::Api;
use lark_eval::Transcriber;
use lark_eval::error::TranscriberError;
use ndarray::{Array1, Array2, Array3, ArrayViewD, Axis, Ix1, Ix3};
use ndarray_stats::QuantileExt;
#[allow(unused_imports)]
use ort::execution_providers::*;
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use ort::{inputs, value::Tensor, value::Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokenizers::Tokenizer;

/// Default Hugging Face model repository.
pub const MODEL_ID: &str = "istupakov/parakeet-tdt-0.6b-v3-onnx";

const MODEL_FILES: &[&str] = &[
    "encoder-model.onnx",
    "encoder-model.onnx.data",
    "decoder_joint-model.onnx",
    "tokenizer.json",
];

/// Compute device for inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Device {
    /// First available compiled-in provider, CPU fallback
    Auto,
    Cpu,
    Cuda,
    Tensorrt,
    Openvino,
    Directml,
    Coreml,
}

/// Inference-time engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing expected output tensor
    #[error("missing model output: {name}")]
    MissingOutput { name: &'static str },

    /// Duration index out of bounds
    #[error("duration index {index} out of bounds (max {max})")]
    DurationIndexOutOfBounds { index: usize, max: usize },

    /// Token ids could not be decoded to text
    #[error("detokenization failed: {0}")]
    Detokenize(String),

    /// ONNX Runtime error
    #[error(transparent)]
    Ort(#[from] ort::Error),

    /// ndarray shape error
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    /// ndarray-stats argmax error
    #[error(transparent)]
    ArgMax(#[from] ndarray_stats::errors::MinMaxError),
}

/// Parakeet TDT engine.
pub struct TdtEngine {
    mel: MelExtractor,
    encoder: Session,
    decoder_joint: Session,
    tokenizer: Tokenizer,
    durations: Vec<usize>,
}

impl TdtEngine {
    /// Fetch the model from the Hugging Face Hub and load it.
    pub fn from_hub(model_id: &str, device: Device) -> Result<Self> {
        let model_dir = fetch_model(model_id)?;
        Self::from_dir(&model_dir, device)
    }

    /// Load the model from a local directory.
    pub fn from_dir(model_dir: &Path, device: Device) -> Result<Self> {
        tracing::info!(dir = ?model_dir.display(), ?device, "loading model");

        let builder = session_builder(device)?;

        let encoder = builder
            .clone()
            .commit_from_file(model_dir.join("encoder-model.onnx"))
            .wrap_err("failed to load encoder session")?;

        let decoder_joint = builder
            .commit_from_file(model_dir.join("decoder_joint-model.onnx"))
            .wrap_err("failed to load decoder session")?;

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| eyre!(e))
            .wrap_err("failed to load tokenizer")?;

        Ok(Self {
            mel: MelExtractor::parakeet(),
            encoder,
            decoder_joint,
            tokenizer,
            durations: vec![0, 1, 2, 3, 4],
        })
    }

    /// Blank token id; the joint head lays logits out as
    /// `[vocab_0..vocab_n, blank, duration_0..duration_4]`.
    fn blank_id(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    fn run(&mut self, samples: &[f32]) -> Result<String, EngineError> {
        let features = self.mel.extract(samples);

        // A tail segment shorter than one analysis window carries no frames
        if features.shape()[0] == 0 {
            return Ok(String::new());
        }

        let (encoder_output, encoded_length) = self.encode(features)?;
        let token_ids = self.greedy_decode(encoder_output, encoded_length as usize)?;

        let text = self
            .tokenizer
            .decode(&token_ids, true)
            .map_err(|e| EngineError::Detokenize(e.to_string()))?;

        Ok(text.trim().to_string())
    }

    fn encode(&mut self, features: Array2<f32>) -> Result<(Array3<f32>, i64), EngineError> {
        let length = Value::from_array(Array1::from_elem((1,), features.shape()[0] as i64))?;

        // (time, mels) -> (1, mels, time) as the encoder expects
        let signal = Value::from_array(features.reversed_axes().insert_axis(Axis(0)))?;

        let mut outputs = self.encoder.run(inputs!(
            "audio_signal" => signal,
            "length" => length,
        ))?;

        let encoder_outputs = outputs
            .remove("outputs")
            .ok_or(EngineError::MissingOutput { name: "outputs" })?
            .try_extract_array()?
            .to_owned()
            .into_dimensionality::<Ix3>()?;

        let encoded_lengths = outputs
            .remove("encoded_lengths")
            .ok_or(EngineError::MissingOutput {
                name: "encoded_lengths",
            })?
            .try_extract_array()?
            .to_owned()
            .into_dimensionality::<Ix1>()?;

        Ok((encoder_outputs, encoded_lengths[0]))
    }

    fn greedy_decode(
        &mut self,
        encoder_output: Array3<f32>,
        encoded_length: usize,
    ) -> Result<Vec<u32>, EngineError> {
        let blank_id = self.blank_id();
        let max_symbols_per_step = 10;

        // Decoder LSTM state shape for the 0.6b TDT model
        let mut states_1 = Tensor::from_array(Array3::<f32>::zeros((2, 1, 640)))?.into_dyn();
        let mut states_2 = Tensor::from_array(Array3::<f32>::zeros((2, 1, 640)))?.into_dyn();

        let mut target = Tensor::from_array(Array2::from_elem((1, 1), blank_id as i32))?;
        let target_length = Tensor::from_array(Array1::from_elem((1,), 1))?;

        let mut token_ids = Vec::new();
        let mut frame_index = 0;

        while frame_index < encoded_length {
            let frame = encoder_output
                .slice_axis(Axis(2), (frame_index..frame_index + 1).into())
                .into_owned();
            let frame = Tensor::from_array(frame)?;

            // Label looping: emit multiple tokens per frame if the decoder keeps predicting non-blank
            'inner: {
                for _ in 0..max_symbols_per_step {
                    let mut outputs = self.decoder_joint.run(inputs!(
                        "encoder_outputs" => &frame,
                        "targets" => &target,
                        "target_length" => &target_length,
                        "input_states_1" => &states_1,
                        "input_states_2" => &states_2
                    ))?;

                    let logits_view: ArrayViewD<f32> = outputs["outputs"].try_extract_array()?;
                    let logits = logits_view.flatten();

                    let token_id = logits
                        .slice_axis(Axis(0), (0..blank_id + 1).into())
                        .argmax()?;
                    let duration_idx = logits
                        .slice_axis(Axis(0), (blank_id + 1..).into())
                        .argmax()?;

                    let skip = self.durations.get(duration_idx).copied().ok_or(
                        EngineError::DurationIndexOutOfBounds {
                            index: duration_idx,
                            max: self.durations.len() - 1,
                        },
                    )?;

                    if token_id != blank_id {
                        // Carry LSTM states forward for the next token prediction
                        states_1 = outputs.remove("output_states_1").ok_or(
                            EngineError::MissingOutput {
                                name: "output_states_1",
                            },
                        )?;
                        states_2 = outputs.remove("output_states_2").ok_or(
                            EngineError::MissingOutput {
                                name: "output_states_2",
                            },
                        )?;

                        token_ids.push(token_id as u32);
                        target[[0, 0]] = token_id as i32;
                    }

                    frame_index = encoded_length.min(frame_index + skip);

                    // Duration > 0: advance to the next frame
                    if skip != 0 {
                        break 'inner;
                    }
                }

                // Max symbols reached without a duration prediction: force frame advance
                frame_index += 1;
            }
        }

        Ok(token_ids)
    }
}

impl Transcriber for TdtEngine {
    fn transcribe(&mut self, samples: &[f32]) -> Result<String, TranscriberError> {
        Ok(self.run(samples)?)
    }
}

/// Fetch model files from the Hugging Face Hub.
fn fetch_model(model_id: &str) -> Result<PathBuf> {
    tracing::info!(model = model_id, "locating model");

    let api = Api::new()?;
    let repo = api.model(model_id.to_string());

    MODEL_FILES
        .iter()
        .map(|file| repo.get(file))
        .try_fold(None, |_, res| res.map(Some))?
        .ok_or_eyre("no model files specified")?
        .parent()
        .ok_or_eyre("failed to get model directory")
        .map(Path::to_path_buf)
}

/// Build an ONNX session builder configured for the selected device.
///
/// `auto` registers every provider compiled in via Cargo features, in
/// priority order; ONNX Runtime falls back to CPU when none is available.
/// Naming a provider that was not compiled in is a hard error rather than a
/// silent CPU fallback.
fn session_builder(device: Device) -> Result<SessionBuilder> {
    let builder = Session::builder()?;

    let builder = match device {
        Device::Auto => {
            let providers: Vec<ExecutionProviderDispatch> = vec![
                #[cfg(feature = "cuda")]
                CUDAExecutionProvider::default().build(),
                #[cfg(feature = "tensorrt")]
                TensorRTExecutionProvider::default().build(),
                #[cfg(feature = "openvino")]
                OpenVINOExecutionProvider::default().build(),
                #[cfg(feature = "directml")]
                DirectMLExecutionProvider::default().build(),
                #[cfg(feature = "coreml")]
                CoreMLExecutionProvider::default().build(),
            ];

            builder.with_execution_providers(providers)?
        }

        Device::Cpu => builder,

        #[cfg(feature = "cuda")]
        Device::Cuda => {
            builder.with_execution_providers([CUDAExecutionProvider::default().build()])?
        }
        #[cfg(not(feature = "cuda"))]
        Device::Cuda => eyre::bail!("device `cuda` requires building with the `cuda` feature"),

        #[cfg(feature = "tensorrt")]
        Device::Tensorrt => {
            builder.with_execution_providers([TensorRTExecutionProvider::default().build()])?
        }
        #[cfg(not(feature = "tensorrt"))]
        Device::Tensorrt => {
            eyre::bail!("device `tensorrt` requires building with the `tensorrt` feature")
        }

        #[cfg(feature = "openvino")]
        Device::Openvino => {
            builder.with_execution_providers([OpenVINOExecutionProvider::default().build()])?
        }
        #[cfg(not(feature = "openvino"))]
        Device::Openvino => {
            eyre::bail!("device `openvino` requires building with the `openvino` feature")
        }

        #[cfg(feature = "directml")]
        Device::Directml => {
            builder.with_execution_providers([DirectMLExecutionProvider::default().build()])?
        }
        #[cfg(not(feature = "directml"))]
        Device::Directml => {
            eyre::bail!("device `directml` requires building with the `directml` feature")
        }

        #[cfg(feature = "coreml")]
        Device::Coreml => {
            builder.with_execution_providers([CoreMLExecutionProvider::default().build()])?
        }
        #[cfg(not(feature = "coreml"))]
        Device::Coreml => {
            eyre::bail!("device `coreml` requires building with the `coreml` feature")
        }
    };

    Ok(builder)
}
