//! # silk-tts
//!
//! Marker-driven speech stitching on top of a text-to-speech engine.
//!
//! Input text carries inline markers that are never spoken:
//!
//! | Marker | Effect |
//! |---|---|
//! | `[pause:0.5]` | Insert 0.5 s of silence |
//! | `...` | Insert the configured ellipsis pause (0.8 s by default) |
//! | `[soft]` | Volume 0.5 for all following speech |
//! | `[warm]` | Volume 0.8 for all following speech |
//! | `[gentle]` | Speed 0.8 for all following speech |
//! | `[anything else]` | Ignored |
//!
//! Each run of plain text is synthesized by a [`SynthesisEngine`], scaled by
//! the current volume, given a cosine fade-in/fade-out so the splice points
//! do not click, and concatenated with the silences in input order.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! silk-tts = { version = "2026.10", features = ["onnx"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use silk_tts::{engines::onnx::OnnxEngine, StitchConfig, Stitcher, SynthesisEngine};
//!
//! let mut engine = OnnxEngine::new();
//! engine.load_model(&PathBuf::from("models/ferrari"))?;
//!
//! let stitcher = Stitcher::new(StitchConfig::default());
//! let output = stitcher.render(&mut engine, "[warm] Hello. [pause:0.5] World.")?;
//! output.audio.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engines;
pub mod error;
pub mod markup;
pub mod shaping;
pub mod stitcher;
pub mod style;

use std::path::Path;
use std::time::Duration;

pub use config::{FailurePolicy, MarkupConfig, ShapingConfig, StitchConfig, StyleEffect};
pub use error::StitchError;
pub use markup::{parse, Segment, StyleMarker};
pub use stitcher::{StitchOutput, Stitcher, SynthesisFailure};

/// A mono audio buffer.
///
/// Engines return one per synthesized text segment; the stitcher returns one
/// for the whole utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), StitchError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Per-call synthesis parameters handed to an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Speech speed multiplier, 1.0 is the engine's natural rate.
    pub speed: f32,
    /// Upper bound for a single call. Passed through untouched; engines that
    /// can cancel work may honor it.
    pub timeout: Option<Duration>,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            timeout: None,
        }
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// An engine is a long-lived resource: load it once, pass it by `&mut` to
/// every [`Stitcher::render`] call, unload (or drop) it on shutdown.
pub trait SynthesisEngine {
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Sample rate of every buffer this engine produces.
    fn sample_rate(&self) -> u32;

    /// Synthesize speech from plain text. Markers never reach this call.
    fn synthesize(
        &mut self,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: &SynthesisParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SynthesisResult;

    #[test]
    fn duration_follows_sample_rate() {
        let audio = SynthesisResult {
            samples: vec![0.0; 12_000],
            sample_rate: 24_000,
        };
        assert_eq!(audio.duration_secs(), 0.5);
    }

    #[test]
    fn writes_float_wav() {
        let audio = SynthesisResult {
            samples: vec![0.0, 0.25, -0.5, 1.0],
            sample_rate: 24_000,
        };
        let path = std::env::temp_dir().join(format!("silk-tts-{}.wav", std::process::id()));
        audio.write_wav(&path).expect("write should succeed");

        let mut reader = hound::WavReader::open(&path).expect("wav should open");
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, audio.samples);

        let _ = std::fs::remove_file(&path);
    }
}
