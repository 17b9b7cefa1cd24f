use std::path::{Path, PathBuf};

use crate::{SynthesisEngine, SynthesisParams, SynthesisResult};

use super::model::{OnnxError, VoiceModel, SAMPLE_RATE};
use super::phonemizer::{phonemize, EspeakConfig};

/// Parameters for configuring voice model loading.
#[derive(Debug, Clone)]
pub struct OnnxModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Space tokens appended after the phonemes so the voice can decay
    /// instead of being cut mid-vibration.
    pub tail_padding: usize,
    /// Phoneme rewrites applied before tokenisation, in order.
    pub substitutions: Vec<(String, String)>,
    /// espeak-ng voice used for phonemization.
    pub espeak_voice: String,
}

impl Default for OnnxModelParams {
    fn default() -> Self {
        Self {
            num_threads: None,
            tail_padding: 4,
            // The high-pitched `O` renders "hello" with an audible tail.
            substitutions: vec![("O".to_string(), "oʊ".to_string())],
            espeak_voice: "en-us".to_string(),
        }
    }
}

/// Engine for an exported single-voice ONNX graph.
///
/// ```rust,no_run
/// use silk_tts::{SynthesisEngine, SynthesisParams, engines::onnx::OnnxEngine};
/// use std::path::PathBuf;
///
/// let mut engine = OnnxEngine::new();
/// engine.load_model(&PathBuf::from("models/ferrari"))?;
/// let audio = engine.synthesize("Hello, world!", &SynthesisParams::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct OnnxEngine {
    model: Option<VoiceModel>,
    model_path: Option<PathBuf>,
    espeak_voice: String,
    espeak: EspeakConfig,
}

impl Default for OnnxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OnnxEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_espeak(None, None)
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            model: None,
            model_path: None,
            espeak_voice: OnnxModelParams::default().espeak_voice,
            espeak: EspeakConfig {
                bin_path,
                data_path,
            },
        }
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}

impl Drop for OnnxEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for OnnxEngine {
    type ModelParams = OnnxModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let model = VoiceModel::load(
            model_path,
            params.num_threads,
            params.substitutions,
            params.tail_padding,
        )?;
        self.model = Some(model);
        self.model_path = Some(model_path.to_path_buf());
        self.espeak_voice = params.espeak_voice;
        Ok(())
    }

    fn unload_model(&mut self) {
        self.model = None;
        self.model_path = None;
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let model = self.model.as_mut().ok_or(OnnxError::ModelNotLoaded)?;

        let phonemes = phonemize(text, &self.espeak_voice, &self.espeak)?;
        let ids = model.tokenizer().tokenize(&phonemes);
        let samples = if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {text:?}");
            Vec::new()
        } else {
            log::debug!("{text:?} -> {phonemes:?} ({} tokens)", ids.len());
            model.run(&ids, params.speed)?
        };

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizing_before_load_fails() {
        let mut engine = OnnxEngine::new();
        let err = engine
            .synthesize("hello", &SynthesisParams::default())
            .unwrap_err();
        assert!(err.to_string().contains("Model not loaded"));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn loading_an_empty_directory_fails() {
        let dir = std::env::temp_dir().join(format!("silk-engine-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut engine = OnnxEngine::new();
        assert!(engine.load_model(&dir).is_err());
        assert!(engine.model_path().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
