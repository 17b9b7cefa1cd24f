use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::vocab::{builtin_vocab, load_vocab, Tokenizer};

/// Output sample rate of the exported voice.
pub const SAMPLE_RATE: u32 = 24000;

/// File name preferred when a model directory holds several graphs.
const PREFERRED_ONNX: &str = "ferrari_kokoro.onnx";

#[derive(thiserror::Error, Debug)]
pub enum OnnxError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Model produced no output tensor")]
    NoOutput,
}

/// Element type of the graph's optional `speed` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedInput {
    Int32,
    Float32,
}

/// A loaded single-voice graph: `input_ids` (+ optional `speed`) -> waveform.
pub struct VoiceModel {
    session: Session,
    tokenizer: Tokenizer,
    /// Detected input name: "input_ids" or "tokens"
    tokens_input_name: String,
    speed_input: Option<SpeedInput>,
}

impl VoiceModel {
    /// Load a voice from a directory holding an `.onnx` graph and, optionally,
    /// a `config.json` with the phoneme vocabulary.
    pub fn load(
        model_dir: &Path,
        num_threads: Option<usize>,
        substitutions: Vec<(String, String)>,
        tail_padding: usize,
    ) -> Result<Self, OnnxError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading voice graph from {}", onnx_path.display());

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?;
        if let Some(threads) = num_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        let session = builder.commit_from_file(&onnx_path)?;

        let tokens_input_name = detect_tokens_input(&session);
        let speed_input = detect_speed_input(&session);
        log::info!(
            "Detected: tokens_input='{}', speed_input={:?}",
            tokens_input_name,
            speed_input
        );

        let config_path = model_dir.join("config.json");
        let vocab = if config_path.exists() {
            log::info!("Loading vocab from config.json");
            load_vocab(&config_path)?
        } else {
            log::warn!("config.json not found, using built-in vocab");
            builtin_vocab()
        };

        Ok(Self {
            session,
            tokenizer: Tokenizer::new(vocab, substitutions, tail_padding),
            tokens_input_name,
            speed_input,
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Run the graph on a full id sequence (already padded).
    pub fn run(&mut self, ids: &[i64], speed: f32) -> Result<Vec<f32>, OnnxError> {
        let tokens = Array2::from_shape_vec((1, ids.len()), ids.to_vec())?;
        let name = self.tokens_input_name.as_str();

        let output = match self.speed_input {
            None => {
                if speed != 1.0 {
                    log::debug!("Graph has no speed input; ignoring speed {speed}");
                }
                let inputs = inputs![
                    name => TensorRef::from_array_view(tokens.view())?,
                ];
                self.session.run(inputs)?
            }
            Some(SpeedInput::Int32) => {
                let speed_arr = ndarray::arr1(&[speed.round() as i32]);
                let inputs = inputs![
                    name => TensorRef::from_array_view(tokens.view())?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ];
                self.session.run(inputs)?
            }
            Some(SpeedInput::Float32) => {
                let speed_arr = ndarray::arr1(&[speed]);
                let inputs = inputs![
                    name => TensorRef::from_array_view(tokens.view())?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ];
                self.session.run(inputs)?
            }
        };

        let (_, waveform) = output.iter().next().ok_or(OnnxError::NoOutput)?;
        let waveform = waveform.try_extract_array::<f32>()?;
        Ok(waveform.iter().copied().collect())
    }
}

/// Find the ONNX graph in the given directory.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, OnnxError> {
    let preferred = model_dir.join(PREFERRED_ONNX);
    if preferred.exists() {
        return Ok(preferred);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(model_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("onnx"))
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        OnnxError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No .onnx file found in {}", model_dir.display()),
        ))
    })
}

fn detect_tokens_input(session: &Session) -> String {
    session
        .inputs()
        .iter()
        .map(|input| input.name())
        .find(|name| *name == "input_ids" || *name == "tokens")
        .unwrap_or("input_ids")
        .to_string()
}

fn detect_speed_input(session: &Session) -> Option<SpeedInput> {
    let input = session.inputs().iter().find(|input| input.name() == "speed")?;
    let type_str = format!("{:?}", input.dtype());
    if type_str.contains("Int32") || type_str.contains("int32") {
        Some(SpeedInput::Int32)
    } else {
        Some(SpeedInput::Float32)
    }
}
