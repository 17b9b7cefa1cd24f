//! Engine for an exported, single-voice ONNX graph.
//!
//! The graph takes phoneme ids (`input_ids` or `tokens`, int64 `[1, N]`),
//! optionally a `speed` scalar, and returns a 24 kHz waveform. The voice and
//! its style vector are baked into the export, so there is no voice archive.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Model Directory Layout
//!
//! ```text
//! models/ferrari/
//! ├── ferrari_kokoro.onnx   # exported graph (any *.onnx is accepted)
//! └── config.json           # optional, "vocab" object; built-in table otherwise
//! ```
//!
//! # Tokenisation
//!
//! `[0, phoneme ids.., 16 × tail_padding, 0]`. The trailing space tokens give
//! the voice room to let the last phoneme decay.

pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod vocab;

pub use engine::{OnnxEngine, OnnxModelParams};
pub use model::{OnnxError, SAMPLE_RATE};
