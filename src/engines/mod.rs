//! Speech synthesis engines.
//!
//! Any type implementing [`SynthesisEngine`](crate::SynthesisEngine) can drive
//! a [`Stitcher`](crate::Stitcher). Bundled engines are enabled via Cargo
//! features:
//! - `onnx` - exported single-input voice graph (ONNX format, espeak-ng required)

#[cfg(feature = "onnx")]
pub mod onnx;
