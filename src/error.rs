use crate::stitcher::SynthesisFailure;

#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    #[error("Malformed marker '{marker}': {reason}")]
    MalformedMarker { marker: String, reason: String },
    #[error("{0}")]
    Synthesis(SynthesisFailure),
    /// Nothing to hear. `failures` holds any segments the engine could not
    /// render on the way.
    #[error("No audio was produced ({} segment(s) failed)", .failures.len())]
    EmptyResult { failures: Vec<SynthesisFailure> },
    #[error("Output would exceed {max} samples")]
    OutputTooLong { max: usize },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}

impl StitchError {
    pub(crate) fn malformed(marker: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMarker {
            marker: marker.to_string(),
            reason: reason.into(),
        }
    }
}
