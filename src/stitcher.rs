//! The rendering pipeline: parse, resolve styles, synthesize each speech
//! segment, shape it, and concatenate everything in segment order.

use std::time::{Duration, Instant};

use crate::config::{FailurePolicy, StitchConfig};
use crate::error::StitchError;
use crate::markup::{self, Segment};
use crate::shaping;
use crate::style::{self, Step};
use crate::{SynthesisEngine, SynthesisParams, SynthesisResult};

/// A speech segment the engine could not render.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Synthesis failed for segment {index} ({text:?}): {reason}")]
pub struct SynthesisFailure {
    /// Position in the parsed segment list.
    pub index: usize,
    pub text: String,
    pub reason: String,
}

/// The stitched utterance plus what happened on the way.
#[derive(Debug)]
pub struct StitchOutput {
    pub audio: SynthesisResult,
    pub segments: Vec<Segment>,
    /// Segments skipped under [`FailurePolicy::Continue`].
    pub failures: Vec<SynthesisFailure>,
    /// Wall-clock time spent in `render`.
    pub elapsed: Duration,
}

impl StitchOutput {
    /// True when at least one speech segment is missing from the audio.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Wall-clock time divided by audio duration. Below 1.0 is faster than
    /// real time.
    pub fn real_time_factor(&self) -> f64 {
        let duration = self.audio.duration_secs();
        if duration == 0.0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() / duration
    }
}

/// Turns annotated text into one continuous buffer using a borrowed engine.
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    config: StitchConfig,
}

impl Stitcher {
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Parse annotated text with this stitcher's marker grammar.
    pub fn parse(&self, text: &str) -> Result<Vec<Segment>, StitchError> {
        markup::parse(text, &self.config.markup)
    }

    /// Render annotated text.
    ///
    /// The engine is called at most once per speech segment, in order.
    /// A malformed marker fails before any synthesis happens.
    pub fn render<E: SynthesisEngine>(
        &self,
        engine: &mut E,
        text: &str,
    ) -> Result<StitchOutput, StitchError> {
        let start = Instant::now();
        let segments = self.parse(text)?;

        let sample_rate = engine.sample_rate();
        let fade_in = self.config.shaping.fade_in_samples(sample_rate);
        let fade_out = self.config.shaping.fade_out_samples(sample_rate);
        let timeout = self.config.synthesis_timeout();

        let mut combined: Vec<f32> = Vec::new();
        let mut failures = Vec::new();

        for step in style::resolve(&segments, &self.config.markup) {
            match step {
                Step::Silence {
                    index,
                    duration_secs,
                } => {
                    let total = silence_samples(duration_secs, sample_rate)
                        .and_then(|n| combined.len().checked_add(n))
                        .filter(|&total| total <= MAX_OUTPUT_SAMPLES)
                        .ok_or(StitchError::OutputTooLong {
                            max: MAX_OUTPUT_SAMPLES,
                        })?;
                    log::debug!(
                        "Segment {index}: {duration_secs}s silence ({} samples)",
                        total - combined.len()
                    );
                    combined.resize(total, 0.0);
                }
                Step::Speak { index, text, style } => {
                    let params = SynthesisParams {
                        speed: if self.config.apply_speed { style.speed } else { 1.0 },
                        timeout,
                    };
                    match synthesize_segment(engine, text, &params, sample_rate) {
                        Ok(mut samples) => {
                            if combined.len().saturating_add(samples.len()) > MAX_OUTPUT_SAMPLES {
                                return Err(StitchError::OutputTooLong {
                                    max: MAX_OUTPUT_SAMPLES,
                                });
                            }
                            shaping::shape(&mut samples, style.volume, fade_in, fade_out);
                            log::debug!(
                                "Segment {index}: {} samples, volume {}, speed {}",
                                samples.len(),
                                style.volume,
                                params.speed
                            );
                            combined.extend_from_slice(&samples);
                        }
                        Err(reason) => {
                            let failure = SynthesisFailure {
                                index,
                                text: text.to_string(),
                                reason,
                            };
                            if self.config.failure_policy == FailurePolicy::Abort {
                                return Err(StitchError::Synthesis(failure));
                            }
                            log::warn!("{failure}; skipping segment");
                            failures.push(failure);
                        }
                    }
                }
            }
        }

        if combined.is_empty() {
            return Err(StitchError::EmptyResult { failures });
        }

        let output = StitchOutput {
            audio: SynthesisResult {
                samples: combined,
                sample_rate,
            },
            segments,
            failures,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Stitched {} segments into {:.2}s of audio in {:.2?} (RTF {:.3}, {} failed)",
            output.segments.len(),
            output.audio.duration_secs(),
            output.elapsed,
            output.real_time_factor(),
            output.failures.len()
        );
        Ok(output)
    }
}

/// Upper bound on a stitched buffer: one hour at 48 kHz.
const MAX_OUTPUT_SAMPLES: usize = 48_000 * 3600;

/// `None` when the pause cannot be represented as a sample count.
fn silence_samples(duration_secs: f64, sample_rate: u32) -> Option<usize> {
    let n = (duration_secs * sample_rate as f64).round();
    if !(n.is_finite() && n >= 0.0 && n <= MAX_OUTPUT_SAMPLES as f64) {
        return None;
    }
    Some(n as usize)
}

fn synthesize_segment<E: SynthesisEngine>(
    engine: &mut E,
    text: &str,
    params: &SynthesisParams,
    sample_rate: u32,
) -> Result<Vec<f32>, String> {
    let result = engine.synthesize(text, params).map_err(|e| e.to_string())?;
    if result.sample_rate != sample_rate {
        return Err(format!(
            "engine returned {} Hz audio, expected {} Hz",
            result.sample_rate, sample_rate
        ));
    }
    if result.samples.is_empty() {
        return Err("engine returned no audio".to_string());
    }
    Ok(result.samples)
}
