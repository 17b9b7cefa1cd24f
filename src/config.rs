//! Versioned stitching configuration.
//!
//! The marker table lives here rather than in the parser so that new style
//! markers are a configuration change:
//!
//! ```json
//! {
//!   "version": 1,
//!   "markup": {
//!     "ellipsis_pause_secs": 0.8,
//!     "styles": {
//!       "soft":   { "volume": 0.5 },
//!       "warm":   { "volume": 0.8 },
//!       "gentle": { "speed": 0.8 },
//!       "whisper": { "volume": 0.3, "speed": 0.9 }
//!     }
//!   },
//!   "shaping": { "fade_in_ms": 5.0, "fade_out_ms": 15.0 },
//!   "failure_policy": "continue"
//! }
//! ```
//!
//! Every field is optional. A `styles` object replaces the built-in table
//! wholesale.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::StitchError;

/// The only configuration schema version this crate understands.
pub const CONFIG_VERSION: u32 = 1;

/// What a style marker changes. `None` leaves that attribute alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl StyleEffect {
    pub fn volume(volume: f32) -> Self {
        Self {
            volume: Some(volume),
            speed: None,
        }
    }

    pub fn speed(speed: f32) -> Self {
        Self {
            volume: None,
            speed: Some(speed),
        }
    }
}

/// Marker grammar: pause keyword, ellipsis length and the style table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Keyword of the explicit pause marker, `pause` in `[pause:0.5]`.
    pub pause_marker: String,
    /// Silence inserted for a literal `...`.
    pub ellipsis_pause_secs: f64,
    /// Longest pause a single marker may request.
    pub max_pause_secs: f64,
    /// Style marker name -> effect. Names match ASCII case-insensitively.
    pub styles: BTreeMap<String, StyleEffect>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        let styles = [
            ("soft", StyleEffect::volume(0.5)),
            ("warm", StyleEffect::volume(0.8)),
            ("gentle", StyleEffect::speed(0.8)),
        ]
        .into_iter()
        .map(|(name, effect)| (name.to_string(), effect))
        .collect();

        Self {
            pause_marker: "pause".to_string(),
            ellipsis_pause_secs: 0.8,
            max_pause_secs: 60.0,
            styles,
        }
    }
}

impl MarkupConfig {
    /// Look up a style marker by name.
    pub fn style_effect(&self, name: &str) -> Option<&StyleEffect> {
        self.styles
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, effect)| effect)
    }

    fn validate(&self) -> Result<(), String> {
        if self.pause_marker.trim().is_empty() {
            return Err("pause_marker must not be empty".to_string());
        }
        if self.pause_marker.contains([':', '[', ']']) {
            return Err(format!(
                "pause_marker {:?} must not contain ':', '[' or ']'",
                self.pause_marker
            ));
        }
        check_non_negative("max_pause_secs", self.max_pause_secs)?;
        check_non_negative("ellipsis_pause_secs", self.ellipsis_pause_secs)?;
        if self.ellipsis_pause_secs > self.max_pause_secs {
            return Err(format!(
                "ellipsis_pause_secs {} exceeds max_pause_secs {}",
                self.ellipsis_pause_secs, self.max_pause_secs
            ));
        }
        for (name, effect) in &self.styles {
            if let Some(volume) = effect.volume {
                check_non_negative(&format!("styles.{name}.volume"), volume as f64)?;
            }
            if let Some(speed) = effect.speed {
                if !(speed.is_finite() && speed > 0.0) {
                    return Err(format!("styles.{name}.speed must be positive, got {speed}"));
                }
            }
        }
        Ok(())
    }
}

/// Fade windows applied to the edges of every synthesized segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    pub fade_in_ms: f32,
    pub fade_out_ms: f32,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            fade_in_ms: 5.0,
            fade_out_ms: 15.0,
        }
    }
}

impl ShapingConfig {
    pub fn fade_in_samples(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.fade_in_ms, sample_rate)
    }

    pub fn fade_out_samples(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.fade_out_ms, sample_rate)
    }

    fn validate(&self) -> Result<(), String> {
        check_non_negative("shaping.fade_in_ms", self.fade_in_ms as f64)?;
        check_non_negative("shaping.fade_out_ms", self.fade_out_ms as f64)
    }
}

fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    (sample_rate as f64 * ms as f64 / 1000.0).round() as usize
}

/// What to do when the engine fails on one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Skip the segment, record a `SynthesisFailure`, keep going.
    #[default]
    Continue,
    /// Stop at the first failure and return no audio.
    Abort,
}

/// Top-level configuration for a [`Stitcher`](crate::Stitcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct StitchConfig {
    pub version: u32,
    pub markup: MarkupConfig,
    pub shaping: ShapingConfig,
    pub failure_policy: FailurePolicy,
    /// Per-call engine timeout, passed through in `SynthesisParams`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option))]
    pub synthesis_timeout_ms: Option<u64>,
    /// Hand the resolved speed to the engine. When false every call uses 1.0.
    pub apply_speed: bool,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            markup: MarkupConfig::default(),
            shaping: ShapingConfig::default(),
            failure_policy: FailurePolicy::default(),
            synthesis_timeout_ms: None,
            apply_speed: true,
        }
    }
}

impl StitchConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, StitchError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, StitchError> {
        let content = std::fs::read_to_string(path)?;
        log::info!("Loading stitch configuration from {}", path.display());
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), StitchError> {
        check_version(self.version)
            .and_then(|_| self.markup.validate())
            .and_then(|_| self.shaping.validate())
            .map_err(StitchError::Config)
    }

    pub fn synthesis_timeout(&self) -> Option<Duration> {
        self.synthesis_timeout_ms.map(Duration::from_millis)
    }
}

impl StitchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(version) = self.version {
            check_version(version)?;
        }
        if let Some(markup) = &self.markup {
            markup.validate()?;
        }
        if let Some(shaping) = &self.shaping {
            shaping.validate()?;
        }
        Ok(())
    }
}

fn check_version(version: u32) -> Result<(), String> {
    if version != CONFIG_VERSION {
        return Err(format!(
            "unsupported configuration version {version} (expected {CONFIG_VERSION})"
        ));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(format!("{field} must be a non-negative number, got {value}"));
    }
    Ok(())
}
