//! Marker parsing: annotated text -> ordered segments.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MarkupConfig;
use crate::error::StitchError;

/// A non-nested bracketed token, or a literal ellipsis.
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]|\.\.\.").expect("marker regex is valid"));

const ELLIPSIS: &str = "...";

/// One unit of parsed input, in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text for the engine. Never empty, never adjacent to another
    /// `Speech` segment.
    Speech { text: String },
    /// Explicit gap.
    Silence { duration_secs: f64 },
    /// Directive affecting every following `Speech` segment.
    Style(StyleMarker),
}

impl Segment {
    pub fn speech(text: impl Into<String>) -> Self {
        Self::Speech { text: text.into() }
    }

    pub fn silence(duration_secs: f64) -> Self {
        Self::Silence { duration_secs }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleMarker {
    /// A marker present in the style table, name lowercased.
    Known(String),
    /// Any other bracketed token, kept verbatim and ignored downstream.
    Unknown(String),
}

impl StyleMarker {
    pub fn known(name: &str) -> Self {
        Self::Known(name.to_ascii_lowercase())
    }
}

/// Split annotated text into speech, silence and style segments.
///
/// Runs of text between markers are trimmed; runs that end up empty are
/// dropped. A malformed pause marker fails the whole parse.
pub fn parse(text: &str, config: &MarkupConfig) -> Result<Vec<Segment>, StitchError> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in MARKER_RE.find_iter(text) {
        push_speech(&mut segments, &text[cursor..found.start()]);
        segments.push(parse_marker(found.as_str(), config)?);
        cursor = found.end();
    }
    push_speech(&mut segments, &text[cursor..]);

    Ok(segments)
}

/// Every text run is bounded by markers, so two runs never touch.
fn push_speech(segments: &mut Vec<Segment>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::speech(trimmed));
    }
}

fn parse_marker(token: &str, config: &MarkupConfig) -> Result<Segment, StitchError> {
    if token == ELLIPSIS {
        return Ok(Segment::silence(config.ellipsis_pause_secs));
    }

    let inner = token[1..token.len() - 1].trim();
    let (name, arg) = match inner.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (inner, None),
    };

    if name.eq_ignore_ascii_case(&config.pause_marker) {
        let arg = arg
            .filter(|a| !a.is_empty())
            .ok_or_else(|| StitchError::malformed(token, "missing pause duration"))?;
        let duration_secs: f64 = arg
            .parse()
            .map_err(|_| StitchError::malformed(token, format!("{arg:?} is not a number")))?;
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(StitchError::malformed(
                token,
                "pause duration must be a finite, non-negative number of seconds",
            ));
        }
        if duration_secs > config.max_pause_secs {
            return Err(StitchError::malformed(
                token,
                format!("pause longer than {}s", config.max_pause_secs),
            ));
        }
        return Ok(Segment::silence(duration_secs));
    }

    if config.style_effect(inner).is_some() {
        Ok(Segment::Style(StyleMarker::known(inner)))
    } else {
        log::debug!("Ignoring unknown marker {token:?}");
        Ok(Segment::Style(StyleMarker::Unknown(inner.to_string())))
    }
}
