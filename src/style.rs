//! Style resolution: one left-to-right pass over the segments, carrying
//! volume and speed forward until a later marker overrides them.

use crate::config::MarkupConfig;
use crate::markup::{Segment, StyleMarker};

/// Volume and speed in effect at a point in the segment list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleState {
    pub volume: f32,
    pub speed: f32,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            volume: 1.0,
            speed: 1.0,
        }
    }
}

impl StyleState {
    /// Apply a marker. Values replace the previous ones, they never stack.
    pub fn apply(&mut self, marker: &StyleMarker, config: &MarkupConfig) {
        let StyleMarker::Known(name) = marker else {
            return;
        };
        let Some(effect) = config.style_effect(name) else {
            return;
        };
        if let Some(volume) = effect.volume {
            self.volume = volume;
        }
        if let Some(speed) = effect.speed {
            self.speed = speed;
        }
    }
}

/// A segment with its style resolved, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<'a> {
    Speak {
        /// Position in the parsed segment list.
        index: usize,
        text: &'a str,
        style: StyleState,
    },
    Silence {
        index: usize,
        duration_secs: f64,
    },
}

/// Resolve the style of every speech segment. Style segments are consumed.
pub fn resolve<'a>(segments: &'a [Segment], config: &MarkupConfig) -> Vec<Step<'a>> {
    let mut state = StyleState::default();
    let mut steps = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Speech { text } => steps.push(Step::Speak {
                index,
                text,
                style: state,
            }),
            Segment::Silence { duration_secs } => steps.push(Step::Silence {
                index,
                duration_secs: *duration_secs,
            }),
            Segment::Style(marker) => state.apply(marker, config),
        }
    }

    steps
}
