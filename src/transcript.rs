//! Transcript types and the two export renderings (plain text, JSON).

use serde::{Deserialize, Serialize};

use crate::error::TranscribeError;

/// A span of recognized speech with timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    /// Builds a segment from raw engine output.
    ///
    /// Trims the text and rejects non-finite, negative, or inverted
    /// timestamps; everything downstream may rely on `0 <= start <= end`.
    pub fn from_engine(text: &str, start: f64, end: f64) -> Result<Self, TranscribeError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
            return Err(TranscribeError::ModelUnavailable(format!(
                "engine returned invalid segment timestamps {start}..{end}"
            )));
        }
        Ok(Self {
            text: text.trim().to_string(),
            start,
            end,
        })
    }
}

/// Ordered transcription result for one upload.
///
/// Segment order is chronological as produced by the engine and is never
/// changed by rendering or export.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub language: Option<String>,
}

impl Transcript {
    /// Assembles a transcript from engine output, verifying the chronological
    /// ordering the engine promises: segment starts must be non-decreasing.
    pub fn new(
        segments: Vec<Segment>,
        language: Option<String>,
    ) -> Result<Self, TranscribeError> {
        if segments.windows(2).any(|pair| pair[1].start < pair[0].start) {
            return Err(TranscribeError::ModelUnavailable(
                "engine returned segments out of chronological order".into(),
            ));
        }
        Ok(Self { segments, language })
    }

    /// On-screen rendering: segment texts joined by newlines, no truncation.
    /// An empty transcript renders as the empty string.
    pub fn display_text(&self) -> String {
        display_text(&self.segments)
    }
}

pub fn display_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A rendered download: bytes plus the headers the response needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: &'static str,
}

/// Plain-text export: identical bytes to the display rendering.
pub fn text_artifact(segments: &[Segment]) -> ExportArtifact {
    ExportArtifact {
        bytes: display_text(segments).into_bytes(),
        content_type: "text/plain; charset=utf-8",
        filename: "transcript.txt",
    }
}

/// JSON export: a pretty-printed top-level array of segment records in
/// segment order.
pub fn json_artifact(segments: &[Segment]) -> serde_json::Result<ExportArtifact> {
    Ok(ExportArtifact {
        bytes: serde_json::to_vec_pretty(segments)?,
        content_type: "application/json",
        filename: "transcript.json",
    })
}
