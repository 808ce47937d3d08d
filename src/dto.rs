use serde::{Deserialize, Serialize};

use crate::transcript::Segment;

/// Response body of a successful transcription.
#[derive(Debug, Serialize)]
pub struct TranscriptionDto {
    pub text: String,
    pub language: Option<String>,
    pub segments: Vec<Segment>,
}

/// Request body of the export endpoints: the segments of a previously
/// returned transcription, echoed back for re-rendering.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub segments: Vec<Segment>,
}
