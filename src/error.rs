use thiserror::Error;

/// Failures of the upload → transcript pipeline.
///
/// `Decode` is an input-side problem and maps to a client error at the HTTP
/// boundary; `ModelUnavailable` covers the engine failing to load or run and
/// maps to a server error. An absent upload is not represented here: the page
/// simply does nothing without a chosen file.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The uploaded bytes are not a decodable audio stream.
    #[error("could not decode audio: {0}")]
    Decode(String),

    /// The whisper model could not be loaded, or the engine failed while
    /// running against valid input.
    #[error("transcription engine unavailable: {0}")]
    ModelUnavailable(String),
}
