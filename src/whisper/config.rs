use std::path::PathBuf;

/// Engine settings, fixed at startup. Inference is CPU-only.
#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Path to the ggml model file.
    pub model_path: PathBuf,
    /// Language to transcribe in; `None` lets the model detect it.
    pub language: Option<String>,
    pub num_threads: i32,
    pub no_speech_threshold: f32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            language: None,
            num_threads: 4,
            no_speech_threshold: 0.5,
        }
    }
}
