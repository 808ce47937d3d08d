use std::sync::{Arc, Mutex};

use log::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::DecodedAudio;
use crate::error::TranscribeError;
use crate::transcript::{Segment, Transcript};
use crate::whisper::config::WhisperConfig;
use crate::whisper::resampler::{WHISPER_SAMPLE_RATE, resample_to_16khz};

/// Handle to the one whisper context loaded in this process.
///
/// The context is created once at startup and never mutated afterwards; each
/// transcription runs on its own engine state behind the mutex. Cloning the
/// handle shares the context.
#[derive(Clone)]
pub struct Transcriber {
    ctx: Arc<Mutex<WhisperContext>>,
    config: WhisperConfig,
}

impl Transcriber {
    pub fn new(config: WhisperConfig) -> Result<Self, TranscribeError> {
        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(false);

        let model_path = config.model_path.to_string_lossy();
        info!("Loading whisper model from {model_path}");
        let ctx = WhisperContext::new_with_params(&model_path, ctx_params).map_err(|e| {
            TranscribeError::ModelUnavailable(format!("failed to load model {model_path}: {e}"))
        })?;

        Ok(Self {
            ctx: Arc::new(Mutex::new(ctx)),
            config,
        })
    }

    /// Runs one upload through the engine and materializes the ordered
    /// segment sequence. Blocks until the whole file is transcribed.
    pub fn transcribe(&self, audio: &DecodedAudio) -> Result<Transcript, TranscribeError> {
        let samples = resample_to_16khz(&audio.samples, audio.sample_rate)?;
        if samples.len() < WHISPER_SAMPLE_RATE as usize {
            return Err(TranscribeError::Decode(
                "audio is too short (less than 1 second)".into(),
            ));
        }

        let language = self.config.language.as_deref().unwrap_or("auto");
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_no_speech_thold(self.config.no_speech_threshold);
        params.set_n_threads(self.config.num_threads);

        let ctx = self
            .ctx
            .lock()
            .map_err(|_| TranscribeError::ModelUnavailable("transcriber lock poisoned".into()))?;

        let mut state = ctx.create_state().map_err(|e| {
            TranscribeError::ModelUnavailable(format!("failed to create engine state: {e}"))
        })?;

        state.full(params, &samples).map_err(|e| {
            TranscribeError::ModelUnavailable(format!("transcription run failed: {e}"))
        })?;

        let num_segments = state.full_n_segments().map_err(|e| {
            TranscribeError::ModelUnavailable(format!("failed to read segment count: {e}"))
        })?;

        let mut segments = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let text = state.full_get_segment_text(i).map_err(|e| {
                TranscribeError::ModelUnavailable(format!("failed to read segment text: {e}"))
            })?;
            let start = state.full_get_segment_t0(i).map_err(|e| {
                TranscribeError::ModelUnavailable(format!("failed to read segment start: {e}"))
            })?;
            let end = state.full_get_segment_t1(i).map_err(|e| {
                TranscribeError::ModelUnavailable(format!("failed to read segment end: {e}"))
            })?;

            // Engine timestamps are centiseconds.
            segments.push(Segment::from_engine(
                &text,
                start as f64 / 100.0,
                end as f64 / 100.0,
            )?);
        }

        let detected = match &self.config.language {
            Some(lang) => Some(lang.clone()),
            None => state
                .full_lang_id_from_state()
                .ok()
                .and_then(|id| whisper_rs::get_lang_str(id).map(|s| s.to_string())),
        };

        debug!(
            "Transcribed {} segments, language {:?}",
            segments.len(),
            detected
        );

        Transcript::new(segments, detected)
    }
}
