use rubato::{Resampler, SincFixedIn, SincInterpolationType, WindowFunction};

use crate::error::TranscribeError;

pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Resamples a mono stream to the 16kHz the engine expects.
///
/// Decoding already downmixed to mono, so this runs single-channel. The
/// resampler's output delay is trimmed off the front so timestamps stay
/// aligned with the source audio.
pub fn resample_to_16khz(samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, TranscribeError> {
    if sample_rate == WHISPER_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Err(TranscribeError::Decode("no audio frames to resample".into()));
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(WHISPER_SAMPLE_RATE) / f64::from(sample_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| TranscribeError::Decode(format!("resampler init failed: {e}")))?;

    let channels = resampler
        .process(&[samples.to_vec()], None)
        .map_err(|e| TranscribeError::Decode(format!("resampling failed: {e}")))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio) as usize;
    let resampled = &channels[0];
    let start = delay.min(resampled.len());
    let end = (delay + expected).min(resampled.len());

    Ok(resampled[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_at_target_rate() {
        let samples: Vec<f32> = (0..16_000).map(|i| (i as f32 / 16_000.0).sin()).collect();
        let out = resample_to_16khz(&samples, 16_000).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn downsamples_48khz_to_a_third() {
        let samples: Vec<f32> = (0..48_000).map(|i| (i as f32 / 48_000.0).sin()).collect();
        let out = resample_to_16khz(&samples, 48_000).unwrap();
        let ratio = out.len() as f64 / samples.len() as f64;
        assert!((ratio - 1.0 / 3.0).abs() < 0.05, "ratio: {ratio}");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(resample_to_16khz(&[], 44_100).is_err());
    }
}
