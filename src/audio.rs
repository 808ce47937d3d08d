//! Decoding of uploaded audio containers into mono f32 PCM.
//!
//! Codec support (mp3, aac/m4a, wav, ...) comes entirely from symphonia; no
//! pre-validation happens before handing the bytes to the probe, so a file
//! the codecs cannot parse surfaces as a decode error here.

use std::io::Cursor;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::TranscribeError;

/// Decoded upload: mono samples at the container's native rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decodes a complete audio container into mono f32 samples.
///
/// Multi-channel audio is averaged down to mono frame by frame. The client
/// filename only seeds the format probe hint; the probe still sniffs the
/// actual bytes.
pub fn decode_audio(
    bytes: Vec<u8>,
    filename: Option<&str>,
) -> Result<DecodedAudio, TranscribeError> {
    let mut hint = Hint::new();
    if let Some(ext) = filename.map(Path::new).and_then(|p| p.extension()) {
        if let Some(ext) = ext.to_str() {
            hint.with_extension(ext);
        }
    }

    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscribeError::Decode(format!("unrecognized audio container: {e}")))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscribeError::Decode("no audio track found".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| TranscribeError::Decode("container reports no sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TranscribeError::Decode(format!("unsupported codec: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscribeError::Decode(format!("packet read failed: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                if channels > 1 {
                    for frame in buf.samples().chunks(channels) {
                        samples.push(frame.iter().sum::<f32>() / channels as f32);
                    }
                } else {
                    samples.extend_from_slice(buf.samples());
                }
            }
            // A corrupt packet mid-stream is skippable; a stream that never
            // yields a sample is rejected below.
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping malformed packet: {e}");
            }
            Err(e) => return Err(TranscribeError::Decode(format!("decode failed: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(TranscribeError::Decode(
            "no audio samples could be decoded".into(),
        ));
    }

    debug!(
        "Decoded {} samples at {}Hz ({:.2}s)",
        samples.len(),
        sample_rate,
        samples.len() as f64 / f64::from(sample_rate)
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid PCM WAV container for decode tests.
    fn wav_fixture(sample_rate: u32, channels: u16, num_frames: u32) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
        let block_align = channels * bits_per_sample / 8;
        let data_size = num_frames * u32::from(channels) * u32::from(bits_per_sample) / 8;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.resize(buf.len() + data_size as usize, 0);
        buf
    }

    #[test]
    fn garbage_with_audio_extension_is_a_decode_error() {
        let err = decode_audio(b"definitely not audio".to_vec(), Some("voice.mp3")).unwrap_err();
        assert!(matches!(err, TranscribeError::Decode(_)));
    }

    #[test]
    fn empty_upload_is_a_decode_error() {
        assert!(decode_audio(Vec::new(), None).is_err());
    }

    #[test]
    fn decodes_mono_wav() {
        let audio = decode_audio(wav_fixture(16_000, 1, 1600), Some("clip.wav")).unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.samples.len(), 1600);
        assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn downmixes_stereo_to_mono_at_native_rate() {
        let audio = decode_audio(wav_fixture(44_100, 2, 22_050), Some("clip.wav")).unwrap();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.samples.len(), 22_050);
        assert!((audio.duration_secs() - 0.5).abs() < 0.01);
    }
}
