use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, instrument, warn};

use crate::error::DecodeError;

use super::buffer::SampleBuffer;

/// Audio decoder backed by symphonia
pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode a file on the blocking pool so the caller's event loop keeps running
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn decode(path: PathBuf) -> Result<SampleBuffer, DecodeError> {
        tokio::task::spawn_blocking(move || Self::decode_file(&path))
            .await
            .map_err(|e| DecodeError::Task(e.to_string()))?
    }

    /// Decode a file synchronously
    pub fn decode_file(path: &Path) -> Result<SampleBuffer, DecodeError> {
        let file = File::open(path)?;
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        Self::decode_source(Box::new(file), hint)
    }

    fn decode_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<SampleBuffer, DecodeError> {
        let mss = MediaSourceStream::new(source, Default::default());
        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;
        let mut scratch: Option<InterleavedBuffer<f32>> = None;
        let mut interleaved = Vec::<f32>::new();
        // (sample rate, channel count) of the first non-empty packet
        let mut layout: Option<(u32, usize)> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    warn!(error = msg, "Skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            match layout {
                None => layout = Some((spec.rate, channels)),
                Some((_, locked)) if locked != channels => {
                    warn!(expected = locked, got = channels, "Skipping packet with changed channel count");
                    continue;
                }
                Some(_) => {}
            }

            if !scratch_fits(scratch.as_ref(), decoded.capacity(), channels) {
                scratch = Some(InterleavedBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = scratch.as_mut() {
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
        }

        let (sample_rate, channels) = layout.ok_or(DecodeError::Empty)?;
        debug!(
            sample_rate,
            channels,
            frames = interleaved.len() / channels,
            "Decode complete"
        );

        SampleBuffer::from_interleaved(&interleaved, sample_rate, channels)
    }
}

/// Whether `scratch` can hold `frames` frames of `channels` interleaved
/// samples. Its capacity counts samples, not frames.
fn scratch_fits(scratch: Option<&InterleavedBuffer<f32>>, frames: usize, channels: usize) -> bool {
    scratch.is_some_and(|buf| buf.capacity() >= frames * channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::encode_wav;

    fn stereo_ramp(frames: usize, sample_rate: u32) -> SampleBuffer {
        let left: Vec<f32> = (0..frames).map(|i| (i as f32 / frames as f32) - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        SampleBuffer::new(sample_rate, vec![left, right]).unwrap()
    }

    #[test]
    fn test_decode_wav_preserves_layout() {
        let original = stereo_ramp(4410, 44_100);
        let bytes = encode_wav(&original).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        std::fs::write(&path, bytes).unwrap();

        let decoded = AudioDecoder::decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), 4410);

        // 16-bit quantization error only
        for frame in [0, 1000, 4409] {
            assert!((decoded.sample(0, frame) - original.sample(0, frame)).abs() < 1e-3);
            assert!((decoded.sample(1, frame) - original.sample(1, frame)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_scratch_capacity_counts_interleaved_samples() {
        use symphonia::core::audio::{Channels, SignalSpec};

        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let buf = InterleavedBuffer::<f32>::new(1024, spec);

        assert!(!scratch_fits(None, 1, 2));
        assert!(scratch_fits(Some(&buf), 1024, 2));
        // More frames than allocated, fewer than the sample count
        assert!(!scratch_fits(Some(&buf), 1500, 2));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let result = AudioDecoder::decode_file(&path);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_async_decode_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01 kick.wav");
        std::fs::write(&path, encode_wav(&stereo_ramp(800, 8_000)).unwrap()).unwrap();

        let decoded = AudioDecoder::decode(path).await.unwrap();
        assert_eq!(decoded.frame_count(), 800);
        assert!((decoded.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = AudioDecoder::decode(PathBuf::from("/nonexistent/stem.wav")).await;
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }
}
