use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::ExportError;

use super::buffer::SampleBuffer;

/// Quantize one float sample to 16-bit PCM.
///
/// Negative values scale by 32768 and non-negative by 32767 so both -1.0
/// and 1.0 map onto the full integer range.
#[inline]
pub fn quantize_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode a buffer as a 16-bit little-endian RIFF/WAVE byte stream
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, ExportError> {
    let spec = WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + buffer.frame_count() * buffer.channel_count() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for frame in 0..buffer.frame_count() {
            for channel in 0..buffer.channel_count() {
                writer.write_sample(quantize_i16(buffer.sample(channel, frame)))?;
            }
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_byte_length_and_riff_size() {
        let frames = 22_050; // 0.5s
        let silence = SampleBuffer::new(44_100, vec![vec![0.0; frames]; 2]).unwrap();
        let bytes = encode_wav(&silence).unwrap();

        assert_eq!(bytes.len(), 44 + frames * 2 * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(riff_size as usize, bytes.len() - 8);
        assert!(bytes[44..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_asymmetric_quantization() {
        assert_eq!(quantize_i16(1.0), 32767);
        assert_eq!(quantize_i16(-1.0), -32768);
        assert_eq!(quantize_i16(0.0), 0);
        assert_eq!(quantize_i16(0.5), 16383);
        assert_eq!(quantize_i16(-0.5), -16384);
        // clamped
        assert_eq!(quantize_i16(2.5), 32767);
        assert_eq!(quantize_i16(-7.0), -32768);
    }

    #[test]
    fn test_samples_are_interleaved_little_endian() {
        let buffer = SampleBuffer::new(8_000, vec![vec![1.0], vec![-1.0]]).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        assert_eq!(&bytes[44..48], &[0xff, 0x7f, 0x00, 0x80]);
    }
}
