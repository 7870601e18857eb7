use crate::error::DecodeError;

/// Decoded multi-channel audio, stored planar.
///
/// Immutable once built. Callers share it behind an `Arc` between the
/// session, the playback sources and the export task; nothing mutates it in
/// place, so every derived buffer (for example a realigned copy) is a new
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    frame_count: usize,
}

impl SampleBuffer {
    /// Build a buffer from per-channel sample vectors.
    ///
    /// Rejects layouts the loop math cannot work with: no channels, ragged
    /// channels, a zero sample rate, or zero frames.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate(sample_rate));
        }

        let frame_count = match channels.first() {
            Some(first) => first.len(),
            None => return Err(DecodeError::InvalidLayout("no channels".into())),
        };

        if let Some(bad) = channels.iter().position(|ch| ch.len() != frame_count) {
            return Err(DecodeError::InvalidLayout(format!(
                "channel {} has {} frames, expected {}",
                bad,
                channels[bad].len(),
                frame_count
            )));
        }

        if frame_count == 0 {
            return Err(DecodeError::Empty);
        }

        Ok(Self {
            sample_rate,
            channels,
            frame_count,
        })
    }

    /// Build a buffer from interleaved samples
    pub fn from_interleaved(
        samples: &[f32],
        sample_rate: u32,
        channel_count: usize,
    ) -> Result<Self, DecodeError> {
        if channel_count == 0 {
            return Err(DecodeError::InvalidLayout("no channels".into()));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &sample) in channels.iter_mut().zip(frame) {
                ch.push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Duration in seconds; always positive for a constructed buffer
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// All samples of one channel
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Random access read. Panics on out-of-range indices: callers apply
    /// their own modulo arithmetic before reading.
    #[inline]
    pub fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.channels[channel][frame]
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Convert a time in seconds to the nearest frame index (not wrapped)
    pub fn secs_to_frame(&self, secs: f64) -> i64 {
        (secs * self.sample_rate as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_frames_and_rate() {
        let buffer = SampleBuffer::new(48_000, vec![vec![0.0; 96_000]; 2]).unwrap();
        assert_eq!(buffer.frame_count(), 96_000);
        assert_eq!(buffer.channel_count(), 2);
        assert!((buffer.duration_secs() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_interleaved_deinterleaves() {
        let buffer = SampleBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 8, 2).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.sample(1, 2), -0.3);
    }

    #[test]
    fn test_rejects_zero_duration() {
        assert!(matches!(
            SampleBuffer::new(44_100, vec![Vec::new()]),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn test_rejects_ragged_channels() {
        let result = SampleBuffer::new(44_100, vec![vec![0.0; 4], vec![0.0; 3]]);
        assert!(matches!(result, Err(DecodeError::InvalidLayout(_))));
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert!(matches!(
            SampleBuffer::new(0, vec![vec![0.0; 4]]),
            Err(DecodeError::InvalidSampleRate(0))
        ));
    }
}
