use tracing::debug;

use super::buffer::SampleBuffer;

/// Frame index that becomes frame 0 when rotating `buffer` to `loop_start_secs`.
///
/// The loop-start is first reduced modulo the buffer's own duration, so a
/// value computed against a longer scene still lands inside this buffer.
/// Non-finite input falls back to frame 0.
pub fn loop_start_frame(buffer: &SampleBuffer, loop_start_secs: f64) -> usize {
    if !loop_start_secs.is_finite() {
        return 0;
    }

    let wrapped = loop_start_secs.rem_euclid(buffer.duration_secs());
    let frame = (wrapped * buffer.sample_rate() as f64).floor();

    // Float rounding can push `wrapped * rate` up to exactly frame_count.
    (frame.max(0.0) as usize).min(buffer.frame_count() - 1)
}

/// Rotate every channel so the audio at `loop_start_secs` becomes frame 0.
///
/// Frame count, sample rate and channel count are preserved exactly; only
/// the order of samples changes.
pub fn realign(buffer: &SampleBuffer, loop_start_secs: f64) -> SampleBuffer {
    let start = loop_start_frame(buffer, loop_start_secs);

    debug!(
        loop_start_secs,
        start_frame = start,
        frames = buffer.frame_count(),
        "Realigning buffer"
    );

    let channels = buffer
        .channels()
        .map(|samples| {
            let mut rotated = Vec::with_capacity(samples.len());
            rotated.extend_from_slice(&samples[start..]);
            rotated.extend_from_slice(&samples[..start]);
            rotated
        })
        .collect();

    // Shape is copied from a valid buffer, so construction cannot fail.
    SampleBuffer::new(buffer.sample_rate(), channels).unwrap_or_else(|_| buffer.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(frames: usize, sample_rate: u32) -> SampleBuffer {
        let left: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        SampleBuffer::new(sample_rate, vec![left, right]).unwrap()
    }

    #[test]
    fn test_rotation_moves_loop_start_to_frame_zero() {
        let buffer = ramp_buffer(16, 8); // 2 seconds
        let rotated = realign(&buffer, 0.5); // frame 4

        assert_eq!(rotated.sample(0, 0), buffer.sample(0, 4));
        assert_eq!(rotated.sample(1, 0), buffer.sample(1, 4));
        assert_eq!(rotated.sample(0, 11), buffer.sample(0, 15));
        assert_eq!(rotated.sample(0, 12), buffer.sample(0, 0));
        assert_eq!(rotated.frame_count(), buffer.frame_count());
        assert_eq!(rotated.sample_rate(), buffer.sample_rate());
        assert_eq!(rotated.channel_count(), buffer.channel_count());
    }

    #[test]
    fn test_forward_then_complement_is_identity() {
        let buffer = ramp_buffer(16, 8);
        let t = 0.625; // frame 5
        let once = realign(&buffer, t);
        let back = realign(&once, buffer.duration_secs() - t);

        assert_eq!(back, buffer);
    }

    #[test]
    fn test_rotation_is_a_permutation() {
        let buffer = ramp_buffer(1000, 1000);
        let rotated = realign(&buffer, 0.377);

        for ch in 0..buffer.channel_count() {
            let mut original: Vec<f32> = buffer.channel(ch).to_vec();
            let mut shuffled: Vec<f32> = rotated.channel(ch).to_vec();
            original.sort_by(f32::total_cmp);
            shuffled.sort_by(f32::total_cmp);
            assert_eq!(original, shuffled);
        }
    }

    #[test]
    fn test_loop_start_beyond_duration_wraps() {
        let buffer = ramp_buffer(16, 8);
        // 2.5s against a 2s buffer is the same as 0.5s
        assert_eq!(realign(&buffer, 2.5), realign(&buffer, 0.5));
        assert_eq!(loop_start_frame(&buffer, 2.5), 4);
    }

    #[test]
    fn test_negative_loop_start_wraps() {
        let buffer = ramp_buffer(16, 8);
        assert_eq!(loop_start_frame(&buffer, -0.5), 12);
    }

    #[test]
    fn test_zero_and_nan_are_identity() {
        let buffer = ramp_buffer(16, 8);
        assert_eq!(realign(&buffer, 0.0), buffer);
        assert_eq!(realign(&buffer, f64::NAN), buffer);
    }

    #[test]
    fn test_start_frame_is_clamped_below_frame_count() {
        let buffer = ramp_buffer(3, 3);
        let just_below_end = buffer.duration_secs() - f64::EPSILON;
        assert!(loop_start_frame(&buffer, just_below_end) < buffer.frame_count());
    }
}
