use tracing::trace;

use super::buffer::SampleBuffer;

/// Half-width of the search window around the target, in seconds
pub const SEARCH_WINDOW_SECS: f64 = 0.01;

/// Find the zero-crossing on channel 0 nearest to `target_secs`.
///
/// Scans adjacent sample pairs within ±10 ms of the target, wrapping across
/// the buffer boundary. A pair whose product is `<= 0` is a crossing; of the
/// crossings found, the one with the smallest offset from the target wins
/// and equidistant crossings resolve to the earlier one. The returned time
/// is whichever sample of the winning pair sits closer to zero.
///
/// Returns `target_secs` unchanged when the window holds no crossing.
pub fn find_nearest_zero_crossing(buffer: &SampleBuffer, target_secs: f64) -> f64 {
    if !target_secs.is_finite() {
        return target_secs;
    }

    let data = buffer.channel(0);
    let len = data.len() as i64;
    let sample_rate = buffer.sample_rate() as f64;
    let target_index = buffer.secs_to_frame(target_secs);
    let radius = (sample_rate * SEARCH_WINDOW_SECS).round() as i64;

    let mut best: Option<(i64, usize)> = None;

    for i in -radius..=radius {
        let current = (target_index + i).rem_euclid(len) as usize;
        let next = (current + 1) % data.len();

        // NaN products are not crossings
        let product = data[current] * data[next];
        if product.is_nan() || product > 0.0 {
            continue;
        }

        let distance = i.abs();
        if best.map_or(true, |(min, _)| distance < min) {
            let index = if data[current].abs() < data[next].abs() {
                current
            } else {
                next
            };
            best = Some((distance, index));
        }
    }

    match best {
        Some((distance, index)) => {
            trace!(target_secs, index, distance, "Snapped to zero-crossing");
            index as f64 / sample_rate
        }
        None => target_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1000; // 10-sample search radius

    fn buffer(samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::new(RATE, vec![samples]).unwrap()
    }

    #[test]
    fn test_finds_single_exact_zero() {
        let k = 505;
        let samples: Vec<f32> = (0..1000)
            .map(|i| match i {
                i if i < k => 0.5,
                i if i == k => 0.0,
                _ => -0.5,
            })
            .collect();

        let found = find_nearest_zero_crossing(&buffer(samples), 0.5);
        assert!((found - k as f64 / RATE as f64).abs() <= 1.0 / RATE as f64);
    }

    #[test]
    fn test_picks_sample_closer_to_zero() {
        let mut samples = vec![0.5f32; 1000];
        for s in samples.iter_mut().skip(503) {
            *s = -0.2;
        }
        // crossing between 502 (0.5) and 503 (-0.2): 503 is quieter
        let found = find_nearest_zero_crossing(&buffer(samples), 0.5);
        assert_eq!(found, 0.503);
    }

    #[test]
    fn test_no_crossing_returns_target() {
        let found = find_nearest_zero_crossing(&buffer(vec![0.5; 1000]), 0.4321);
        assert_eq!(found, 0.4321);
    }

    #[test]
    fn test_nearest_wins_over_first_seen() {
        let mut samples = vec![0.5f32; 1000];
        // far crossing at offset -9, near crossing at offset +2
        samples[491] = -0.5;
        samples[502] = -0.5;
        let found = find_nearest_zero_crossing(&buffer(samples), 0.5);
        assert_eq!(found, 0.502);
    }

    #[test]
    fn test_equidistant_crossings_prefer_earlier() {
        let mut samples = vec![0.5f32; 1000];
        // negative run 497..=504: crossings at pair offsets -4 and +4
        for s in &mut samples[497..=504] {
            *s = -0.1;
        }
        let found = find_nearest_zero_crossing(&buffer(samples), 0.5);
        assert_eq!(found, 0.497);
    }

    #[test]
    fn test_nan_sample_is_not_a_crossing() {
        let mut samples = vec![0.5f32; 1000];
        samples[500] = f32::NAN;
        let found = find_nearest_zero_crossing(&buffer(samples), 0.5);
        assert_eq!(found, 0.5);
    }

    #[test]
    fn test_search_wraps_across_buffer_start() {
        let mut samples = vec![0.5f32; 1000];
        samples[998] = -0.1;
        let found = find_nearest_zero_crossing(&buffer(samples), 0.0);
        assert_eq!(found, 0.998);
    }
}
