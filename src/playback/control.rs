use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Target gain for one track, shared with the audio thread.
///
/// The f32 is stored as raw bits in an atomic so the realtime side never
/// takes a lock.
#[derive(Debug, Clone)]
pub struct GainControl {
    bits: Arc<AtomicU32>,
}

impl GainControl {
    pub fn new(gain: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(gain.to_bits())),
        }
    }

    pub fn set(&self, gain: f32) {
        self.bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for GainControl {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Peak accumulator written by the audio thread and drained by the UI
#[derive(Debug, Clone, Default)]
pub struct MeterTap {
    peak_bits: Arc<AtomicU32>,
}

impl MeterTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the held peak to `peak` if it is louder
    pub fn record(&self, peak: f32) {
        // Bit patterns of non-negative floats order the same as their values
        let bits = peak.abs().min(1.0).to_bits();
        self.peak_bits.fetch_max(bits, Ordering::Relaxed);
    }

    /// Peak since the last call, resetting it to silence
    pub fn take(&self) -> f32 {
        f32::from_bits(self.peak_bits.swap(0, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_shared_between_clones() {
        let gain = GainControl::new(1.0);
        let audio_side = gain.clone();
        gain.set(0.0);
        assert_eq!(audio_side.get(), 0.0);
    }

    #[test]
    fn test_meter_keeps_loudest_peak_until_taken() {
        let meter = MeterTap::new();
        meter.record(0.2);
        meter.record(-0.7);
        meter.record(0.4);
        assert_eq!(meter.take(), 0.7);
        assert_eq!(meter.take(), 0.0);
    }

    #[test]
    fn test_meter_clamps_overs() {
        let meter = MeterTap::new();
        meter.record(3.0);
        assert_eq!(meter.take(), 1.0);
    }
}
