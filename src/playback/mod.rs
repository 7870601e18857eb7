mod control;
mod engine;
mod meter;
mod source;
mod transport;

pub use control::{GainControl, MeterTap};
pub use engine::{default_device_index, list_audio_devices, PlaybackEngine};
pub use meter::MeterBank;
pub use transport::{playback_offset, playhead_fraction, Transport, DEFAULT_ZOOM_STEP, DRAG_THRESHOLD};

use std::sync::Arc;

use crate::audio::SampleBuffer;
use crate::error::PlaybackError;

/// One track's looping voice for a single play action
#[derive(Debug, Clone)]
pub struct PlaybackUnit {
    pub track: usize,
    pub buffer: Arc<SampleBuffer>,
    /// Seek position into `buffer`, already phase-aligned
    pub offset_secs: f64,
    pub gain: GainControl,
    pub meter: MeterTap,
}

/// The platform audio seam.
///
/// Start/stop are fire-and-forget; the only thing read back is the clock.
pub trait AudioOutput {
    /// Output clock in seconds
    fn now(&self) -> f64;

    /// Start every unit from one synchronous call so their relative phase
    /// is fixed by the output, not by the caller
    fn start_units(&mut self, units: Vec<PlaybackUnit>) -> Result<(), PlaybackError>;

    /// Stop and release every active unit
    fn stop_all(&mut self);
}

/// Output that plays nothing; used for headless export
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn now(&self) -> f64 {
        0.0
    }

    fn start_units(&mut self, _units: Vec<PlaybackUnit>) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn stop_all(&mut self) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory output with a hand-driven clock
    #[derive(Debug, Default)]
    pub struct ManualOutput {
        pub clock: f64,
        pub active: Vec<PlaybackUnit>,
        pub starts: usize,
        pub stops: usize,
    }

    impl AudioOutput for ManualOutput {
        fn now(&self) -> f64 {
            self.clock
        }

        fn start_units(&mut self, units: Vec<PlaybackUnit>) -> Result<(), PlaybackError> {
            self.active = units;
            self.starts += 1;
            Ok(())
        }

        fn stop_all(&mut self) {
            self.active.clear();
            self.stops += 1;
        }
    }
}
