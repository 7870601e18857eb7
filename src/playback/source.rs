use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

use crate::audio::{loop_start_frame, SampleBuffer};

use super::control::{GainControl, MeterTap};

/// Time for the applied gain to travel the full 0..1 range
const GAIN_RAMP_SECS: f32 = 0.005;

/// Frames between meter flushes
const METER_BLOCK_FRAMES: usize = 256;

/// Endless looping source over a shared buffer.
///
/// Starts at a seek offset, wraps at the buffer's own end, follows its
/// track's gain control with a short ramp and feeds the track meter.
pub struct LoopingSource {
    buffer: Arc<SampleBuffer>,
    /// Current frame index
    frame: usize,
    /// Channel of the next sample within the current frame
    channel: usize,
    gain: GainControl,
    /// Gain actually applied, ramping toward the control's target
    applied_gain: f32,
    /// Per-frame gain increment
    ramp_step: f32,
    meter: MeterTap,
    /// Loudest output since the last meter flush
    block_peak: f32,
    block_frames: usize,
}

impl LoopingSource {
    /// Create a source that begins at `offset_secs` into `buffer`
    pub fn new(buffer: Arc<SampleBuffer>, offset_secs: f64, gain: GainControl, meter: MeterTap) -> Self {
        let frame = loop_start_frame(&buffer, offset_secs);
        let ramp_step = 1.0 / (buffer.sample_rate() as f32 * GAIN_RAMP_SECS).max(1.0);
        let applied_gain = gain.get();

        Self {
            buffer,
            frame,
            channel: 0,
            gain,
            applied_gain,
            ramp_step,
            meter,
            block_peak: 0.0,
            block_frames: 0,
        }
    }

    fn advance_frame(&mut self) {
        self.channel = 0;
        self.frame += 1;
        if self.frame >= self.buffer.frame_count() {
            self.frame = 0;
        }

        let target = self.gain.get();
        if self.applied_gain < target {
            self.applied_gain = (self.applied_gain + self.ramp_step).min(target);
        } else if self.applied_gain > target {
            self.applied_gain = (self.applied_gain - self.ramp_step).max(target);
        }

        self.block_frames += 1;
        if self.block_frames >= METER_BLOCK_FRAMES {
            self.meter.record(self.block_peak);
            self.block_peak = 0.0;
            self.block_frames = 0;
        }
    }
}

impl Source for LoopingSource {
    fn current_frame_len(&self) -> Option<usize> {
        // Loops forever; the format never changes mid-stream
        None
    }

    fn channels(&self) -> u16 {
        self.buffer.channel_count() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for LoopingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.buffer.sample(self.channel, self.frame) * self.applied_gain;
        self.block_peak = self.block_peak.max(sample.abs());

        self.channel += 1;
        if self.channel >= self.buffer.channel_count() {
            self.advance_frame();
        }

        Some(sample)
    }
}
