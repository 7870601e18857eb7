use std::time::Instant;

use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, info, instrument, warn};

use crate::error::PlaybackError;
use crate::session::TRACK_COUNT;

use super::source::LoopingSource;
use super::{AudioOutput, PlaybackUnit};

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub name: String,
    pub index: usize,
}

/// Get list of available audio output devices
pub fn list_audio_devices() -> Vec<AudioDevice> {
    let host = rodio::cpal::default_host();
    let mut devices = Vec::new();

    match host.output_devices() {
        Ok(output_devices) => {
            for (index, device) in output_devices.enumerate() {
                let name = device.name().unwrap_or_else(|_| format!("Device {}", index));
                devices.push(AudioDevice { name, index });
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to enumerate audio devices");
        }
    }

    devices
}

/// Get the default device index
pub fn default_device_index() -> usize {
    let host = rodio::cpal::default_host();
    let Some(default_name) = host.default_output_device().and_then(|d| d.name().ok()) else {
        return 0;
    };

    host.output_devices()
        .ok()
        .and_then(|mut devices| devices.position(|d| d.name().is_ok_and(|n| n == default_name)))
        .unwrap_or(0)
}

fn open_default() -> Result<(OutputStream, OutputStreamHandle, usize), PlaybackError> {
    let (stream, handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::Device(format!("Failed to open audio device: {}", e)))?;
    Ok((stream, handle, default_device_index()))
}

fn open_stream(device_index: Option<usize>) -> Result<(OutputStream, OutputStreamHandle, usize), PlaybackError> {
    let Some(index) = device_index else {
        return open_default();
    };

    let host = rodio::cpal::default_host();
    let device = host.output_devices().ok().and_then(|mut devices| devices.nth(index));
    let Some(device) = device else {
        warn!(index, "Device index out of range, using default");
        return open_default();
    };

    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    match OutputStream::try_from_device(&device) {
        Ok((stream, handle)) => {
            info!(device = %name, index, "Using selected audio device");
            Ok((stream, handle, index))
        }
        Err(e) => {
            warn!(error = %e, device = %name, "Failed to open selected device, using default");
            open_default()
        }
    }
}

/// rodio-backed output with one sink per track.
///
/// Sinks are acquired once at startup and reused for every start; a stop
/// clears them all, and dropping the engine stops everything.
pub struct PlaybackEngine {
    /// Keep the stream alive (dropping it stops audio)
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sinks: Vec<Sink>,
    /// Reference point of the output clock
    epoch: Instant,
    device_index: usize,
}

impl PlaybackEngine {
    /// Open the output device and one sink per track
    #[instrument]
    pub fn with_device(device_index: Option<usize>) -> Result<Self, PlaybackError> {
        info!("Initializing audio output");

        let (stream, stream_handle, actual_index) = open_stream(device_index)?;

        let sinks = (0..TRACK_COUNT)
            .map(|_| {
                Sink::try_new(&stream_handle)
                    .map_err(|e| PlaybackError::Sink(format!("Failed to create audio sink: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(sinks = sinks.len(), "Audio output initialized");

        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sinks,
            epoch: Instant::now(),
            device_index: actual_index,
        })
    }

    pub fn device_index(&self) -> usize {
        self.device_index
    }
}

impl AudioOutput for PlaybackEngine {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    #[instrument(skip_all, fields(units = units.len()))]
    fn start_units(&mut self, units: Vec<PlaybackUnit>) -> Result<(), PlaybackError> {
        let mut started = Vec::with_capacity(units.len());

        // Queue everything paused first so all tracks are released together
        for unit in units {
            let Some(sink) = self.sinks.get(unit.track) else {
                warn!(track = unit.track, "No sink for track");
                continue;
            };

            debug!(
                track = unit.track,
                offset_secs = unit.offset_secs,
                duration_secs = unit.buffer.duration_secs(),
                "Queueing loop"
            );

            sink.clear();
            sink.pause();
            sink.append(LoopingSource::new(unit.buffer, unit.offset_secs, unit.gain, unit.meter));
            started.push(unit.track);
        }

        for &track in &started {
            self.sinks[track].play();
        }

        info!(tracks = started.len(), "Playback started");
        Ok(())
    }

    #[instrument(skip(self))]
    fn stop_all(&mut self) {
        for sink in &self.sinks {
            sink.clear();
        }
        debug!("All sinks cleared");
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        debug!("Dropping playback engine");
        self.stop_all();
    }
}
