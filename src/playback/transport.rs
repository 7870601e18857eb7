use tracing::{debug, error};

use crate::error::PlaybackError;
use crate::session::wrap_loop_start;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 130.0;
pub const DEFAULT_ZOOM_STEP: f64 = 1.5;

/// Pointer travel (in columns/pixels) before a press counts as a drag
pub const DRAG_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// An in-progress loop-start drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Track row the gesture started on
    pub track: usize,
    pub start_x: f64,
    pub last_x: f64,
    /// Crossed the drag threshold at least once
    pub moved: bool,
    /// Transport was running when the press happened
    pub was_playing: bool,
}

/// Shared timeline state: play state, zoom and the drag gesture.
///
/// Holds no audio handles. Callers pass clock readings and loop-starts in,
/// which keeps every transition here synchronous and testable.
#[derive(Debug, Clone)]
pub struct Transport {
    state: PlayState,
    playback_start_time: Option<f64>,
    zoom: f64,
    zoom_step: f64,
    drag: Option<Drag>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_STEP)
    }
}

impl Transport {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            state: PlayState::Stopped,
            playback_start_time: None,
            zoom: MIN_ZOOM,
            zoom_step: if zoom_step > 1.0 { zoom_step } else { DEFAULT_ZOOM_STEP },
            drag: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn playback_start_time(&self) -> Option<f64> {
        self.playback_start_time
    }

    /// Enter `Playing` with `start_time` as the shared clock reference.
    ///
    /// A missing reference is a control-flow bug: it is logged, the state
    /// stays `Stopped` and the caller gets an error.
    pub fn begin_playback(&mut self, start_time: Option<f64>) -> Result<f64, PlaybackError> {
        self.state = PlayState::Playing;
        match start_time.filter(|t| t.is_finite()) {
            Some(t) => {
                self.playback_start_time = Some(t);
                debug!(start_time = t, "Transport playing");
                Ok(t)
            }
            None => {
                error!("Playback started without a start time; reverting to stopped");
                self.end_playback();
                Err(PlaybackError::MissingStartTime)
            }
        }
    }

    pub fn end_playback(&mut self) {
        self.state = PlayState::Stopped;
        self.playback_start_time = None;
    }

    /// Position within the scene loop at clock time `now`, while playing
    pub fn loop_position(&self, now: f64, loop_start: f64, master_duration: f64) -> Option<f64> {
        let start = self.playback_start_time.filter(|_| self.is_playing())?;
        Some(wrap_loop_start(loop_start + (now - start), master_duration))
    }

    // --- zoom ---

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Multiply the zoom by `factor`, clamped to the zoom range
    pub fn change_zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        debug!(zoom = self.zoom, "Zoom changed");
    }

    pub fn zoom_in(&mut self) {
        self.change_zoom(self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.change_zoom(1.0 / self.zoom_step);
    }

    pub fn zoom_fit(&mut self) {
        self.zoom = MIN_ZOOM;
    }

    pub fn visible_duration(&self, master_duration: f64) -> f64 {
        master_duration / self.zoom
    }

    // --- drag ---

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Press on a track row. The caller stops audio when `was_playing`.
    pub fn begin_drag(&mut self, track: usize, x: f64) -> Drag {
        let drag = Drag {
            track,
            start_x: x,
            last_x: x,
            moved: false,
            was_playing: self.is_playing(),
        };
        self.drag = Some(drag);
        drag
    }

    /// Pointer moved to `x`; returns the new loop-start once the gesture
    /// has passed the drag threshold.
    pub fn drag_to(&mut self, x: f64, width: f64, master_duration: f64, loop_start: f64) -> Option<f64> {
        let visible = self.visible_duration(master_duration);
        let drag = self.drag.as_mut()?;

        if !drag.moved {
            if (x - drag.start_x).abs() <= DRAG_THRESHOLD {
                return None;
            }
            drag.moved = true;
        }

        let dx = x - drag.last_x;
        drag.last_x = x;
        Some(pan_loop_start(loop_start, dx, width, visible, master_duration))
    }

    /// Release. Returns the finished gesture so the caller can snap and
    /// restart.
    pub fn end_drag(&mut self) -> Option<Drag> {
        self.drag.take()
    }
}

/// Seek offset into a buffer of `buffer_duration` for a transport that has
/// been running `elapsed` seconds from `loop_start`.
pub fn playback_offset(loop_start: f64, elapsed: f64, buffer_duration: f64) -> f64 {
    wrap_loop_start(loop_start + elapsed, buffer_duration)
}

/// Apply a horizontal drag of `dx` pixels across a view `width` pixels wide
/// showing `visible` seconds. Dragging right moves the loop-start earlier.
pub fn pan_loop_start(loop_start: f64, dx: f64, width: f64, visible: f64, master_duration: f64) -> f64 {
    if width <= 0.0 || master_duration <= 0.0 || !dx.is_finite() {
        return loop_start;
    }
    let delta = (dx / width) * visible;
    wrap_loop_start(loop_start - delta, master_duration)
}

/// Playhead position as a fraction of the visible window, if on screen
pub fn playhead_fraction(position: f64, loop_start: f64, master_duration: f64, visible: f64) -> Option<f64> {
    if visible <= 0.0 {
        return None;
    }
    let offset = wrap_loop_start(position - loop_start, master_duration);
    let fraction = offset / visible;
    (0.0..1.0).contains(&fraction).then_some(fraction)
}
