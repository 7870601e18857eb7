use tracing::{debug, info, instrument, warn};

use crate::audio::find_nearest_zero_crossing;
use crate::cli::Args;
use crate::error::{ExportError, PlaybackError};
use crate::export::{detect_tempo, ExportPermit, ExportPlan, ExportScope, ExportSummary};
use crate::ingest::BatchResult;
use crate::playback::{
    playback_offset, playhead_fraction, AudioOutput, MeterBank, PlaybackUnit, Transport, DRAG_THRESHOLD,
};
use crate::session::{Scene, SceneId, Session};

/// Columns a keyboard nudge travels; just past the drag threshold
pub const NUDGE_COLUMNS: f64 = DRAG_THRESHOLD + 3.0;

/// User-configurable settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Loop-start applied to the first group once it exists
    pub initial_loop_start: f64,
    /// Zero-crossing snap after drags and on export
    pub snap: bool,
    pub zoom_step: f64,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            initial_loop_start: args.loop_start,
            snap: args.snap,
            zoom_step: args.zoom_step,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_loop_start: 0.0,
            snap: false,
            zoom_step: crate::playback::DEFAULT_ZOOM_STEP,
        }
    }
}

/// Message shown in the footer
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Info(s) | Status::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

/// Top-level controller.
///
/// Owns the session, the transport and the audio output, and is the only
/// place that combines them: every user action enters here and is applied
/// synchronously.
pub struct AppState<O: AudioOutput> {
    pub settings: Settings,
    session: Session,
    transport: Transport,
    output: O,
    meters: MeterBank,
    export_guard: crate::export::ExportGuard,
    status: Option<Status>,
    loading: bool,
}

impl<O: AudioOutput> AppState<O> {
    pub fn new(settings: Settings, output: O) -> Self {
        let transport = Transport::new(settings.zoom_step);
        Self {
            settings,
            session: Session::new(),
            transport,
            output,
            meters: MeterBank::new(),
            export_guard: crate::export::ExportGuard::new(),
            status: None,
            loading: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn meters(&self) -> &MeterBank {
        &self.meters
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_exporting(&self) -> bool {
        self.export_guard.is_busy()
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &O {
        &self.output
    }

    // --- transport ---

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Start every assigned track of the active scene, phase-aligned to the
    /// group's loop-start. Does nothing without audio or when already running.
    #[instrument(skip(self))]
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.transport.is_playing() {
            return Ok(());
        }
        let Some(scene) = self.session.active_scene().filter(|s| s.has_audio()) else {
            debug!("Nothing to play");
            return Ok(());
        };

        let loop_start = self.session.group_loop_start();
        let units = playback_units(&self.session, scene, loop_start, 0.0);

        let now = self.output.now();
        self.transport.begin_playback(Some(now))?;
        self.session.apply_gains();

        if let Err(e) = self.output.start_units(units) {
            warn!(error = %e, "Failed to start playback");
            self.output.stop_all();
            self.transport.end_playback();
            return Err(e);
        }

        info!(loop_start, start_time = now, "Playing");
        Ok(())
    }

    /// Stop and release every playing track
    pub fn stop(&mut self) {
        if !self.transport.is_playing() {
            return;
        }
        self.output.stop_all();
        self.transport.end_playback();
        info!("Stopped");
    }

    pub fn toggle_playback(&mut self) -> Result<(), PlaybackError> {
        if self.transport.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Stop, apply `change`, and resume if playback was running
    fn with_restart<T>(&mut self, change: impl FnOnce(&mut Self) -> T) -> Result<T, PlaybackError> {
        let was_playing = self.transport.is_playing();
        if was_playing {
            self.stop();
        }
        let out = change(self);
        if was_playing {
            self.play()?;
        }
        Ok(out)
    }

    /// Position inside the active scene's loop right now
    pub fn loop_position(&self) -> Option<f64> {
        let master = self.session.active_scene()?.master_duration();
        self.transport
            .loop_position(self.output.now(), self.session.active_loop_start(), master)
    }

    /// Playhead as a fraction of the visible window, if on screen
    pub fn playhead_fraction(&self) -> Option<f64> {
        let master = self.session.active_scene()?.master_duration();
        let position = self.loop_position()?;
        playhead_fraction(
            position,
            self.session.active_loop_start(),
            master,
            self.transport.visible_duration(master),
        )
    }

    /// Tempo implied by the active scene's file names
    pub fn tempo_bpm(&self) -> f64 {
        let names = self
            .session
            .active_scene()
            .into_iter()
            .flat_map(|scene| scene.assignments().map(|(_, asset)| asset.name.as_str()));
        detect_tempo(names)
    }

    /// Visible window of the active scene in seconds
    pub fn visible_duration(&self) -> f64 {
        let master = self.session.active_scene().map_or(0.0, Scene::master_duration);
        self.transport.visible_duration(master)
    }

    /// Advance meter ballistics one frame. Returns whether another frame is
    /// needed.
    pub fn tick_meters(&mut self) -> bool {
        self.meters.update(self.session.tracks());
        self.needs_redraw()
    }

    pub fn needs_redraw(&self) -> bool {
        self.transport.is_playing() || self.meters.is_active()
    }

    // --- zoom ---

    pub fn zoom_in(&mut self) {
        self.transport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.transport.zoom_out();
    }

    pub fn zoom_fit(&mut self) {
        self.transport.zoom_fit();
    }

    // --- drag ---

    /// Press on a track's waveform at column `x`
    pub fn begin_drag(&mut self, track: usize, x: f64) {
        let drag = self.transport.begin_drag(track, x);
        if drag.was_playing {
            self.stop();
        }
    }

    /// Pointer moved to column `x` of a waveform `width` columns wide
    pub fn drag_to(&mut self, x: f64, width: f64) {
        let Some(master) = self.session.active_scene().map(Scene::master_duration) else {
            return;
        };
        let loop_start = self.session.active_loop_start();
        if let Some(next) = self.transport.drag_to(x, width, master, loop_start) {
            self.session.set_active_loop_start(next);
        }
    }

    /// Release the drag: snap if enabled and restart if it interrupted
    /// playback. A press that never moved leaves the transport stopped.
    pub fn end_drag(&mut self) -> Result<(), PlaybackError> {
        let Some(drag) = self.transport.end_drag() else {
            return Ok(());
        };
        if !drag.moved {
            return Ok(());
        }

        if self.settings.snap {
            let snapped = self
                .session
                .active_scene()
                .and_then(|scene| scene.assignment(drag.track))
                .map(|asset| find_nearest_zero_crossing(&asset.buffer, self.session.active_loop_start()));
            if let Some(snapped) = snapped {
                self.session.set_active_loop_start(snapped);
            }
        }

        debug!(loop_start = self.session.active_loop_start(), "Drag finished");

        if drag.was_playing {
            self.play()?;
        }
        Ok(())
    }

    /// Keyboard nudge: a full drag gesture of [`NUDGE_COLUMNS`] on `track`.
    /// Positive `direction` pans right (loop-start earlier).
    pub fn nudge(&mut self, track: usize, direction: f64, width: f64) -> Result<(), PlaybackError> {
        self.begin_drag(track, 0.0);
        self.drag_to(direction.signum() * NUDGE_COLUMNS, width);
        self.end_drag()
    }

    // --- tracks ---

    pub fn toggle_mute(&mut self, track: usize) {
        self.session.toggle_mute(track);
    }

    pub fn toggle_solo(&mut self, track: usize) {
        self.session.toggle_solo(track);
    }

    // --- scenes ---

    /// Turn a decoded batch into a scene. Returns the new scene, or `None`
    /// when nothing in the batch decoded.
    pub fn add_batch(&mut self, batch: BatchResult) -> Result<Option<SceneId>, PlaybackError> {
        for (path, error) in &batch.failures {
            self.status = Some(Status::Error(format!("{}: {}", path.display(), error)));
        }
        if !batch.dropped.is_empty() {
            self.status = Some(Status::Error(format!(
                "All tracks taken; dropped {}",
                batch.dropped.join(", ")
            )));
        }
        if !batch.has_audio() {
            warn!(batch = %batch.label, "Batch produced no audio");
            self.status = Some(Status::Error(format!("No playable audio in {}", batch.label)));
            return Ok(None);
        }

        let first = self.session.scenes().is_empty();
        let initial = self.settings.initial_loop_start;
        let id = self.with_restart(move |app| {
            let id = app.session.add_scene(batch.assignments);
            if first && initial != 0.0 {
                app.session.set_active_loop_start(initial);
            }
            id
        })?;
        Ok(Some(id))
    }

    pub fn select_scene(&mut self, id: SceneId) -> Result<(), PlaybackError> {
        if Some(id) == self.session.active_scene_id() {
            return Ok(());
        }
        self.with_restart(|app| {
            app.session.select_scene(id);
        })
    }

    /// Activate the scene `offset` tabs away, wrapping
    pub fn cycle_scene(&mut self, offset: isize) -> Result<(), PlaybackError> {
        match self.session.neighbor_scene(offset) {
            Some(id) => self.select_scene(id),
            None => Ok(()),
        }
    }

    /// Move the active scene one tab left (`-1`) or right (`1`), joining
    /// the neighbor's group
    pub fn move_active_scene(&mut self, direction: isize) {
        let Some(active) = self.session.active_scene_id() else {
            return;
        };
        let Some(index) = self.session.scene_index(active) else {
            return;
        };
        let target = index as isize + direction.signum();
        if target < 0 {
            return;
        }
        let Some(target) = self.session.scenes().get(target as usize).map(|s| s.id) else {
            return;
        };
        self.session.reorder_scene(active, target, direction > 0);
    }

    pub fn split_group_after_active(&mut self) {
        if let Some(id) = self.session.active_scene_id() {
            self.session.split_group_after(id);
        }
    }

    pub fn rename_active_scene(&mut self, name: &str) {
        if let Some(id) = self.session.active_scene_id() {
            self.session.rename_scene(id, name);
        }
    }

    pub fn delete_active_scene(&mut self) -> Result<(), PlaybackError> {
        let Some(id) = self.session.active_scene_id() else {
            return Ok(());
        };
        self.with_restart(|app| app.session.delete_scene(id))
    }

    /// Back to an empty session
    pub fn reset(&mut self) {
        self.stop();
        self.session.reset();
        self.transport.zoom_fit();
        self.meters.clear();
        self.status = None;
    }

    // --- export ---

    /// Claim the export guard and snapshot what to export. The session and
    /// transport are left untouched.
    pub fn prepare_export(&self, scope: ExportScope) -> Result<(ExportPlan, ExportPermit), ExportError> {
        let permit = self.export_guard.try_acquire()?;
        let plan = ExportPlan::from_session(&self.session, scope, self.settings.snap)?;
        Ok((plan, permit))
    }

    /// Record the outcome of a finished export
    pub fn finish_export(&mut self, result: Result<ExportSummary, ExportError>) {
        self.status = Some(match result {
            Ok(summary) => Status::Info(format!(
                "Exported {} clips in {} scenes to {}",
                summary.clips,
                summary.scenes,
                summary.path.display()
            )),
            Err(e) => Status::Error(format!("Export failed: {}", e)),
        });
    }
}

/// One looping unit per assigned track of `scene`, each seeked to where
/// the shared loop-start falls inside that track's own duration
pub fn playback_units(session: &Session, scene: &Scene, loop_start: f64, elapsed: f64) -> Vec<PlaybackUnit> {
    scene
        .assignments()
        .filter_map(|(index, asset)| {
            let track = session.track(index)?;
            Some(PlaybackUnit {
                track: index,
                buffer: asset.buffer.clone(),
                offset_secs: playback_offset(loop_start, elapsed, asset.duration_secs()),
                gain: track.gain().clone(),
                meter: track.meter().clone(),
            })
        })
        .collect()
}
