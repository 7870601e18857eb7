use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::app::{AppState, Status};
use crate::error::{PlaybackError, TuiError};
use crate::export::{ExportScope, StemFolderEncoder};
use crate::playback::AudioOutput;
use crate::render::View;
use crate::session::TRACK_COUNT;
use crate::tasks::WorkerCommand;

use super::widgets::header::{self, HeaderInfo};
use super::widgets::track_row::{self, TrackRow};
use super::widgets::{ruler, scene_tabs};

/// Column of the mute flag inside a row label
const MUTE_COLUMN: u16 = 10;
/// Column of the solo flag inside a row label
const SOLO_COLUMN: u16 = 12;

/// Result of draining terminal input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Nothing arrived
    Idle,
    /// Something arrived; the screen is stale
    Handled,
    Quit,
}

/// TUI application state
pub struct TuiApp {
    cmd_tx: mpsc::Sender<WorkerCommand>,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    export_root: PathBuf,

    // Keyboard focus
    selected_track: usize,
    renaming: Option<String>,

    // Row areas from the last frame, for mouse hit-testing
    rows: Vec<Rect>,
}

impl TuiApp {
    /// Create a new TUI application
    pub fn new(cmd_tx: mpsc::Sender<WorkerCommand>, export_root: PathBuf) -> Result<Self, TuiError> {
        // Set up terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            cmd_tx,
            terminal,
            export_root,
            selected_track: 0,
            renaming: None,
            rows: Vec::new(),
        })
    }

    /// Restore terminal state
    fn restore_terminal(&mut self) -> Result<(), TuiError> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Width in columns of the waveform area, as last drawn
    fn waveform_width(&self) -> f64 {
        self.rows
            .first()
            .map(|row| track_row::split(*row)[2].width as f64)
            .filter(|w| *w > 0.0)
            .unwrap_or(80.0)
    }

    /// Draw the TUI
    pub fn draw<O: AudioOutput>(&mut self, app: &AppState<O>) -> Result<(), TuiError> {
        let session = app.session();
        let scene = session.active_scene();
        let group_color = session
            .active_group()
            .map(|group| {
                let (r, g, b) = group.color.rgb();
                Color::Rgb(r, g, b)
            })
            .unwrap_or(Color::Reset);
        let loop_start = session.active_loop_start();
        let group_loop_start = session.group_loop_start();
        let playhead = app.playhead_fraction();
        let any_soloed = session.any_soloed();
        let selected_track = self.selected_track;
        let renaming = self.renaming.clone();
        let mut rows = Vec::with_capacity(TRACK_COUNT);

        let header_info = HeaderInfo {
            playing: app.is_playing(),
            loading: app.is_loading(),
            exporting: app.is_exporting(),
            scene: scene.map(|s| s.name.as_str()),
            tempo_bpm: app.tempo_bpm(),
            loop_start,
            zoom: app.transport().zoom(),
            snap: app.settings.snap,
        };

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: header, scenes, tracks, ruler, footer
            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2), // Header
                    Constraint::Length(3), // Scene tabs
                    Constraint::Min(TRACK_COUNT as u16), // Tracks
                    Constraint::Length(1), // Ruler
                    Constraint::Length(2), // Footer
                ])
                .split(area);

            header::render(frame, main_chunks[0], &header_info);
            scene_tabs::render(frame, main_chunks[1], session);

            let track_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Ratio(1, TRACK_COUNT as u32); TRACK_COUNT])
                .split(main_chunks[2]);

            for (track, area) in session.tracks().iter().zip(track_chunks.iter()) {
                let wave = track_row::split(*area)[2];
                let asset = scene.and_then(|s| s.assignment(track.index()));
                let view = scene.map(|s| View {
                    loop_start: group_loop_start,
                    visible: app.visible_duration(),
                    master: s.master_duration(),
                    zoom: app.transport().zoom(),
                    width: wave.width as usize,
                });

                track_row::render(
                    frame,
                    *area,
                    &TrackRow {
                        track,
                        selected: track.index() == selected_track,
                        audible: track.is_audible(any_soloed),
                        level: app.meters().level(track.index()),
                        asset,
                        view,
                        playhead,
                        color: group_color,
                    },
                );
                rows.push(*area);
            }

            // Ruler sits under the waveform columns
            let ruler_area = track_row::split(main_chunks[3])[2];
            ruler::render(frame, ruler_area);

            render_footer(frame, main_chunks[4], app.status(), renaming.as_deref());
        })?;

        self.rows = rows;
        Ok(())
    }

    /// Handle every pending input event (non-blocking)
    pub async fn handle_input<O: AudioOutput>(&mut self, app: &mut AppState<O>) -> Result<Input, TuiError> {
        let mut outcome = Input::Idle;
        // Poll for events with a short timeout
        let mut timeout = Duration::from_millis(10);
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            outcome = Input::Handled;
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key, app).await {
                        return Ok(Input::Quit);
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse, app),
                _ => {}
            }
        }
        Ok(outcome)
    }

    async fn handle_key<O: AudioOutput>(&mut self, key: KeyEvent, app: &mut AppState<O>) -> bool {
        if let Some(name) = self.renaming.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let name = std::mem::take(name);
                    app.rename_active_scene(&name);
                    self.renaming = None;
                }
                KeyCode::Esc => self.renaming = None,
                KeyCode::Backspace => {
                    name.pop();
                }
                KeyCode::Char(c) => name.push(c),
                _ => {}
            }
            return false;
        }

        let width = self.waveform_width();
        let track = self.selected_track;

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                info!("Interrupt requested");
                let _ = self.cmd_tx.send(WorkerCommand::Quit).await;
                return true;
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("Quit requested");
                let _ = self.cmd_tx.send(WorkerCommand::Quit).await;
                return true;
            }
            KeyCode::Char(' ') => report(app, |app| app.toggle_playback()),
            KeyCode::Left => report(app, |app| app.nudge(track, -1.0, width)),
            KeyCode::Right => report(app, |app| app.nudge(track, 1.0, width)),
            KeyCode::Up => self.selected_track = self.selected_track.saturating_sub(1),
            KeyCode::Down => self.selected_track = (self.selected_track + 1).min(TRACK_COUNT - 1),
            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
            KeyCode::Char('-') => app.zoom_out(),
            KeyCode::Char('0') => app.zoom_fit(),
            KeyCode::Char('m') => app.toggle_mute(track),
            KeyCode::Char('s') => app.toggle_solo(track),
            KeyCode::Tab => report(app, |app| app.cycle_scene(1)),
            KeyCode::BackTab => report(app, |app| app.cycle_scene(-1)),
            KeyCode::Char('<') => app.move_active_scene(-1),
            KeyCode::Char('>') => app.move_active_scene(1),
            KeyCode::Char('x') => app.split_group_after_active(),
            KeyCode::Char('d') => report(app, |app| app.delete_active_scene()),
            KeyCode::Char('r') => {
                self.renaming = app.session().active_scene().map(|s| s.name.clone());
            }
            KeyCode::Char('N') => {
                app.reset();
                self.selected_track = 0;
            }
            KeyCode::Char('z') => {
                app.settings.snap = !app.settings.snap;
                debug!(snap = app.settings.snap, "Snap toggled");
            }
            KeyCode::Char('e') => self.export(app, ExportScope::All).await,
            KeyCode::Char('E') => self.export(app, ExportScope::Active).await,
            _ => {}
        }
        false
    }

    fn handle_mouse<O: AudioOutput>(&mut self, mouse: MouseEvent, app: &mut AppState<O>) {
        let position = Position::new(mouse.column, mouse.row);
        let hit = self.rows.iter().position(|row| row.contains(position));

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(track) = hit else {
                    return;
                };
                self.selected_track = track;
                let [label, _, wave] = track_row::split(self.rows[track]);

                if wave.contains(position) {
                    app.begin_drag(track, (mouse.column - wave.x) as f64);
                } else if mouse.column == label.x + MUTE_COLUMN {
                    app.toggle_mute(track);
                } else if mouse.column == label.x + SOLO_COLUMN {
                    app.toggle_solo(track);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if !app.transport().is_dragging() {
                    return;
                }
                let Some(row) = self.rows.first() else {
                    return;
                };
                let wave = track_row::split(*row)[2];
                app.drag_to(mouse.column as f64 - wave.x as f64, wave.width as f64);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if app.transport().is_dragging() {
                    report(app, |app| app.end_drag());
                }
            }
            _ => {}
        }
    }

    async fn export<O: AudioOutput>(&self, app: &mut AppState<O>, scope: ExportScope) {
        match app.prepare_export(scope) {
            Ok((plan, permit)) => {
                info!(?scope, out_dir = %self.export_root.display(), "Export requested");
                let cmd = WorkerCommand::Export {
                    plan,
                    encoder: Arc::new(StemFolderEncoder),
                    out_dir: self.export_root.clone(),
                    permit,
                };
                if self.cmd_tx.send(cmd).await.is_err() {
                    app.set_status(Status::Error("Worker is not running".into()));
                } else {
                    app.set_status(Status::Info("Exporting...".into()));
                }
            }
            Err(e) if e.is_transient() => app.set_status(Status::Info(e.to_string())),
            Err(e) => app.set_status(Status::Error(format!("Export: {}", e))),
        }
    }

    /// Run cleanup on drop
    pub fn cleanup(&mut self) {
        if let Err(e) = self.restore_terminal() {
            error!(error = %e, "Failed to restore terminal");
        }
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Run a transport action and surface its error in the footer
fn report<O: AudioOutput>(
    app: &mut AppState<O>,
    action: impl FnOnce(&mut AppState<O>) -> Result<(), PlaybackError>,
) {
    if let Err(e) = action(app) {
        app.set_status(Status::Error(e.to_string()));
    }
}

/// Render the footer with controls, the rename prompt or the last status
fn render_footer(frame: &mut Frame, area: Rect, status: Option<&Status>, renaming: Option<&str>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let line = if let Some(name) = renaming {
        Line::from(vec![
            Span::styled("Rename scene: ", Style::default().fg(Color::Cyan)),
            Span::raw(name.to_string()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ])
    } else if let Some(status) = status {
        let color = if status.is_error() { Color::Red } else { Color::Green };
        Line::from(Span::styled(status.text().to_string(), Style::default().fg(color)))
    } else {
        Line::from(vec![
            key("space"),
            Span::raw(":play  "),
            key("←/→"),
            Span::raw(":nudge  "),
            key("+/-/0"),
            Span::raw(":zoom  "),
            key("m/s"),
            Span::raw(":mute/solo  "),
            key("tab"),
            Span::raw(":scene  "),
            key("</>"),
            Span::raw(":move  "),
            key("x"),
            Span::raw(":split  "),
            key("r"),
            Span::raw(":rename  "),
            key("d"),
            Span::raw(":delete  "),
            key("N"),
            Span::raw(":clear  "),
            key("z"),
            Span::raw(":snap  "),
            key("e/E"),
            Span::raw(":export  "),
            key("q"),
            Span::raw(":quit"),
        ])
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(line).block(block).centered();
    frame.render_widget(paragraph, area);
}
