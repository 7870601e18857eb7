use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::audio::AudioAsset;
use crate::render::{amplitude_glyph, column_peaks, level_glyph, loop_markers, View};
use crate::session::Track;

const LABEL_WIDTH: u16 = 16;
const METER_WIDTH: u16 = 8;

/// What one track row shows
pub struct TrackRow<'a> {
    pub track: &'a Track,
    pub selected: bool,
    pub audible: bool,
    pub level: f32,
    pub asset: Option<&'a AudioAsset>,
    pub view: Option<View>,
    pub playhead: Option<f64>,
    /// Group color of the active scene
    pub color: Color,
}

/// Label, meter and waveform areas of a row
pub fn split(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(LABEL_WIDTH),
            Constraint::Length(METER_WIDTH),
            Constraint::Min(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Render a track row
pub fn render(frame: &mut Frame, area: Rect, row: &TrackRow) {
    let [label, meter, wave] = split(area);
    // Single line vertically centered in the row
    let line_at = |r: Rect| Rect {
        y: r.y + r.height.saturating_sub(1) / 2,
        height: r.height.min(1),
        ..r
    };

    render_label(frame, line_at(label), row);
    render_meter(frame, line_at(meter), row.level);
    render_waveform(frame, line_at(wave), row);
}

fn render_label(frame: &mut Frame, area: Rect, row: &TrackRow) {
    let name_style = if row.selected {
        Style::default().bold().fg(Color::Yellow)
    } else if row.asset.is_some() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let flag = |on: bool, text: &'static str, color: Color| {
        if on {
            Span::styled(text, Style::default().bold().fg(Color::Black).bg(color))
        } else {
            Span::styled(text, Style::default().fg(Color::DarkGray))
        }
    };

    let line = Line::from(vec![
        Span::styled(if row.selected { "▶" } else { " " }, name_style),
        Span::styled(format!("{:<9}", row.track.name()), name_style),
        flag(row.track.muted, "M", Color::Red),
        Span::raw(" "),
        flag(row.track.soloed, "S", Color::Yellow),
        Span::raw(" "),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_meter(frame: &mut Frame, area: Rect, level: f32) {
    let width = area.width.saturating_sub(1) as usize;
    let filled = level.clamp(0.0, 1.0) * width as f32;
    let full = filled.floor() as usize;

    let mut bar: String = "█".repeat(full);
    if full < width {
        bar.push(amplitude_glyph(filled.fract()));
        bar.push_str(&" ".repeat(width - full - 1));
    }

    let color = if level > 0.9 {
        Color::Red
    } else if level > 0.6 {
        Color::Yellow
    } else {
        Color::Green
    };
    frame.render_widget(Paragraph::new(Span::styled(bar, Style::default().fg(color))), area);
}

fn render_waveform(frame: &mut Frame, area: Rect, row: &TrackRow) {
    let (Some(asset), Some(view)) = (row.asset, row.view) else {
        frame.render_widget(
            Paragraph::new(Span::styled("·".repeat(area.width as usize), Style::default().fg(Color::DarkGray))),
            area,
        );
        return;
    };

    let width = view.width;
    let markers = loop_markers(asset.duration_secs(), &view);
    let playhead = row
        .playhead
        .map(|fraction| ((fraction * width as f64) as usize).min(width.saturating_sub(1)));
    let wave_style = if row.audible {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let spans: Vec<Span> = column_peaks(asset, &view)
        .into_iter()
        .enumerate()
        .map(|(x, pair)| {
            let glyph = level_glyph(pair);
            if playhead == Some(x) {
                Span::styled("│", Style::default().bold().fg(Color::White))
            } else if markers.contains(&x) {
                Span::styled("┆", Style::default().fg(Color::Gray))
            } else {
                Span::styled(glyph.to_string(), wave_style.bg(row.color))
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
