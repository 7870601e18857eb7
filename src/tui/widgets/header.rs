use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Transport summary shown in the header
pub struct HeaderInfo<'a> {
    pub playing: bool,
    pub loading: bool,
    pub exporting: bool,
    pub scene: Option<&'a str>,
    pub tempo_bpm: f64,
    pub loop_start: f64,
    pub zoom: f64,
    pub snap: bool,
}

/// Render the header bar
pub fn render(frame: &mut Frame, area: Rect, info: &HeaderInfo) {
    let (status, color) = if info.exporting {
        ("EXPORTING", Color::Magenta)
    } else if info.loading {
        ("LOADING", Color::Yellow)
    } else if info.playing {
        ("PLAYING", Color::Green)
    } else {
        ("STOPPED", Color::Gray)
    };

    let mut spans = vec![
        Span::styled(" phaseloop ", Style::default().bold().fg(Color::Cyan)),
        Span::raw("| "),
        Span::styled(status, Style::default().fg(color)),
        Span::raw(" | "),
    ];

    match info.scene {
        Some(scene) => {
            spans.push(Span::styled(scene.to_string(), Style::default().bold().fg(Color::White)));
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("{:.1} BPM", info.tempo_bpm),
                Style::default().fg(Color::Magenta),
            ));
            spans.push(Span::raw(" | loop-start "));
            spans.push(Span::styled(
                format!("{:.3}s", info.loop_start),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::raw(" | zoom "));
            spans.push(Span::styled(
                format!("{:.1}x", info.zoom),
                Style::default().fg(Color::Cyan),
            ));
        }
        None => spans.push(Span::styled(
            "Pass audio files or folders on the command line",
            Style::default().fg(Color::Gray),
        )),
    }

    if info.snap {
        spans.push(Span::styled(" [snap]", Style::default().fg(Color::Yellow)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans)).block(block).centered();
    frame.render_widget(paragraph, area);
}
