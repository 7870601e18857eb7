use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::render::ruler_ticks;

/// Render the timeline ruler over `area`, aligned with the waveform columns
pub fn render(frame: &mut Frame, area: Rect) {
    let width = area.width as usize;
    let mut row = vec![' '; width];
    for (x, weight) in ruler_ticks(width) {
        if let Some(cell) = row.get_mut(x) {
            *cell = weight.glyph();
        }
    }

    let line = Line::from(Span::styled(
        row.into_iter().collect::<String>(),
        Style::default().fg(Color::Gray),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
