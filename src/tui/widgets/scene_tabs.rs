use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Tabs};

use crate::session::Session;

/// Render one tab per scene, each on its group's color
pub fn render(frame: &mut Frame, area: Rect, session: &Session) {
    let block = Block::default()
        .title(" Scenes ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let titles: Vec<Line> = session
        .scenes()
        .iter()
        .map(|scene| {
            let (r, g, b) = session
                .group(scene.group)
                .map(|group| group.color.rgb())
                .unwrap_or((40, 40, 40));
            Line::from(Span::styled(
                format!(" {} ", scene.name),
                Style::default().bg(Color::Rgb(r, g, b)).fg(Color::White),
            ))
        })
        .collect();

    let selected = session
        .active_scene_id()
        .and_then(|id| session.scene_index(id));

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected.unwrap_or(0))
        .highlight_style(Style::default().bold().underlined().fg(Color::Yellow))
        .divider(Span::styled("│", Style::default().fg(Color::DarkGray)));

    frame.render_widget(tabs, area);
}
