use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::panel;

#[must_use]
pub fn can_generate(prompt: &str, generating: bool) -> bool {
    !generating && !prompt.trim().is_empty()
}

pub fn render(frame: &mut Frame<'_>, area: Rect, prompt: &str, generating: bool, focused: bool) {
    let title = if generating {
        "Ask in plain language (generating...)"
    } else {
        "Ask in plain language"
    };
    let line = if prompt.is_empty() {
        Line::from(Span::styled(
            "e.g. top 10 customers by order count",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(prompt)
    };
    frame.render_widget(Paragraph::new(line).block(panel(title, focused)), area);

    if focused {
        let typed = u16::try_from(prompt.chars().count()).unwrap_or(u16::MAX);
        let x = (area.x + 1).saturating_add(typed).min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}
