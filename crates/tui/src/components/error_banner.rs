use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Rows reserved for the banner; zero when there is nothing to show.
#[must_use]
pub fn height(error: Option<&str>) -> u16 {
    if error.is_some() {
        3
    } else {
        0
    }
}

pub fn render(frame: &mut Frame<'_>, area: Rect, error: Option<&str>) {
    let Some(message) = error else {
        return;
    };

    let line = Line::from(vec![
        Span::styled(
            message,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  (Esc to dismiss)", Style::default().fg(Color::DarkGray)),
    ]);
    let banner = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("Error"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}
