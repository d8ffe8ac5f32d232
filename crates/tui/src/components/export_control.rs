use dbq_core::models::ExportFormat;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

#[must_use]
pub fn is_enabled(query_id: Option<&str>) -> bool {
    query_id.is_some_and(|id| !id.is_empty())
}

#[must_use]
pub fn label(format: ExportFormat) -> String {
    format!("[Ctrl+S] Export {}  [Ctrl+F] format", format.label())
}

pub fn render(frame: &mut Frame<'_>, area: Rect, query_id: Option<&str>, format: ExportFormat) {
    let style = if is_enabled(query_id) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(label(format), style))),
        area,
    );
}
