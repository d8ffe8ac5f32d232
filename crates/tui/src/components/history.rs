use dbq_core::models::HistoryItem;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::panel;

pub const EMPTY_TEXT: &str = "No history yet";

/// Shortens `sql` to `width` chars plus `...`; the stored item keeps the full text.
#[must_use]
pub fn truncate_sql(sql: &str, width: usize) -> String {
    if sql.chars().count() <= width {
        return sql.to_string();
    }
    let mut shortened: String = sql.chars().take(width).collect();
    shortened.push_str("...");
    shortened
}

#[must_use]
pub fn describe(item: &HistoryItem) -> String {
    format!("{} · {}", item.connection_name, item.executed_at)
}

pub struct HistoryView<'a> {
    pub items: &'a [HistoryItem],
    pub width: usize,
    pub focused: bool,
}

pub fn render(frame: &mut Frame<'_>, area: Rect, view: &HistoryView<'_>, state: &mut ListState) {
    let block = panel("History", view.focused);
    if view.items.is_empty() {
        let placeholder = Paragraph::new(EMPTY_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem<'_>> = view
        .items
        .iter()
        .map(|item| {
            ListItem::new(vec![
                Line::from(truncate_sql(&item.sql_text, view.width)),
                Line::from(Span::styled(
                    describe(item),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, state);
}
