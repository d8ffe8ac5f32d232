use dbq_core::models::{QueryColumn, QueryResult};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use serde_json::Value;

use super::panel;

pub const EMPTY_TEXT: &str = "No results";

#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[must_use]
pub fn header_cells(columns: &[QueryColumn]) -> Vec<String> {
    columns.iter().map(|column| column.name.clone()).collect()
}

/// Exactly `width` cells: missing trailing values render empty, extras are dropped.
#[must_use]
pub fn row_cells(row: &[Value], width: usize) -> Vec<String> {
    (0..width)
        .map(|index| row.get(index).map(format_value).unwrap_or_default())
        .collect()
}

#[must_use]
pub fn summary(result: &QueryResult) -> String {
    format!(
        "{} rows · {} ms · limit {}",
        result.rows.len(),
        result.duration_ms,
        result.limit_applied
    )
}

pub fn render(
    frame: &mut Frame<'_>,
    area: Rect,
    result: Option<&QueryResult>,
    state: &mut TableState,
    focused: bool,
) {
    let Some(result) = result else {
        let placeholder = Paragraph::new(EMPTY_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .block(panel("Results", focused));
        frame.render_widget(placeholder, area);
        return;
    };

    let width = result.columns.len();
    let header = Row::new(header_cells(&result.columns).into_iter().map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = result
        .rows
        .iter()
        .map(|row| Row::new(row_cells(row, width).into_iter().map(Cell::from)));
    let widths = vec![Constraint::Fill(1); width.max(1)];

    let title = format!("Results · {}", summary(result));
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(&title, focused))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(table, area, state);
}

#[cfg(test)]
mod tests {
    use dbq_core::models::{QueryColumn, QueryResult};
    use ratatui::widgets::TableState;
    use serde_json::json;

    use super::{format_value, header_cells, render, row_cells, summary};
    use crate::components::test_support::render_lines;

    fn result() -> QueryResult {
        QueryResult {
            columns: vec![
                QueryColumn {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                },
                QueryColumn {
                    name: "email".to_string(),
                    data_type: "text".to_string(),
                },
            ],
            rows: vec![
                vec![json!(1), json!("a@example.com")],
                vec![json!(2)],
                vec![json!(3), json!(null), json!("extra")],
            ],
            duration_ms: 12,
            limit_applied: 1000,
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn values_render_as_display_text() {
        assert_eq!(format_value(&json!("plain")), "plain");
        assert_eq!(format_value(&json!(null)), "NULL");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn rows_always_have_one_cell_per_column() {
        let result = result();
        assert_eq!(header_cells(&result.columns), vec!["id", "email"]);
        for row in &result.rows {
            assert_eq!(row_cells(row, result.columns.len()).len(), 2);
        }
        assert_eq!(row_cells(&result.rows[1], 2), vec!["2", ""]);
        assert_eq!(row_cells(&result.rows[2], 2), vec!["3", "NULL"]);
    }

    #[test]
    fn title_reports_count_duration_and_limit() {
        assert_eq!(summary(&result()), "3 rows · 12 ms · limit 1000");
    }

    #[test]
    fn renders_headers_in_response_order() {
        let result = result();
        let mut state = TableState::default();
        let lines = render_lines(50, 8, |frame| {
            let area = frame.area();
            render(frame, area, Some(&result), &mut state, false);
        });

        let header = &lines[1];
        let id = header.find("id").expect("id header");
        let email = header.find("email").expect("email header");
        assert!(id < email);
        assert!(lines[2].contains("a@example.com"));
        assert!(!lines.iter().any(|line| line.contains("extra")));
    }

    #[test]
    fn placeholder_without_result() {
        let mut state = TableState::default();
        let lines = render_lines(30, 3, |frame| {
            let area = frame.area();
            render(frame, area, None, &mut state, false);
        });
        assert!(lines[1].contains("No results"));
    }
}
