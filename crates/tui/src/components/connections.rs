//! Connections tab: saved connection table, create form and edit modal.

use dbq_core::connections_page::{ConnectionForm, FormField};
use dbq_core::models::{Connection, TestStatus};
use ratatui::layout::{Constraint, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use super::{centered_rect, panel};

#[must_use]
pub fn status_label(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Success => "passed",
        TestStatus::Failed => "failed",
        TestStatus::Unknown => "untested",
    }
}

fn status_style(status: TestStatus) -> Style {
    match status {
        TestStatus::Success => Style::default().fg(Color::Green),
        TestStatus::Failed => Style::default().fg(Color::Red),
        TestStatus::Unknown => Style::default().fg(Color::DarkGray),
    }
}

pub fn render_list(
    frame: &mut Frame<'_>,
    area: Rect,
    connections: &[Connection],
    state: &mut TableState,
    focused: bool,
) {
    let block = panel("Connections", focused);
    if connections.is_empty() {
        let placeholder = Paragraph::new("No connections yet. Fill in the form to add one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let header = Row::new(["Name", "Type", "Status", "Last used"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = connections.iter().map(|connection| {
        Row::new(vec![
            Cell::from(connection.name.as_str()),
            Cell::from(connection.db_type.label()),
            Cell::from(status_label(connection.last_test_status))
                .style(status_style(connection.last_test_status)),
            Cell::from(connection.last_used_at.as_deref().unwrap_or("-")),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Fill(2),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Fill(2),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(table, area, state);
}

fn form_lines(form: &ConnectionForm, focused: bool) -> Vec<Line<'_>> {
    let fields = [
        (FormField::Name, form.name.clone()),
        (
            FormField::DbType,
            form.db_type
                .map_or_else(|| "(Space to choose)".to_string(), |db| db.label().to_string()),
        ),
        (FormField::ConnectionUrl, form.connection_url.clone()),
    ];

    fields
        .into_iter()
        .map(|(field, value)| {
            let active = focused && field == form.active_field;
            let marker = if active { "> " } else { "  " };
            let label_style = if active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<16}", field.label()), label_style),
                Span::raw(value),
            ])
        })
        .collect()
}

/// Screen position of the text cursor when the active field is a text field.
fn form_cursor(form: &ConnectionForm, inner: Rect) -> Option<Position> {
    let (row, text) = match form.active_field {
        FormField::Name => (0, &form.name),
        FormField::ConnectionUrl => (2, &form.connection_url),
        FormField::DbType => return None,
    };
    let offset = u16::try_from(2 + 16 + text.chars().count()).unwrap_or(u16::MAX);
    let x = inner.x.saturating_add(offset).min(inner.right().saturating_sub(1));
    Some(Position::new(x, inner.y + row))
}

pub fn render_form(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    form: &ConnectionForm,
    focused: bool,
    submitting: bool,
) {
    let title = if submitting {
        format!("{title} (saving...)")
    } else {
        title.to_string()
    };
    let block = panel(&title, focused);
    let inner = block.inner(area);

    let mut lines = form_lines(form, focused);
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Tab next field · Space type · Enter save",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if focused {
        if let Some(position) = form_cursor(form, inner) {
            frame.set_cursor_position(position);
        }
    }
}

/// Edit modal drawn over the page. The URL is blank and only sent when typed.
pub fn render_edit_modal(frame: &mut Frame<'_>, form: &ConnectionForm, submitting: bool) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);
    render_form(
        frame,
        area,
        "Edit connection (Esc to cancel)",
        form,
        true,
        submitting,
    );
}

#[cfg(test)]
mod tests {
    use dbq_core::connections_page::{ConnectionForm, FormField};
    use dbq_core::models::{Connection, DbType, TestStatus};
    use ratatui::widgets::TableState;

    use super::{render_edit_modal, render_form, render_list, status_label};
    use crate::components::test_support::render_lines;

    fn connection(name: &str, db_type: DbType, status: TestStatus) -> Connection {
        Connection {
            id: format!("id-{name}"),
            name: name.to_string(),
            db_type,
            created_at: "2026-01-01T00:00:00".to_string(),
            last_used_at: None,
            last_test_status: status,
        }
    }

    #[test]
    fn status_tags() {
        assert_eq!(status_label(TestStatus::Success), "passed");
        assert_eq!(status_label(TestStatus::Failed), "failed");
        assert_eq!(status_label(TestStatus::Unknown), "untested");
    }

    #[test]
    fn list_shows_type_labels_and_status() {
        let connections = vec![
            connection("primary", DbType::Postgres, TestStatus::Success),
            connection("legacy", DbType::Mariadb, TestStatus::Unknown),
        ];
        let mut state = TableState::default();
        let lines = render_lines(70, 6, |frame| {
            let area = frame.area();
            render_list(frame, area, &connections, &mut state, true);
        });

        assert!(lines[2].contains("primary"));
        assert!(lines[2].contains("PostgreSQL"));
        assert!(lines[2].contains("passed"));
        assert!(lines[3].contains("MariaDB"));
        assert!(lines[3].contains("untested"));
    }

    #[test]
    fn form_marks_the_active_field() {
        let form = ConnectionForm {
            name: "analytics".to_string(),
            db_type: Some(DbType::Mariadb),
            connection_url: String::new(),
            active_field: FormField::DbType,
        };
        let lines = render_lines(60, 7, |frame| {
            let area = frame.area();
            render_form(frame, area, "New connection", &form, true, false);
        });

        assert!(lines[1].contains("analytics"));
        assert!(lines[2].contains("> Database type"));
        assert!(lines[2].contains("MariaDB"));
    }

    #[test]
    fn edit_modal_has_its_own_title() {
        let form = ConnectionForm::default();
        let lines = render_lines(100, 30, |frame| {
            render_edit_modal(frame, &form, false);
        });
        assert!(lines.iter().any(|line| line.contains("Edit connection")));
    }

    #[test]
    fn edit_modal_shows_saving_state() {
        let form = ConnectionForm::default();
        let lines = render_lines(100, 30, |frame| {
            render_edit_modal(frame, &form, true);
        });
        assert!(lines.iter().any(|line| line.contains("(saving...)")));
    }
}
