use dbq_core::models::MetadataRelationship;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use super::panel;

pub const EMPTY_TEXT: &str = "No relationships found.";

#[must_use]
pub fn relationship_label(relationship: &MetadataRelationship) -> String {
    format!(
        "{} ({}) → {} ({})",
        relationship.source_table,
        relationship.source_columns.join(", "),
        relationship.target_table,
        relationship.target_columns.join(", ")
    )
}

#[must_use]
pub fn relationship_lines(relationships: &[MetadataRelationship]) -> Vec<String> {
    relationships.iter().map(relationship_label).collect()
}

pub fn render(frame: &mut Frame<'_>, area: Rect, relationships: &[MetadataRelationship]) {
    let lines: Vec<Line<'_>> = if relationships.is_empty() {
        vec![Line::styled(EMPTY_TEXT, Style::default().fg(Color::DarkGray))]
    } else {
        relationship_lines(relationships)
            .into_iter()
            .map(Line::from)
            .collect()
    };

    let paragraph = Paragraph::new(lines)
        .block(panel("Relationships", false))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use dbq_core::models::MetadataRelationship;

    use super::{relationship_label, relationship_lines, render};
    use crate::components::test_support::render_lines;

    fn orders_to_users() -> MetadataRelationship {
        MetadataRelationship {
            source_table: "orders".to_string(),
            source_columns: vec!["user_id".to_string(), "tenant_id".to_string()],
            target_table: "users".to_string(),
            target_columns: vec!["id".to_string(), "tenant_id".to_string()],
            name: Some("orders_user_fk".to_string()),
        }
    }

    #[test]
    fn label_lists_both_column_sets() {
        assert_eq!(
            relationship_label(&orders_to_users()),
            "orders (user_id, tenant_id) → users (id, tenant_id)"
        );
    }

    #[test]
    fn empty_list_renders_placeholder_and_no_items() {
        assert!(relationship_lines(&[]).is_empty());

        let lines = render_lines(40, 4, |frame| {
            let area = frame.area();
            render(frame, area, &[]);
        });
        assert!(lines[1].contains("No relationships found."));
    }

    #[test]
    fn one_line_per_relationship() {
        let relationships = vec![orders_to_users(), orders_to_users()];
        assert_eq!(relationship_lines(&relationships).len(), 2);
    }
}
