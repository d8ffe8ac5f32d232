use std::collections::HashSet;

use dbq_core::models::{MetadataColumn, MetadataSchema};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::panel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub key: String,
    pub label: String,
    pub detail: Option<String>,
    pub children: Vec<TreeNode>,
}

/// Schemas → tables, then views → columns.
#[must_use]
pub fn build_tree(schemas: &[MetadataSchema]) -> Vec<TreeNode> {
    schemas
        .iter()
        .map(|schema| {
            let tables = schema.tables.iter().map(|table| {
                let key = format!("{}.table.{}", schema.name, table.name);
                TreeNode {
                    children: column_nodes(&key, &table.columns),
                    label: format!("Table: {}", table.name),
                    detail: table.comment.clone(),
                    key,
                }
            });
            let views = schema.views.iter().map(|view| {
                let key = format!("{}.view.{}", schema.name, view.name);
                TreeNode {
                    children: column_nodes(&key, &view.columns),
                    label: format!("View: {}", view.name),
                    detail: view.comment.clone(),
                    key,
                }
            });

            TreeNode {
                key: schema.name.clone(),
                label: schema.name.clone(),
                detail: None,
                children: tables.chain(views).collect(),
            }
        })
        .collect()
}

fn column_nodes(parent_key: &str, columns: &[MetadataColumn]) -> Vec<TreeNode> {
    columns
        .iter()
        .map(|column| {
            let mut detail = column.data_type.clone();
            if !column.is_nullable {
                detail.push_str(" not null");
            }
            if let Some(default) = &column.default_value {
                detail.push_str(&format!(" default {default}"));
            }
            TreeNode {
                key: format!("{parent_key}.{}", column.name),
                label: column.name.clone(),
                detail: Some(detail),
                children: Vec::new(),
            }
        })
        .collect()
}

/// A node as it appears on screen, with its nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleNode<'a> {
    pub depth: usize,
    pub node: &'a TreeNode,
}

/// Depth-first listing; children of collapsed keys are skipped.
#[must_use]
pub fn visible_nodes<'a>(nodes: &'a [TreeNode], collapsed: &HashSet<String>) -> Vec<VisibleNode<'a>> {
    fn walk<'a>(
        nodes: &'a [TreeNode],
        depth: usize,
        collapsed: &HashSet<String>,
        out: &mut Vec<VisibleNode<'a>>,
    ) {
        for node in nodes {
            out.push(VisibleNode { depth, node });
            if !collapsed.contains(&node.key) {
                walk(&node.children, depth + 1, collapsed, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(nodes, 0, collapsed, &mut out);
    out
}

pub struct MetadataTreeView<'a> {
    pub nodes: &'a [TreeNode],
    pub collapsed: &'a HashSet<String>,
    pub cursor: usize,
    pub focused: bool,
    pub loading: bool,
    pub refreshed_at: Option<&'a str>,
}

pub fn render(frame: &mut Frame<'_>, area: Rect, view: &MetadataTreeView<'_>) {
    let title = match (view.loading, view.refreshed_at) {
        (true, _) => "Metadata (refreshing...)".to_string(),
        (false, Some(refreshed_at)) => format!("Metadata · {refreshed_at}"),
        (false, None) => "Metadata".to_string(),
    };

    let visible = visible_nodes(view.nodes, view.collapsed);
    let height = usize::from(area.height.saturating_sub(2)).max(1);
    let start = view.cursor.saturating_sub(height.saturating_sub(1));

    let lines: Vec<Line<'_>> = if visible.is_empty() {
        vec![Line::from(Span::styled(
            "No metadata loaded. Press Ctrl+R to refresh.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible
            .iter()
            .enumerate()
            .skip(start)
            .take(height)
            .map(|(index, entry)| tree_line(entry, view, index == view.cursor))
            .collect()
    };

    let block = panel(&title, view.focused);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn tree_line<'a>(entry: &VisibleNode<'a>, view: &MetadataTreeView<'_>, at_cursor: bool) -> Line<'a> {
    let marker = if entry.node.children.is_empty() {
        "  "
    } else if view.collapsed.contains(&entry.node.key) {
        "▸ "
    } else {
        "▾ "
    };
    let label_style = if at_cursor && view.focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else if entry.depth == 0 {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw("  ".repeat(entry.depth)),
        Span::raw(marker),
        Span::styled(entry.node.label.as_str(), label_style),
    ];
    if let Some(detail) = &entry.node.detail {
        spans.push(Span::styled(
            format!("  {detail}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}
