mod app;
pub mod components;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dbq_core::api::DbQueryApi;
use dbq_core::notice::NoticeLevel;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::info;

use crate::app::{map_key_event, Action, ConnectionsFocus, Msg, Tab, TuiApp, WorkspaceFocus};
pub use crate::app::TuiOptions;
use crate::components::{
    centered_rect, connections, error_banner, export_control, history, metadata_tree, nl2sql,
    panel, relationships, results_table, sql_editor,
};

const TICK_RATE: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Takes over the terminal until the user quits.
pub fn run<A: DbQueryApi + Clone>(api: A, options: TuiOptions) -> Result<(), TuiError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let mut app = TuiApp::new(api, options);

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &runtime, &mut app);
    let restore_result = restore_terminal(&mut terminal);

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop<A: DbQueryApi>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    runtime: &Runtime,
    app: &mut TuiApp<A>,
) -> Result<(), TuiError> {
    perform(terminal, runtime, app, Action::Startup)?;
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, app))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = map_key_event(key).and_then(|msg| app.handle(msg)) {
                        perform(terminal, runtime, app, action)?;
                    }
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.handle(Msg::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            info!("quit requested");
            break;
        }
    }

    Ok(())
}

/// Draws a busy frame, then blocks on the action so input stays serialized.
fn perform<B: Backend, A: DbQueryApi>(
    terminal: &mut Terminal<B>,
    runtime: &Runtime,
    app: &mut TuiApp<A>,
    action: Action,
) -> Result<(), TuiError> {
    app.busy = Some(action.busy_label());
    terminal.draw(|frame| render(frame, app))?;
    runtime.block_on(app.perform(action));
    app.busy = None;
    Ok(())
}

fn render<A: DbQueryApi>(frame: &mut Frame<'_>, app: &mut TuiApp<A>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let selected_tab = match app.tab {
        Tab::Connections => 0,
        Tab::Workspace => 1,
    };
    let tabs = Tabs::new(vec![
        format!("F1 {}", Tab::Connections.title()),
        format!("F2 {}", Tab::Workspace.title()),
    ])
    .select(selected_tab)
    .block(Block::default().borders(Borders::ALL).title(" dbq "))
    .highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Connections => render_connections_tab(frame, chunks[1], app),
        Tab::Workspace => render_workspace_tab(frame, chunks[1], app),
    }

    render_status_bar(frame, chunks[2], app);

    if app.show_help {
        render_help_popup(frame);
    }
}

fn render_connections_tab<A: DbQueryApi>(frame: &mut Frame<'_>, area: Rect, app: &mut TuiApp<A>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let state = app.connections.state();
    let editing = state.edit.is_some();

    connections::render_list(
        frame,
        columns[0],
        &state.connections,
        &mut app.connection_table,
        !editing && app.connections_focus == ConnectionsFocus::List,
    );
    connections::render_form(
        frame,
        columns[1],
        "New connection",
        &state.create_form,
        !editing && app.connections_focus == ConnectionsFocus::Form,
        state.submitting,
    );

    if let Some(edit) = &state.edit {
        connections::render_edit_modal(frame, &edit.form, state.submitting);
    }
}

fn render_workspace_tab<A: DbQueryApi>(frame: &mut Frame<'_>, area: Rect, app: &mut TuiApp<A>) {
    let state = app.workspace.state();
    let error = state.error.as_deref();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(error_banner::height(error)), Constraint::Min(6)])
        .split(area);
    error_banner::render(frame, rows[0], error);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(6),
            Constraint::Length(6),
        ])
        .split(columns[0]);

    let focus = app.workspace_focus;
    let items: Vec<ListItem<'_>> = state
        .connections
        .iter()
        .map(|connection| {
            let marker = if state.selected.as_deref() == Some(connection.id.as_str()) {
                "● "
            } else {
                "  "
            };
            ListItem::new(format!(
                "{marker}{} ({})",
                connection.name,
                connection.db_type.label()
            ))
        })
        .collect();
    let picker_focused = focus == WorkspaceFocus::Connections;
    let mut picker_state = ListState::default();
    if picker_focused && !items.is_empty() {
        picker_state.select(Some(app.connection_cursor));
    }
    let picker = List::new(items)
        .block(panel("Connection", picker_focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(picker, sidebar[0], &mut picker_state);

    let tree_view = metadata_tree::MetadataTreeView {
        nodes: &app.tree,
        collapsed: &app.collapsed,
        cursor: app.tree_cursor,
        focused: focus == WorkspaceFocus::Metadata,
        loading: state.metadata_loading,
        refreshed_at: state
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.refreshed_at.as_str()),
    };
    metadata_tree::render(frame, sidebar[1], &tree_view);
    relationships::render(frame, sidebar[2], &state.relationships);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(8),
        ])
        .split(columns[1]);

    nl2sql::render(
        frame,
        main[0],
        &app.prompt,
        state.generating,
        focus == WorkspaceFocus::Prompt,
    );
    sql_editor::render(
        frame,
        main[1],
        &app.editor,
        focus == WorkspaceFocus::Editor,
        state.query_loading,
    );
    export_control::render(frame, main[2], state.export_query_id(), state.export_format);
    results_table::render(
        frame,
        main[3],
        state.result.as_ref(),
        &mut app.results_table,
        focus == WorkspaceFocus::Results,
    );

    let history_view = history::HistoryView {
        items: &state.history,
        width: app.history_width,
        focused: focus == WorkspaceFocus::History,
    };
    history::render(frame, main[4], &history_view, &mut app.history_list);
}

fn render_status_bar<A: DbQueryApi>(frame: &mut Frame<'_>, area: Rect, app: &TuiApp<A>) {
    let line = if let Some(busy) = app.busy {
        Line::from(Span::styled(
            busy,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some((notice, _)) = &app.toast {
        let color = match notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Info => Color::Cyan,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        Line::from(Span::styled(notice.text.as_str(), Style::default().fg(color)))
    } else {
        Line::from(Span::styled(
            "F1/F2 tabs · Tab focus · ? help · Ctrl+Q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_popup(frame: &mut Frame<'_>) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Global"),
        Line::from("  F1 / F2, Ctrl+Left/Right: switch tab"),
        Line::from("  Tab / Shift+Tab: cycle focus"),
        Line::from("  ?: toggle help · q or Ctrl+Q: quit"),
        Line::from("Workspace"),
        Line::from("  F5 or Ctrl+E: run query · Ctrl+R: refresh metadata"),
        Line::from("  Ctrl+S: export · Ctrl+F: export format · Ctrl+L: reload"),
        Line::from("  Enter in prompt: generate SQL · Esc: dismiss error"),
        Line::from("  History: Enter loads SQL · c clears"),
        Line::from("Connections"),
        Line::from("  n: new · e/Enter: edit · t: test · d then y: delete · r: reload"),
        Line::from("  Form: Tab next field · Space type · Enter save · Esc back"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use dbq_core::testing::FakeApi;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::{render, Action, Msg, Tab, TuiApp, TuiOptions};

    fn screen(app: &mut TuiApp<FakeApi>) -> String {
        let mut terminal =
            Terminal::new(TestBackend::new(120, 40)).expect("test terminal should build");
        terminal
            .draw(|frame| render(frame, app))
            .expect("draw should succeed");
        let buffer = terminal.backend().buffer();
        (0..40)
            .map(|y| (0..120).map(|x| buffer[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn workspace_is_the_landing_tab() {
        let mut app = TuiApp::new(FakeApi::default(), TuiOptions::default());
        let screen = screen(&mut app);

        assert!(screen.contains(" dbq "));
        assert!(screen.contains("F2 Workspace"));
        assert!(screen.contains("select 1"));
        assert!(screen.contains("No results"));
        assert!(screen.contains("No history yet"));
        assert!(screen.contains("No relationships found."));
    }

    #[tokio::test]
    async fn failed_load_shows_banner_until_dismissed() {
        let api = FakeApi::default();
        api.fail("list_connections", "backend unreachable");
        let mut app = TuiApp::new(api, TuiOptions::default());
        app.perform(Action::Startup).await;

        let banner = screen(&mut app);
        assert!(banner.contains("backend unreachable"));
        assert!(banner.contains("Esc to dismiss"));
        app.handle(Msg::Escape);
        assert!(!screen(&mut app).contains("Esc to dismiss"));
    }

    #[test]
    fn help_popup_lists_tab_keys() {
        let mut app = TuiApp::new(FakeApi::default(), TuiOptions::default());
        app.handle(Msg::NextFocus);
        app.handle(Msg::Char('?'));
        assert!(screen(&mut app).contains("switch tab"));
    }

    #[test]
    fn connections_tab_shows_form() {
        let mut app = TuiApp::new(FakeApi::default(), TuiOptions::default());
        app.handle(Msg::ShowTab(Tab::Connections));
        let screen = screen(&mut app);
        assert!(screen.contains("New connection"));
        assert!(screen.contains("No connections yet"));
    }
}
