//! Shell state: which tab and panel has focus, what a key means there, and
//! which page action it triggers.
//!
//! `handle` is synchronous and never touches the network; anything that
//! needs the backend comes back as an [`Action`] that the event loop awaits
//! through `perform`.

use std::collections::{HashSet, VecDeque};
use std::fmt::Display;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dbq_core::api::DbQueryApi;
use dbq_core::connections_page::{ConnectionForm, ConnectionsPage, FormField};
use dbq_core::models::Connection;
use dbq_core::notice::{Notice, NoticeLevel};
use dbq_core::workspace::{QueryLimits, WorkspacePage, NO_RESULTS_TO_EXPORT};
use ratatui::widgets::{ListState, TableState};
use tracing::debug;

use crate::components::metadata_tree::{build_tree, visible_nodes, TreeNode};
use crate::components::sql_editor::EditorBuffer;
use crate::components::{export_control, nl2sql};

pub(crate) const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Connections,
    Workspace,
}

impl Tab {
    pub(crate) fn title(self) -> &'static str {
        match self {
            Self::Connections => "Connections",
            Self::Workspace => "Workspace",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Connections => Self::Workspace,
            Self::Workspace => Self::Connections,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionsFocus {
    List,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceFocus {
    Connections,
    Metadata,
    Prompt,
    Editor,
    Results,
    History,
}

impl WorkspaceFocus {
    fn next(self) -> Self {
        match self {
            Self::Connections => Self::Metadata,
            Self::Metadata => Self::Prompt,
            Self::Prompt => Self::Editor,
            Self::Editor => Self::Results,
            Self::Results => Self::History,
            Self::History => Self::Connections,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Connections => Self::History,
            Self::Metadata => Self::Connections,
            Self::Prompt => Self::Metadata,
            Self::Editor => Self::Prompt,
            Self::Results => Self::Editor,
            Self::History => Self::Results,
        }
    }

    fn takes_text(self) -> bool {
        matches!(self, Self::Prompt | Self::Editor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    Quit,
    ShowTab(Tab),
    SwitchTab,
    NextFocus,
    PreviousFocus,
    Execute,
    RefreshMetadata,
    Export,
    ToggleExportFormat,
    Reload,
    Escape,
    Enter,
    Backspace,
    Delete,
    Navigate(DirectionKey),
    Char(char),
    Tick,
}

/// Backend work requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Startup,
    LoadConnections,
    CreateConnection,
    TestConnection(String),
    SubmitEdit,
    DeleteConnection(String),
    ReloadWorkspace,
    SelectConnection(String),
    ExecuteQuery,
    RefreshMetadata,
    ClearHistory,
    GenerateSql,
    ExportResults,
}

impl Action {
    pub(crate) fn busy_label(&self) -> &'static str {
        match self {
            Self::Startup | Self::LoadConnections | Self::ReloadWorkspace => {
                "Loading connections..."
            }
            Self::CreateConnection | Self::SubmitEdit => "Saving connection...",
            Self::TestConnection(_) => "Testing connection...",
            Self::DeleteConnection(_) => "Deleting connection...",
            Self::SelectConnection(_) => "Loading history...",
            Self::ExecuteQuery => "Running query...",
            Self::RefreshMetadata => "Refreshing metadata...",
            Self::ClearHistory => "Clearing history...",
            Self::GenerateSql => "Generating SQL...",
            Self::ExportResults => "Exporting...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub limits: QueryLimits,
    pub history_width: usize,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            limits: QueryLimits::default(),
            history_width: 80,
        }
    }
}

#[derive(Debug)]
pub struct TuiApp<A: DbQueryApi> {
    pub(crate) tab: Tab,
    pub(crate) connections: ConnectionsPage<A>,
    pub(crate) workspace: WorkspacePage<A>,
    pub(crate) connections_focus: ConnectionsFocus,
    pub(crate) workspace_focus: WorkspaceFocus,
    pub(crate) connection_table: TableState,
    pub(crate) pending_delete: Option<String>,
    pub(crate) connection_cursor: usize,
    pub(crate) editor: EditorBuffer,
    pub(crate) prompt: String,
    pub(crate) tree: Vec<TreeNode>,
    pub(crate) collapsed: HashSet<String>,
    pub(crate) tree_cursor: usize,
    pub(crate) results_table: TableState,
    pub(crate) history_list: ListState,
    pub(crate) history_width: usize,
    pub(crate) show_help: bool,
    pub(crate) should_quit: bool,
    pub(crate) toast: Option<(Notice, Instant)>,
    /// Notices raised by the same action, shown one after another.
    pub(crate) queued_notices: VecDeque<Notice>,
    pub(crate) busy: Option<&'static str>,
}

impl<A: DbQueryApi + Clone> TuiApp<A> {
    pub fn new(api: A, options: TuiOptions) -> Self {
        let workspace = WorkspacePage::with_limits(api.clone(), options.limits);
        let editor = EditorBuffer::new(&workspace.state().sql);
        Self {
            tab: Tab::Workspace,
            connections: ConnectionsPage::new(api),
            workspace,
            connections_focus: ConnectionsFocus::List,
            workspace_focus: WorkspaceFocus::Editor,
            connection_table: TableState::default(),
            pending_delete: None,
            connection_cursor: 0,
            editor,
            prompt: String::new(),
            tree: Vec::new(),
            collapsed: HashSet::new(),
            tree_cursor: 0,
            results_table: TableState::default(),
            history_list: ListState::default(),
            history_width: options.history_width,
            show_help: false,
            should_quit: false,
            toast: None,
            queued_notices: VecDeque::new(),
            busy: None,
        }
    }
}

impl<A: DbQueryApi> TuiApp<A> {
    pub fn handle(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Quit => {
                self.should_quit = true;
                return None;
            }
            Msg::Tick => {
                self.expire_toast();
                return None;
            }
            Msg::ShowTab(tab) => return self.switch_tab(tab),
            Msg::SwitchTab => return self.switch_tab(self.tab.toggled()),
            _ => {}
        }

        if self.show_help {
            if matches!(msg, Msg::Escape | Msg::Char('?')) {
                self.show_help = false;
            }
            return None;
        }

        if !self.takes_text() {
            match msg {
                Msg::Char('q') => {
                    self.should_quit = true;
                    return None;
                }
                Msg::Char('?') => {
                    self.show_help = true;
                    return None;
                }
                _ => {}
            }
        }

        match self.tab {
            Tab::Connections => self.handle_connections(msg),
            Tab::Workspace => self.handle_workspace(msg),
        }
    }

    /// Runs one backend action to completion, then resyncs view state and
    /// picks up whatever notices the pages raised.
    pub async fn perform(&mut self, action: Action) {
        debug!(?action, "performing action");
        match action {
            Action::Startup => {
                log_outcome("load connections", self.connections.load().await);
                log_outcome("mount workspace", self.workspace.mount().await);
            }
            Action::LoadConnections => {
                log_outcome("load connections", self.connections.load().await);
            }
            Action::CreateConnection => {
                log_outcome("create connection", self.connections.create().await);
            }
            Action::TestConnection(id) => {
                log_outcome("test connection", self.connections.test(&id).await);
            }
            Action::SubmitEdit => {
                log_outcome("update connection", self.connections.submit_edit().await);
            }
            Action::DeleteConnection(id) => {
                log_outcome("delete connection", self.connections.delete(&id).await);
            }
            Action::ReloadWorkspace => {
                log_outcome(
                    "reload connections",
                    self.workspace.reload_connections().await,
                );
            }
            Action::SelectConnection(id) => self.workspace.select_connection(&id).await,
            Action::ExecuteQuery => {
                log_outcome("execute query", self.workspace.execute_query().await);
            }
            Action::RefreshMetadata => {
                log_outcome("refresh metadata", self.workspace.refresh_metadata().await);
            }
            Action::ClearHistory => {
                log_outcome("clear history", self.workspace.clear_history().await);
            }
            Action::GenerateSql => {
                let prompt = self.prompt.clone();
                log_outcome("generate sql", self.workspace.generate_sql(&prompt).await);
            }
            Action::ExportResults => {
                log_outcome("export results", self.workspace.export_results().await);
            }
        }
        self.sync_views();
    }

    fn takes_text(&self) -> bool {
        match self.tab {
            Tab::Connections => {
                self.connections.state().edit.is_some()
                    || self.connections_focus == ConnectionsFocus::Form
            }
            Tab::Workspace => self.workspace_focus.takes_text(),
        }
    }

    fn switch_tab(&mut self, tab: Tab) -> Option<Action> {
        if tab == self.tab {
            return None;
        }
        self.tab = tab;
        self.pending_delete = None;
        // Connections may have changed on the other tab.
        (tab == Tab::Workspace).then_some(Action::ReloadWorkspace)
    }

    fn handle_connections(&mut self, msg: Msg) -> Option<Action> {
        if self.connections.state().edit.is_some() {
            return self.handle_edit_modal(msg);
        }

        if let Some(connection_id) = self.pending_delete.take() {
            if msg == Msg::Char('y') {
                return Some(Action::DeleteConnection(connection_id));
            }
            self.show_notice(NoticeLevel::Info, "Delete cancelled");
            return None;
        }

        match self.connections_focus {
            ConnectionsFocus::List => self.handle_connection_list(msg),
            ConnectionsFocus::Form => self.handle_create_form(msg),
        }
    }

    fn handle_connection_list(&mut self, msg: Msg) -> Option<Action> {
        let selected_id = self.selected_connection_row().map(|c| c.id.clone());
        match msg {
            Msg::NextFocus | Msg::PreviousFocus | Msg::Char('n') => {
                self.connections_focus = ConnectionsFocus::Form;
                None
            }
            Msg::Navigate(DirectionKey::Up) => {
                self.move_connection_row(-1);
                None
            }
            Msg::Navigate(DirectionKey::Down) => {
                self.move_connection_row(1);
                None
            }
            Msg::Reload | Msg::Char('r') => Some(Action::LoadConnections),
            Msg::Char('t') => selected_id.map(Action::TestConnection),
            Msg::Char('e') | Msg::Enter => {
                if let Some(id) = selected_id {
                    self.connections.open_edit(&id);
                }
                None
            }
            Msg::Char('d') => {
                let (id, name) = self
                    .selected_connection_row()
                    .map(|connection| (connection.id.clone(), connection.name.clone()))?;
                self.pending_delete = Some(id);
                self.show_notice(
                    NoticeLevel::Warning,
                    format!("Delete {name}? Press y to confirm"),
                );
                None
            }
            _ => None,
        }
    }

    fn handle_create_form(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Escape => {
                self.connections_focus = ConnectionsFocus::List;
                None
            }
            Msg::NextFocus if self.connections.state().create_form.active_field
                == FormField::ConnectionUrl =>
            {
                self.connections.create_form_mut().active_field = FormField::Name;
                self.connections_focus = ConnectionsFocus::List;
                None
            }
            Msg::Enter => Some(Action::CreateConnection),
            Msg::Reload => Some(Action::LoadConnections),
            _ => {
                edit_form(self.connections.create_form_mut(), msg);
                None
            }
        }
    }

    fn handle_edit_modal(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Escape => {
                self.connections.close_edit();
                None
            }
            Msg::Enter => Some(Action::SubmitEdit),
            _ => {
                if let Some(form) = self.connections.edit_form_mut() {
                    edit_form(form, msg);
                }
                None
            }
        }
    }

    fn handle_workspace(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Execute => return Some(Action::ExecuteQuery),
            Msg::RefreshMetadata => return Some(Action::RefreshMetadata),
            Msg::Reload => return Some(Action::ReloadWorkspace),
            Msg::ToggleExportFormat => {
                self.workspace.toggle_export_format();
                return None;
            }
            Msg::Export => {
                if export_control::is_enabled(self.workspace.state().export_query_id()) {
                    return Some(Action::ExportResults);
                }
                self.show_notice(NoticeLevel::Warning, NO_RESULTS_TO_EXPORT);
                return None;
            }
            Msg::NextFocus => {
                self.workspace_focus = self.workspace_focus.next();
                return None;
            }
            Msg::PreviousFocus => {
                self.workspace_focus = self.workspace_focus.previous();
                return None;
            }
            Msg::Escape if self.workspace.state().error.is_some() => {
                self.workspace.dismiss_error();
                return None;
            }
            _ => {}
        }

        match self.workspace_focus {
            WorkspaceFocus::Connections => self.handle_connection_picker(msg),
            WorkspaceFocus::Metadata => {
                self.handle_metadata(msg);
                None
            }
            WorkspaceFocus::Prompt => self.handle_prompt(msg),
            WorkspaceFocus::Editor => {
                self.handle_editor(msg);
                None
            }
            WorkspaceFocus::Results => {
                match msg {
                    Msg::Navigate(DirectionKey::Up) => self.results_table.select_previous(),
                    Msg::Navigate(DirectionKey::Down) => self.results_table.select_next(),
                    _ => {}
                }
                None
            }
            WorkspaceFocus::History => self.handle_history(msg),
        }
    }

    fn handle_connection_picker(&mut self, msg: Msg) -> Option<Action> {
        let count = self.workspace.state().connections.len();
        match msg {
            Msg::Navigate(DirectionKey::Up) => {
                self.connection_cursor = self.connection_cursor.saturating_sub(1);
                None
            }
            Msg::Navigate(DirectionKey::Down) => {
                if self.connection_cursor + 1 < count {
                    self.connection_cursor += 1;
                }
                None
            }
            Msg::Enter | Msg::Char(' ') => self
                .workspace
                .state()
                .connections
                .get(self.connection_cursor)
                .map(|connection| Action::SelectConnection(connection.id.clone())),
            _ => None,
        }
    }

    fn handle_metadata(&mut self, msg: Msg) {
        let visible = visible_nodes(&self.tree, &self.collapsed);
        match msg {
            Msg::Navigate(DirectionKey::Up) => {
                self.tree_cursor = self.tree_cursor.saturating_sub(1);
            }
            Msg::Navigate(DirectionKey::Down) => {
                if self.tree_cursor + 1 < visible.len() {
                    self.tree_cursor += 1;
                }
            }
            Msg::Enter | Msg::Char(' ') | Msg::Navigate(DirectionKey::Left | DirectionKey::Right) => {
                let Some(entry) = visible.get(self.tree_cursor) else {
                    return;
                };
                if entry.node.children.is_empty() {
                    return;
                }
                let key = entry.node.key.clone();
                let collapse = match msg {
                    Msg::Navigate(DirectionKey::Left) => true,
                    Msg::Navigate(DirectionKey::Right) => false,
                    _ => !self.collapsed.contains(&key),
                };
                if collapse {
                    self.collapsed.insert(key);
                } else {
                    self.collapsed.remove(&key);
                }
            }
            _ => {}
        }
    }

    fn handle_prompt(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Char(ch) => self.prompt.push(ch),
            Msg::Backspace => {
                self.prompt.pop();
            }
            Msg::Enter => {
                let generating = self.workspace.state().generating;
                return nl2sql::can_generate(&self.prompt, generating)
                    .then_some(Action::GenerateSql);
            }
            _ => {}
        }
        None
    }

    fn handle_editor(&mut self, msg: Msg) {
        match msg {
            Msg::Char(ch) => self.editor.insert(ch),
            Msg::Enter => self.editor.newline(),
            Msg::Backspace => self.editor.backspace(),
            Msg::Delete => self.editor.delete(),
            Msg::Navigate(direction) => match direction {
                DirectionKey::Up => self.editor.up(),
                DirectionKey::Down => self.editor.down(),
                DirectionKey::Left => self.editor.left(),
                DirectionKey::Right => self.editor.right(),
                DirectionKey::Home => self.editor.home(),
                DirectionKey::End => self.editor.end(),
            },
            _ => return,
        }
        self.workspace.set_sql(self.editor.text());
    }

    fn handle_history(&mut self, msg: Msg) -> Option<Action> {
        match msg {
            Msg::Navigate(DirectionKey::Up) => self.history_list.select_previous(),
            Msg::Navigate(DirectionKey::Down) => self.history_list.select_next(),
            Msg::Enter => {
                let item = self
                    .history_list
                    .selected()
                    .and_then(|index| self.workspace.state().history.get(index))
                    .cloned();
                if let Some(item) = item {
                    self.workspace.rerun_history(&item);
                    self.sync_views();
                    self.workspace_focus = WorkspaceFocus::Editor;
                }
            }
            Msg::Char('c') => return Some(Action::ClearHistory),
            _ => {}
        }
        None
    }

    fn selected_connection_row(&self) -> Option<&Connection> {
        self.connection_table
            .selected()
            .and_then(|index| self.connections.state().connections.get(index))
    }

    fn move_connection_row(&mut self, delta: isize) {
        let count = self.connections.state().connections.len();
        if count == 0 {
            self.connection_table.select(None);
            return;
        }
        let current = self.connection_table.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(count - 1);
        self.connection_table.select(Some(next));
    }

    /// Brings cursors, the editor and the tree in line with page state.
    fn sync_views(&mut self) {
        let state = self.workspace.state();
        if self.editor.text() != state.sql {
            self.editor.set_text(&state.sql);
        }
        self.tree = build_tree(&state.schemas);
        let visible = visible_nodes(&self.tree, &self.collapsed).len();
        self.tree_cursor = self.tree_cursor.min(visible.saturating_sub(1));

        if let Some(selected) = &state.selected {
            if let Some(index) = state.connections.iter().position(|c| &c.id == selected) {
                self.connection_cursor = index;
            }
        }
        self.connection_cursor = self
            .connection_cursor
            .min(state.connections.len().saturating_sub(1));

        let history = state.history.len();
        clamp_selection(&mut self.history_list, history);
        let rows = state.result.as_ref().map_or(0, |result| result.rows.len());
        if self.results_table.selected().is_some_and(|index| index >= rows) {
            self.results_table.select(None);
        }

        let connections = self.connections.state().connections.len();
        if connections == 0 {
            self.connection_table.select(None);
        } else if self
            .connection_table
            .selected()
            .map_or(true, |index| index >= connections)
        {
            self.connection_table.select(Some(0));
        }

        let mut notices = VecDeque::from(self.connections.notices_mut().drain());
        notices.extend(self.workspace.notices_mut().drain());
        if let Some(first) = notices.pop_front() {
            self.toast = Some((first, Instant::now()));
            self.queued_notices = notices;
        }
    }

    fn show_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.toast = Some((Notice::new(level, text), Instant::now()));
    }

    fn expire_toast(&mut self) {
        if self
            .toast
            .as_ref()
            .is_some_and(|(_, shown_at)| shown_at.elapsed() >= NOTICE_TTL)
        {
            self.toast = self
                .queued_notices
                .pop_front()
                .map(|notice| (notice, Instant::now()));
        }
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        Some(_) if len == 0 => state.select(None),
        Some(index) if index >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

/// Applies a key to the active field of a connection form.
fn edit_form(form: &mut ConnectionForm, msg: Msg) {
    match msg {
        Msg::NextFocus | Msg::Navigate(DirectionKey::Down) => {
            form.active_field = form.active_field.next();
        }
        Msg::PreviousFocus | Msg::Navigate(DirectionKey::Up) => {
            form.active_field = form.active_field.previous();
        }
        Msg::Char(' ') | Msg::Navigate(DirectionKey::Left | DirectionKey::Right)
            if form.active_field == FormField::DbType =>
        {
            form.cycle_db_type();
        }
        Msg::Char(ch) => {
            if let Some(text) = form.active_text_mut() {
                text.push(ch);
            }
        }
        Msg::Backspace => {
            if let Some(text) = form.active_text_mut() {
                text.pop();
            }
        }
        _ => {}
    }
}

fn log_outcome<E: Display>(action: &str, outcome: Result<(), E>) {
    if let Err(error) = outcome {
        debug!(action, %error, "action finished with error");
    }
}

pub(crate) fn map_key_event(key: KeyEvent) -> Option<Msg> {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q' | 'c') if control => Some(Msg::Quit),
        KeyCode::Char('e') if control => Some(Msg::Execute),
        KeyCode::Char('r') if control => Some(Msg::RefreshMetadata),
        KeyCode::Char('s') if control => Some(Msg::Export),
        KeyCode::Char('f') if control => Some(Msg::ToggleExportFormat),
        KeyCode::Char('l') if control => Some(Msg::Reload),
        KeyCode::Left | KeyCode::Right if control => Some(Msg::SwitchTab),
        KeyCode::Char(_) if control => None,
        KeyCode::F(1) => Some(Msg::ShowTab(Tab::Connections)),
        KeyCode::F(2) => Some(Msg::ShowTab(Tab::Workspace)),
        KeyCode::F(5) => Some(Msg::Execute),
        KeyCode::Tab => Some(Msg::NextFocus),
        KeyCode::BackTab => Some(Msg::PreviousFocus),
        KeyCode::Esc => Some(Msg::Escape),
        KeyCode::Enter => Some(Msg::Enter),
        KeyCode::Backspace => Some(Msg::Backspace),
        KeyCode::Delete => Some(Msg::Delete),
        KeyCode::Up => Some(Msg::Navigate(DirectionKey::Up)),
        KeyCode::Down => Some(Msg::Navigate(DirectionKey::Down)),
        KeyCode::Left => Some(Msg::Navigate(DirectionKey::Left)),
        KeyCode::Right => Some(Msg::Navigate(DirectionKey::Right)),
        KeyCode::Home => Some(Msg::Navigate(DirectionKey::Home)),
        KeyCode::End => Some(Msg::Navigate(DirectionKey::End)),
        KeyCode::Char(ch) => Some(Msg::Char(ch)),
        _ => None,
    }
}
