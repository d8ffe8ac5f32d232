//! Query workspace: connection selection, query execution with history,
//! metadata refresh, SQL generation and export.
//!
//! Every guarded action checks for a selected connection before its first
//! await, so no request is ever issued without a connection id. Calls inside
//! one action are issued and awaited in sequence.

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, DbQueryApi};
use crate::models::{
    Connection, ExportFormat, ExportRequest, HistoryCreate, HistoryItem, MetadataRelationship,
    MetadataSchema, QueryRequest, QueryResult, SnapshotStatus, SqlGenerationRequest,
};
use crate::notice::Notices;

pub const DEFAULT_SQL: &str = "select 1";
pub const SELECT_CONNECTION_FIRST: &str = "Select a connection first";
pub const NO_RESULTS_TO_EXPORT: &str = "No query results to export";
pub const HISTORY_CLEARED: &str = "History cleared";
const EMPTY_PROMPT: &str = "Describe the query you want first";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Select a connection first")]
    NoConnection,
    #[error("No query results to export")]
    NoResult,
    #[error("Describe the query you want first")]
    EmptyPrompt,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Identity of the metadata snapshot currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub snapshot_id: String,
    pub status: SnapshotStatus,
    pub refreshed_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceState {
    pub connections: Vec<Connection>,
    pub selected: Option<String>,
    pub sql: String,
    pub result: Option<QueryResult>,
    pub schemas: Vec<MetadataSchema>,
    pub relationships: Vec<MetadataRelationship>,
    pub snapshot: Option<SnapshotInfo>,
    pub query_loading: bool,
    pub metadata_loading: bool,
    pub generating: bool,
    /// Banner message; cleared by `dismiss_error` or the next guarded action.
    pub error: Option<String>,
    pub history: Vec<HistoryItem>,
    pub export_format: ExportFormat,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
            selected: None,
            sql: DEFAULT_SQL.to_string(),
            result: None,
            schemas: Vec::new(),
            relationships: Vec::new(),
            snapshot: None,
            query_loading: false,
            metadata_loading: false,
            generating: false,
            error: None,
            history: Vec::new(),
            export_format: ExportFormat::Csv,
        }
    }
}

impl WorkspaceState {
    #[must_use]
    pub fn selected_connection(&self) -> Option<&Connection> {
        let selected = self.selected.as_deref()?;
        self.connections
            .iter()
            .find(|connection| connection.id == selected)
    }

    /// Identifier an export would be keyed on, if a query has run.
    #[must_use]
    pub fn export_query_id(&self) -> Option<&str> {
        self.result.as_ref().map(|result| result.request_id.as_str())
    }
}

/// Optional limits forwarded with every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryLimits {
    pub timeout_seconds: Option<u32>,
    pub max_rows: Option<u32>,
}

#[derive(Debug)]
pub struct WorkspacePage<A: DbQueryApi> {
    api: A,
    limits: QueryLimits,
    state: WorkspaceState,
    notices: Notices,
}

impl<A: DbQueryApi> WorkspacePage<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_limits(api, QueryLimits::default())
    }

    #[must_use]
    pub fn with_limits(api: A, limits: QueryLimits) -> Self {
        Self {
            api,
            limits,
            state: WorkspaceState::default(),
            notices: Notices::default(),
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    #[must_use]
    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.state.sql = sql.into();
    }

    /// Initial load: connections, auto-selection of the first one, and its
    /// history.
    pub async fn mount(&mut self) -> Result<(), WorkspaceError> {
        self.reload_connections().await
    }

    /// Reloads the connection list. Selects the first connection only when
    /// nothing is selected yet.
    pub async fn reload_connections(&mut self) -> Result<(), WorkspaceError> {
        let list = match self.api.list_connections().await {
            Ok(list) => list,
            Err(error) => return Err(self.fail(error)),
        };
        self.state.connections = list.items;

        if self.state.selected.is_none() {
            if let Some(first) = self.state.connections.first() {
                let first = first.id.clone();
                self.select_connection(&first).await;
            }
        }
        Ok(())
    }

    /// Changes the selection; history is reloaded whenever the id changes.
    pub async fn select_connection(&mut self, connection_id: &str) {
        if self.state.selected.as_deref() == Some(connection_id) {
            return;
        }
        debug!(connection_id, "selected connection");
        self.state.selected = Some(connection_id.to_string());
        self.load_history().await;
    }

    /// History is advisory: failures are logged and otherwise ignored.
    pub async fn load_history(&mut self) {
        let Some(selected) = self.state.selected.clone() else {
            return;
        };
        match self.api.list_history(&selected).await {
            Ok(list) => self.state.history = list.items,
            Err(error) => debug!(%error, connection_id = %selected, "history load failed"),
        }
    }

    pub async fn execute_query(&mut self) -> Result<(), WorkspaceError> {
        let selected = self.require_selection()?;

        self.state.error = None;
        self.state.query_loading = true;
        let outcome = self.run_query_with_history(&selected).await;
        self.state.query_loading = false;

        outcome.map_err(|error| self.fail(error))
    }

    async fn run_query_with_history(&mut self, selected: &str) -> Result<(), ApiError> {
        let request = QueryRequest {
            sql_text: self.state.sql.clone(),
            timeout_seconds: self.limits.timeout_seconds,
            max_rows: self.limits.max_rows,
        };
        let result = self.api.execute_query(selected, &request).await?;
        debug!(
            request_id = %result.request_id,
            rows = result.rows.len(),
            duration_ms = result.duration_ms,
            "query executed"
        );
        self.state.result = Some(result);

        let Some(connection_name) = self
            .state
            .selected_connection()
            .map(|connection| connection.name.clone())
        else {
            return Ok(());
        };

        let entry = HistoryCreate {
            connection_id: selected.to_string(),
            connection_name,
            sql_text: request.sql_text,
        };
        self.api.add_history(selected, &entry).await?;
        self.load_history().await;
        Ok(())
    }

    /// Refreshes then re-reads the snapshot. Schemas are replaced only once
    /// both calls succeed.
    pub async fn refresh_metadata(&mut self) -> Result<(), WorkspaceError> {
        let selected = self.require_selection()?;

        self.state.error = None;
        self.state.metadata_loading = true;
        let outcome = match self.api.refresh_metadata(&selected).await {
            Ok(_) => self.api.get_metadata(&selected).await,
            Err(error) => Err(error),
        };
        self.state.metadata_loading = false;

        let snapshot = outcome.map_err(|error| self.fail(error))?;
        debug!(
            snapshot_id = %snapshot.snapshot_id,
            schemas = snapshot.schemas.len(),
            "metadata refreshed"
        );
        self.state.snapshot = Some(SnapshotInfo {
            snapshot_id: snapshot.snapshot_id,
            status: snapshot.status,
            refreshed_at: snapshot.refreshed_at,
        });
        self.state.schemas = snapshot.schemas;
        self.state.relationships = snapshot.relationships;
        Ok(())
    }

    /// Copies the entry's SQL into the editor without running it.
    pub fn rerun_history(&mut self, item: &HistoryItem) {
        self.state.sql.clone_from(&item.sql_text);
    }

    pub async fn clear_history(&mut self) -> Result<(), WorkspaceError> {
        let selected = self.require_selection()?;

        match self.api.clear_history(&selected).await {
            Ok(()) => {
                self.state.history.clear();
                self.notices.success(HISTORY_CLEARED);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "clear history failed");
                self.notices.error(error.to_string());
                Err(WorkspaceError::Api(error))
            }
        }
    }

    /// Replaces the editor text with SQL generated from `prompt`.
    pub async fn generate_sql(&mut self, prompt: &str) -> Result<(), WorkspaceError> {
        let selected = self.require_selection()?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.notices.warning(EMPTY_PROMPT);
            return Err(WorkspaceError::EmptyPrompt);
        }

        self.state.generating = true;
        let request = SqlGenerationRequest {
            prompt: prompt.to_string(),
            context_tables: None,
        };
        let outcome = self.api.generate_sql(&selected, &request).await;
        self.state.generating = false;

        let response = outcome.map_err(|error| self.fail(error))?;
        self.state.sql = response.sql_text;
        Ok(())
    }

    pub fn toggle_export_format(&mut self) {
        self.state.export_format = self.state.export_format.toggled();
    }

    /// Exports the current result. The download location is only reported.
    pub async fn export_results(&mut self) -> Result<(), WorkspaceError> {
        let Some(query_id) = self.state.export_query_id().map(str::to_string) else {
            self.notices.warning(NO_RESULTS_TO_EXPORT);
            return Err(WorkspaceError::NoResult);
        };

        let request = ExportRequest {
            query_id,
            format: self.state.export_format,
        };
        match self.api.export_query(&request).await {
            Ok(response) => {
                debug!(export_id = %response.export_id, "export ready");
                self.notices
                    .success(format!("Export ready: {}", response.download_url));
                Ok(())
            }
            Err(error) => {
                warn!(%error, "export failed");
                self.notices.error(error.to_string());
                Err(WorkspaceError::Api(error))
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    fn require_selection(&mut self) -> Result<String, WorkspaceError> {
        match &self.state.selected {
            Some(selected) => Ok(selected.clone()),
            None => {
                self.notices.warning(SELECT_CONNECTION_FIRST);
                Err(WorkspaceError::NoConnection)
            }
        }
    }

    fn fail(&mut self, error: ApiError) -> WorkspaceError {
        warn!(%error, "workspace request failed");
        let message = error.to_string();
        self.notices.error(message.clone());
        self.state.error = Some(message);
        WorkspaceError::Api(error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::models::{
        ExportFormat, MetadataColumn, MetadataRelationship, MetadataSchema, MetadataSnapshot,
        MetadataTable, QueryColumn, QueryResult, SnapshotStatus,
    };
    use crate::notice::NoticeLevel;
    use crate::testing::{connection, history_item, FakeApi};

    use super::{
        QueryLimits, WorkspaceError, WorkspacePage, DEFAULT_SQL, SELECT_CONNECTION_FIRST,
    };

    fn select_one_result() -> QueryResult {
        QueryResult {
            columns: vec![QueryColumn {
                name: "?column?".to_string(),
                data_type: "int".to_string(),
            }],
            rows: vec![vec![json!(1)]],
            duration_ms: 3,
            limit_applied: 1000,
            request_id: "req-1".to_string(),
        }
    }

    fn snapshot(schema_name: &str) -> MetadataSnapshot {
        MetadataSnapshot {
            snapshot_id: format!("snap-{schema_name}"),
            status: SnapshotStatus::Ready,
            refreshed_at: "2026-01-01T00:00:00".to_string(),
            schemas: vec![MetadataSchema {
                name: schema_name.to_string(),
                tables: vec![MetadataTable {
                    name: "users".to_string(),
                    columns: vec![MetadataColumn {
                        name: "id".to_string(),
                        data_type: "bigint".to_string(),
                        is_nullable: false,
                        default_value: None,
                        comment: None,
                    }],
                    comment: None,
                }],
                views: Vec::new(),
            }],
            relationships: vec![MetadataRelationship {
                source_table: "orders".to_string(),
                source_columns: vec!["user_id".to_string()],
                target_table: "users".to_string(),
                target_columns: vec!["id".to_string()],
                name: None,
            }],
        }
    }

    async fn mounted_page() -> WorkspacePage<FakeApi> {
        let api = FakeApi::with_connections(vec![
            connection("conn-1", "Primary DB"),
            connection("conn-2", "Replica"),
        ]);
        let mut page = WorkspacePage::new(api);
        page.mount().await.expect("mount should succeed");
        page.api().clear_calls();
        page
    }

    #[tokio::test]
    async fn mount_selects_first_connection_and_loads_its_history() {
        let api = FakeApi::with_connections(vec![
            connection("conn-1", "Primary DB"),
            connection("conn-2", "Replica"),
        ]);
        api.history
            .lock()
            .expect("poisoned")
            .push(history_item("h1", "select now()", "Primary DB"));
        let mut page = WorkspacePage::new(api);

        page.mount().await.expect("mount should succeed");

        assert_eq!(page.state().selected.as_deref(), Some("conn-1"));
        assert_eq!(page.state().sql, DEFAULT_SQL);
        assert_eq!(page.state().history.len(), 1);
        assert_eq!(
            page.api().calls(),
            vec!["list_connections", "list_history:conn-1"]
        );
    }

    #[tokio::test]
    async fn mount_with_no_connections_selects_nothing() {
        let mut page = WorkspacePage::new(FakeApi::default());
        page.mount().await.expect("mount should succeed");

        assert!(page.state().selected.is_none());
        assert_eq!(page.api().calls(), vec!["list_connections"]);
    }

    #[tokio::test]
    async fn reload_keeps_existing_selection() {
        let mut page = mounted_page().await;
        page.select_connection("conn-2").await;
        page.reload_connections()
            .await
            .expect("reload should succeed");

        assert_eq!(page.state().selected.as_deref(), Some("conn-2"));
    }

    #[tokio::test]
    async fn selection_change_reloads_history_and_swallows_failures() {
        let mut page = mounted_page().await;
        page.api().fail("list_history", "history store unavailable");

        page.select_connection("conn-2").await;
        page.select_connection("conn-2").await;

        assert_eq!(page.api().calls(), vec!["list_history:conn-2"]);
        assert!(page.state().error.is_none());
        assert!(page.notices().pending().is_empty());
    }

    #[tokio::test]
    async fn execute_without_selection_warns_and_issues_no_request() {
        let mut page = WorkspacePage::new(FakeApi::default());

        let err = page
            .execute_query()
            .await
            .expect_err("execute should be rejected");

        assert!(matches!(err, WorkspaceError::NoConnection));
        assert!(page.api().calls().is_empty());
        let notice = page.notices().latest().expect("warning expected");
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.text, SELECT_CONNECTION_FIRST);
    }

    #[tokio::test]
    async fn execute_stores_result_then_appends_and_reloads_history() {
        let mut page = mounted_page().await;
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());

        page.execute_query().await.expect("execute should succeed");

        let result = page.state().result.as_ref().expect("result expected");
        assert_eq!(result.rows, vec![vec![json!(1)]]);
        assert_eq!(
            page.api().calls(),
            vec![
                "execute_query:conn-1",
                "add_history:conn-1",
                "list_history:conn-1"
            ]
        );
        let appended = page
            .api()
            .last_history_add
            .lock()
            .expect("poisoned")
            .clone()
            .expect("history append expected");
        assert_eq!(appended.connection_id, "conn-1");
        assert_eq!(appended.connection_name, "Primary DB");
        assert_eq!(appended.sql_text, "select 1");
        assert_eq!(page.state().history.len(), 1);
        assert_eq!(page.state().history[0].sql_text, "select 1");
        assert_eq!(page.state().history[0].connection_name, "Primary DB");
        assert!(!page.state().query_loading);
    }

    #[tokio::test]
    async fn execute_forwards_configured_limits() {
        let api = FakeApi::with_connections(vec![connection("conn-1", "Primary DB")]);
        *api.query_result.lock().expect("poisoned") = Some(select_one_result());
        let mut page = WorkspacePage::with_limits(
            api,
            QueryLimits {
                timeout_seconds: Some(5),
                max_rows: Some(50),
            },
        );
        page.mount().await.expect("mount should succeed");

        page.execute_query().await.expect("execute should succeed");

        let sent = page
            .api()
            .last_query
            .lock()
            .expect("poisoned")
            .clone()
            .expect("query expected");
        assert_eq!(sent.timeout_seconds, Some(5));
        assert_eq!(sent.max_rows, Some(50));
    }

    #[tokio::test]
    async fn failed_execute_keeps_previous_result_and_sets_error() {
        let mut page = mounted_page().await;
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());
        page.execute_query().await.expect("first execute should succeed");
        page.api().fail("execute_query", "relation \"nope\" does not exist");
        page.api().clear_calls();
        page.set_sql("select * from nope");

        page.execute_query()
            .await
            .expect_err("execute should fail");

        assert_eq!(page.api().calls(), vec!["execute_query:conn-1"]);
        assert_eq!(
            page.state().error.as_deref(),
            Some("relation \"nope\" does not exist")
        );
        assert_eq!(
            page.state().result.as_ref().map(|r| r.request_id.as_str()),
            Some("req-1")
        );
        assert!(!page.state().query_loading);
    }

    #[tokio::test]
    async fn execute_clears_previous_error() {
        let mut page = mounted_page().await;
        page.api().fail("execute_query", "boom");
        page.execute_query().await.expect_err("execute should fail");
        page.api().recover("execute_query");
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());

        page.execute_query().await.expect("execute should succeed");

        assert!(page.state().error.is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_schemas_after_refresh_then_read() {
        let mut page = mounted_page().await;
        *page.api().snapshot.lock().expect("poisoned") = Some(snapshot("public"));

        page.refresh_metadata()
            .await
            .expect("refresh should succeed");

        assert_eq!(
            page.api().calls(),
            vec!["refresh_metadata:conn-1", "get_metadata:conn-1"]
        );
        assert_eq!(page.state().schemas[0].name, "public");
        assert_eq!(page.state().relationships.len(), 1);
        assert_eq!(
            page.state()
                .snapshot
                .as_ref()
                .map(|info| info.snapshot_id.as_str()),
            Some("snap-public")
        );
        assert!(!page.state().metadata_loading);
    }

    #[tokio::test]
    async fn failed_read_after_refresh_keeps_prior_schemas() {
        let mut page = mounted_page().await;
        *page.api().snapshot.lock().expect("poisoned") = Some(snapshot("public"));
        page.refresh_metadata()
            .await
            .expect("first refresh should succeed");
        *page.api().snapshot.lock().expect("poisoned") = Some(snapshot("other"));
        page.api().fail("get_metadata", "metadata read failed");

        page.refresh_metadata()
            .await
            .expect_err("second refresh should fail");

        assert_eq!(page.state().schemas[0].name, "public");
        assert_eq!(page.state().relationships.len(), 1);
        assert_eq!(page.state().error.as_deref(), Some("metadata read failed"));
        assert!(!page.state().metadata_loading);
    }

    #[tokio::test]
    async fn refresh_without_selection_issues_no_request() {
        let mut page = WorkspacePage::new(FakeApi::default());
        let err = page
            .refresh_metadata()
            .await
            .expect_err("refresh should be rejected");

        assert!(matches!(err, WorkspaceError::NoConnection));
        assert!(page.api().calls().is_empty());
    }

    #[tokio::test]
    async fn rerun_copies_sql_without_executing() {
        let mut page = mounted_page().await;
        page.rerun_history(&history_item("h9", "select count(*) from users", "Primary DB"));

        assert_eq!(page.state().sql, "select count(*) from users");
        assert!(page.api().calls().is_empty());
    }

    #[tokio::test]
    async fn clear_history_empties_list_on_success() {
        let mut page = mounted_page().await;
        page.api()
            .history
            .lock()
            .expect("poisoned")
            .push(history_item("h1", "select 1", "Primary DB"));
        page.load_history().await;
        assert_eq!(page.state().history.len(), 1);

        page.clear_history().await.expect("clear should succeed");

        assert!(page.state().history.is_empty());
        assert_eq!(
            page.notices().latest().map(|notice| notice.level),
            Some(NoticeLevel::Success)
        );
    }

    #[tokio::test]
    async fn failed_clear_history_leaves_list_untouched() {
        let mut page = mounted_page().await;
        page.api()
            .history
            .lock()
            .expect("poisoned")
            .push(history_item("h1", "select 1", "Primary DB"));
        page.load_history().await;
        page.api().fail("clear_history", "history locked");

        page.clear_history().await.expect_err("clear should fail");

        assert_eq!(page.state().history.len(), 1);
        assert_eq!(
            page.notices().latest().map(|notice| notice.text.as_str()),
            Some("history locked")
        );
    }

    #[tokio::test]
    async fn generate_sql_replaces_editor_text() {
        let mut page = mounted_page().await;
        *page.api().generated_sql.lock().expect("poisoned") =
            "select * from users limit 10".to_string();

        page.generate_sql("first ten users")
            .await
            .expect("generation should succeed");

        assert_eq!(page.state().sql, "select * from users limit 10");
        assert!(!page.state().generating);
    }

    #[tokio::test]
    async fn generate_sql_with_blank_prompt_issues_no_request() {
        let mut page = mounted_page().await;
        let err = page
            .generate_sql("   ")
            .await
            .expect_err("blank prompt should be rejected");

        assert!(matches!(err, WorkspaceError::EmptyPrompt));
        assert!(page.api().calls().is_empty());
        assert_eq!(page.state().sql, DEFAULT_SQL);
    }

    #[tokio::test]
    async fn export_requires_a_result() {
        let mut page = mounted_page().await;
        let err = page
            .export_results()
            .await
            .expect_err("export should be rejected");

        assert!(matches!(err, WorkspaceError::NoResult));
        assert!(page.api().calls().is_empty());
    }

    #[tokio::test]
    async fn export_uses_request_id_and_selected_format() {
        let mut page = mounted_page().await;
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());
        page.execute_query().await.expect("execute should succeed");
        page.toggle_export_format();

        page.export_results().await.expect("export should succeed");

        let sent = page
            .api()
            .last_export
            .lock()
            .expect("poisoned")
            .clone()
            .expect("export request expected");
        assert_eq!(sent.query_id, "req-1");
        assert_eq!(sent.format, ExportFormat::Json);
        let notice = page.notices().latest().expect("notice expected");
        assert!(notice.text.contains("/api/v1/exports/exp-1/download"));
    }

    #[tokio::test]
    async fn export_failure_surfaces_message_verbatim() {
        let mut page = mounted_page().await;
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());
        page.execute_query().await.expect("execute should succeed");
        page.api().fail("export_query", "Query result expired");

        page.export_results().await.expect_err("export should fail");

        assert_eq!(
            page.notices().latest().map(|notice| notice.text.as_str()),
            Some("Query result expired")
        );
    }

    #[tokio::test]
    async fn dismiss_error_clears_banner() {
        let mut page = mounted_page().await;
        page.api().fail("execute_query", "boom");
        page.execute_query().await.expect_err("execute should fail");
        assert!(page.state().error.is_some());

        page.dismiss_error();
        assert!(page.state().error.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_request_skips_read_and_keeps_schemas() {
        let mut page = mounted_page().await;
        *page.api().snapshot.lock().expect("poisoned") = Some(snapshot("public"));
        page.refresh_metadata()
            .await
            .expect("first refresh should succeed");
        *page.api().snapshot.lock().expect("poisoned") = Some(snapshot("other"));
        page.api().fail("refresh_metadata", "metadata refresh already running");
        page.api().clear_calls();

        page.refresh_metadata()
            .await
            .expect_err("refresh should fail");

        assert_eq!(page.api().calls(), vec!["refresh_metadata:conn-1"]);
        assert_eq!(page.state().schemas[0].name, "public");
        assert_eq!(
            page.state().error.as_deref(),
            Some("metadata refresh already running")
        );
        assert!(!page.state().metadata_loading);
    }

    #[tokio::test]
    async fn failed_history_append_keeps_result_and_sets_error() {
        let mut page = mounted_page().await;
        *page.api().query_result.lock().expect("poisoned") = Some(select_one_result());
        page.api().fail("add_history", "history store unavailable");

        page.execute_query()
            .await
            .expect_err("history append should fail");

        assert_eq!(
            page.api().calls(),
            vec!["execute_query:conn-1", "add_history:conn-1"]
        );
        assert_eq!(
            page.state().result.as_ref().map(|r| r.request_id.as_str()),
            Some("req-1")
        );
        assert_eq!(
            page.state().error.as_deref(),
            Some("history store unavailable")
        );
        assert!(!page.state().query_loading);
    }

    #[tokio::test]
    async fn clear_history_without_selection_warns_and_issues_no_request() {
        let mut page = WorkspacePage::new(FakeApi::default());

        let err = page
            .clear_history()
            .await
            .expect_err("clear should be rejected");

        assert!(matches!(err, WorkspaceError::NoConnection));
        assert!(page.api().calls().is_empty());
        let notice = page.notices().latest().expect("warning expected");
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.text, SELECT_CONNECTION_FIRST);
    }
}
