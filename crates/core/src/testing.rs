//! In-memory `DbQueryApi` for controller and UI tests.
//!
//! Clones share state, so a test can keep a handle while the page owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{ApiError, DbQueryApi};
use crate::models::{
    Connection, ConnectionCreate, ConnectionList, ConnectionTestResult, ConnectionTestStatus,
    ConnectionUpdate, DbType, ExportRequest, ExportResponse, HistoryCreate, HistoryItem,
    HistoryList, MetadataRefresh, MetadataSnapshot, QueryRequest, QueryResult,
    SnapshotStatus, SqlGenerationRequest, SqlGenerationResponse, TestStatus,
};

#[derive(Debug, Default, Clone)]
pub struct FakeApi {
    calls: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<HashMap<&'static str, String>>>,
    pub connections: Arc<Mutex<Vec<Connection>>>,
    pub history: Arc<Mutex<Vec<HistoryItem>>>,
    pub snapshot: Arc<Mutex<Option<MetadataSnapshot>>>,
    pub query_result: Arc<Mutex<Option<QueryResult>>>,
    pub test_status: Arc<Mutex<Option<ConnectionTestStatus>>>,
    pub generated_sql: Arc<Mutex<String>>,
    pub last_query: Arc<Mutex<Option<QueryRequest>>>,
    pub last_update: Arc<Mutex<Option<ConnectionUpdate>>>,
    pub last_export: Arc<Mutex<Option<ExportRequest>>>,
    pub last_history_add: Arc<Mutex<Option<HistoryCreate>>>,
}

impl FakeApi {
    pub fn with_connections(connections: Vec<Connection>) -> Self {
        let api = Self::default();
        *api.connections.lock().expect("poisoned") = connections;
        api
    }

    /// Makes every later call to `op` fail with `message`.
    pub fn fail(&self, op: &'static str, message: &str) {
        self.failures
            .lock()
            .expect("poisoned")
            .insert(op, message.to_string());
    }

    pub fn recover(&self, op: &'static str) {
        self.failures.lock().expect("poisoned").remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("poisoned").clear();
    }

    fn record(&self, op: &'static str, target: &str) -> Result<(), ApiError> {
        let entry = if target.is_empty() {
            op.to_string()
        } else {
            format!("{op}:{target}")
        };
        self.calls.lock().expect("poisoned").push(entry);
        match self.failures.lock().expect("poisoned").get(op) {
            Some(message) => Err(ApiError::status(500, message.clone())),
            None => Ok(()),
        }
    }
}

pub fn connection(id: &str, name: &str) -> Connection {
    Connection {
        id: id.to_string(),
        name: name.to_string(),
        db_type: DbType::Postgres,
        created_at: "2026-01-01T00:00:00".to_string(),
        last_used_at: None,
        last_test_status: TestStatus::Unknown,
    }
}

pub fn history_item(id: &str, sql: &str, connection_name: &str) -> HistoryItem {
    HistoryItem {
        id: id.to_string(),
        sql_text: sql.to_string(),
        executed_at: "2026-01-01T00:00:00".to_string(),
        connection_name: connection_name.to_string(),
    }
}

#[async_trait]
impl DbQueryApi for FakeApi {
    async fn list_connections(&self) -> Result<ConnectionList, ApiError> {
        self.record("list_connections", "")?;
        let items = self.connections.lock().expect("poisoned").clone();
        Ok(ConnectionList {
            total: items.len() as u64,
            page: 1,
            page_size: 20,
            items,
        })
    }

    async fn create_connection(&self, payload: &ConnectionCreate) -> Result<Connection, ApiError> {
        self.record("create_connection", &payload.name)?;
        let mut connections = self.connections.lock().expect("poisoned");
        let mut created = connection(
            &format!("conn-{}", connections.len() + 1),
            &payload.name,
        );
        created.db_type = payload.db_type;
        connections.push(created.clone());
        Ok(created)
    }

    async fn update_connection(
        &self,
        connection_id: &str,
        payload: &ConnectionUpdate,
    ) -> Result<Connection, ApiError> {
        self.record("update_connection", connection_id)?;
        *self.last_update.lock().expect("poisoned") = Some(payload.clone());
        let mut connections = self.connections.lock().expect("poisoned");
        let existing = connections
            .iter_mut()
            .find(|item| item.id == connection_id)
            .ok_or_else(|| ApiError::status(404, "Connection not found"))?;
        if let Some(name) = &payload.name {
            existing.name.clone_from(name);
        }
        if let Some(db_type) = payload.db_type {
            existing.db_type = db_type;
        }
        Ok(existing.clone())
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<(), ApiError> {
        self.record("delete_connection", connection_id)?;
        self.connections
            .lock()
            .expect("poisoned")
            .retain(|item| item.id != connection_id);
        Ok(())
    }

    async fn test_connection(
        &self,
        connection_id: &str,
    ) -> Result<ConnectionTestResult, ApiError> {
        self.record("test_connection", connection_id)?;
        let status = self
            .test_status
            .lock()
            .expect("poisoned")
            .unwrap_or(ConnectionTestStatus::Success);
        Ok(ConnectionTestResult {
            status,
            message: None,
        })
    }

    async fn get_metadata(&self, connection_id: &str) -> Result<MetadataSnapshot, ApiError> {
        self.record("get_metadata", connection_id)?;
        self.snapshot
            .lock()
            .expect("poisoned")
            .clone()
            .ok_or_else(|| ApiError::status(404, "Metadata not found"))
    }

    async fn refresh_metadata(&self, connection_id: &str) -> Result<MetadataRefresh, ApiError> {
        self.record("refresh_metadata", connection_id)?;
        Ok(MetadataRefresh {
            status: SnapshotStatus::Refreshing,
            message: None,
        })
    }

    async fn execute_query(
        &self,
        connection_id: &str,
        payload: &QueryRequest,
    ) -> Result<QueryResult, ApiError> {
        self.record("execute_query", connection_id)?;
        *self.last_query.lock().expect("poisoned") = Some(payload.clone());
        self.query_result
            .lock()
            .expect("poisoned")
            .clone()
            .ok_or_else(|| ApiError::status(400, "Query returned nothing"))
    }

    async fn generate_sql(
        &self,
        connection_id: &str,
        _payload: &SqlGenerationRequest,
    ) -> Result<SqlGenerationResponse, ApiError> {
        self.record("generate_sql", connection_id)?;
        Ok(SqlGenerationResponse {
            sql_text: self.generated_sql.lock().expect("poisoned").clone(),
        })
    }

    async fn export_query(&self, payload: &ExportRequest) -> Result<ExportResponse, ApiError> {
        self.record("export_query", &payload.query_id)?;
        *self.last_export.lock().expect("poisoned") = Some(payload.clone());
        Ok(ExportResponse {
            export_id: "exp-1".to_string(),
            download_url: "/api/v1/exports/exp-1/download".to_string(),
        })
    }

    async fn list_history(&self, connection_id: &str) -> Result<HistoryList, ApiError> {
        self.record("list_history", connection_id)?;
        Ok(HistoryList {
            items: self.history.lock().expect("poisoned").clone(),
        })
    }

    async fn add_history(
        &self,
        connection_id: &str,
        payload: &HistoryCreate,
    ) -> Result<(), ApiError> {
        self.record("add_history", connection_id)?;
        *self.last_history_add.lock().expect("poisoned") = Some(payload.clone());
        let mut history = self.history.lock().expect("poisoned");
        let id = format!("h{}", history.len() + 1);
        history.insert(
            0,
            history_item(&id, &payload.sql_text, &payload.connection_name),
        );
        Ok(())
    }

    async fn clear_history(&self, connection_id: &str) -> Result<(), ApiError> {
        self.record("clear_history", connection_id)?;
        self.history.lock().expect("poisoned").clear();
        Ok(())
    }
}
